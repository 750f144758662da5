//! Resolution of outline items to ordered table-of-contents entries.
//!
//! Generic over the page reference type `P` so the resolver does not depend
//! on a PDF backend; the parse layer instantiates it with object ids.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::document::TocEntry;

/// Where a destination points on its page.
#[derive(Debug, Clone, PartialEq)]
pub enum DestinationView {
    /// `/XYZ left top zoom`; `None` coordinates keep the current value.
    Xyz {
        left: Option<f64>,
        top: Option<f64>,
    },
    /// `/Fit`, `/FitH` and the other views without a point.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Destination<P> {
    pub page: P,
    pub view: DestinationView,
}

/// What an outline item jumps to.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineTarget<P> {
    Named(String),
    Explicit(Destination<P>),
    /// URI, Launch, remote GoTo and other actions that do not target a page.
    Unsupported,
}

/// One flattened outline node.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem<P> {
    pub title: String,
    /// 1 for top-level items.
    pub level: usize,
    pub target: OutlineTarget<P>,
}

/// Named destinations keyed by name; the first definition of a name wins.
#[derive(Debug, Clone)]
pub struct NamedDestinations<P> {
    map: HashMap<String, Destination<P>>,
}

impl<P> Default for NamedDestinations<P> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<P> NamedDestinations<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the name is already present. Returns `false` for a duplicate.
    pub fn insert(&mut self, name: impl Into<String>, dest: Destination<P>) -> bool {
        match self.map.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(dest);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Destination<P>> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Resolve outline items against the ordered page list.
///
/// Items whose destination is missing or points outside `pages` are dropped.
/// The result is stable-sorted by page, so equal pages keep outline order.
pub fn resolve_table_of_contents<P: PartialEq>(
    items: &[OutlineItem<P>],
    named: &NamedDestinations<P>,
    pages: &[P],
) -> Vec<TocEntry> {
    let mut entries: Vec<TocEntry> = items
        .iter()
        .filter_map(|item| {
            let dest = match &item.target {
                OutlineTarget::Named(name) => named.get(name)?,
                OutlineTarget::Explicit(dest) => dest,
                OutlineTarget::Unsupported => return None,
            };
            let page = pages.iter().position(|p| *p == dest.page)?;
            let (left, top) = match dest.view {
                DestinationView::Xyz { left, top } => (left.unwrap_or(0.0), top.unwrap_or(0.0)),
                DestinationView::Other => (0.0, 0.0),
            };
            Some(TocEntry {
                title: item.title.clone(),
                level: item.level,
                left,
                top,
                page,
            })
        })
        .collect();
    entries.sort_by_key(|e| e.page);
    entries
}
