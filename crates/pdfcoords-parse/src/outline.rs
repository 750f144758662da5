//! Outline (bookmark) and named destination readers.
//!
//! Produces the backend-neutral [`OutlineItem`] and [`NamedDestinations`]
//! values that `pdfcoords_core::resolve_table_of_contents` consumes, with
//! lopdf object ids as page references.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfcoords_core::{
    Destination, DestinationView, ExtractWarning, ExtractWarningCode, NamedDestinations,
    OutlineItem, OutlineTarget,
};

use crate::objects::{get, get_dict, number, resolve, text_string};

/// Outline nesting deeper than this is not followed.
const MAX_OUTLINE_DEPTH: usize = 64;

/// Siblings read per outline level.
const MAX_SIBLINGS: usize = 10_000;

/// Name trees nested deeper than this are not followed.
const MAX_NAME_TREE_DEPTH: usize = 32;

fn catalog(doc: &Document) -> Option<&Dictionary> {
    resolve(doc, doc.trailer.get(b"Root").ok()?).as_dict().ok()
}

/// Flatten the outline depth-first. Top-level items have level 1.
pub fn read_outline(doc: &Document) -> Vec<OutlineItem<ObjectId>> {
    let mut items = Vec::new();
    let first = catalog(doc)
        .and_then(|c| get_dict(doc, c, b"Outlines"))
        .and_then(|outlines| outlines.get(b"First").ok())
        .and_then(|obj| obj.as_reference().ok());
    if let Some(first) = first {
        let mut visited = HashSet::new();
        walk_outline(doc, first, 1, &mut visited, &mut items);
    }
    items
}

fn walk_outline(
    doc: &Document,
    first: ObjectId,
    level: usize,
    visited: &mut HashSet<ObjectId>,
    items: &mut Vec<OutlineItem<ObjectId>>,
) {
    if level > MAX_OUTLINE_DEPTH {
        return;
    }
    let mut current = Some(first);
    let mut siblings = 0;
    while let Some(node_id) = current {
        if !visited.insert(node_id) || siblings >= MAX_SIBLINGS {
            break;
        }
        siblings += 1;
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        let title = get(doc, node, b"Title")
            .and_then(|obj| obj.as_str().ok())
            .map(text_string)
            .unwrap_or_default();
        items.push(OutlineItem {
            title,
            level,
            target: outline_target(doc, node),
        });

        if let Ok(child) = node.get(b"First").and_then(Object::as_reference) {
            walk_outline(doc, child, level + 1, visited, items);
        }
        current = node.get(b"Next").and_then(Object::as_reference).ok();
    }
}

/// `/Dest`, else a `GoTo` action's `/D`. Any other action is unsupported.
fn outline_target(doc: &Document, node: &Dictionary) -> OutlineTarget<ObjectId> {
    if let Some(dest) = get(doc, node, b"Dest") {
        return destination_target(doc, dest);
    }
    let Some(action) = get_dict(doc, node, b"A") else {
        return OutlineTarget::Unsupported;
    };
    let is_goto = get(doc, action, b"S").and_then(|s| s.as_name().ok()) == Some(b"GoTo".as_slice());
    match get(doc, action, b"D") {
        Some(dest) if is_goto => destination_target(doc, dest),
        _ => OutlineTarget::Unsupported,
    }
}

fn destination_target(doc: &Document, dest: &Object) -> OutlineTarget<ObjectId> {
    match resolve(doc, dest) {
        Object::Array(items) => explicit_destination(doc, items)
            .map_or(OutlineTarget::Unsupported, OutlineTarget::Explicit),
        Object::String(bytes, _) => OutlineTarget::Named(text_string(bytes)),
        Object::Name(name) => OutlineTarget::Named(String::from_utf8_lossy(name).into_owned()),
        _ => OutlineTarget::Unsupported,
    }
}

/// `[page /XYZ left top zoom]` and the other view arrays.
fn explicit_destination(doc: &Document, items: &[Object]) -> Option<Destination<ObjectId>> {
    let page = items.first()?.as_reference().ok()?;
    let kind = items.get(1).and_then(|o| o.as_name().ok());
    let view = if kind == Some(b"XYZ".as_slice()) {
        // Null coordinates mean "unchanged".
        let coord = |i: usize| items.get(i).and_then(|o| number(resolve(doc, o)));
        DestinationView::Xyz {
            left: coord(2),
            top: coord(3),
        }
    } else {
        DestinationView::Other
    };
    Some(Destination { page, view })
}

/// Dictionary form `<< /D [...] >>` or a bare destination array.
fn destination_value(doc: &Document, value: &Object) -> Option<Destination<ObjectId>> {
    match resolve(doc, value) {
        Object::Array(items) => explicit_destination(doc, items),
        Object::Dictionary(dict) => match get(doc, dict, b"D")? {
            Object::Array(items) => explicit_destination(doc, items),
            _ => None,
        },
        _ => None,
    }
}

/// Named destinations from the `/Names /Dests` tree, then the catalog `/Dests`.
///
/// The first definition of a name wins; each later duplicate produces a
/// `DuplicateDestination` warning.
pub fn read_named_destinations(
    doc: &Document,
) -> (NamedDestinations<ObjectId>, Vec<ExtractWarning>) {
    let mut named = NamedDestinations::new();
    let mut warnings = Vec::new();
    let Some(catalog) = catalog(doc) else {
        return (named, warnings);
    };

    let mut add = |name: String, dest: Destination<ObjectId>| {
        if !named.insert(name.clone(), dest) {
            #[cfg(feature = "tracing")]
            tracing::warn!(name = %name, "duplicate named destination, keeping the first");
            warnings.push(ExtractWarning::with_code(
                ExtractWarningCode::DuplicateDestination,
                format!("duplicate named destination {name:?}"),
            ));
        }
    };

    if let Some(tree) = get_dict(doc, catalog, b"Names").and_then(|n| get_dict(doc, n, b"Dests")) {
        let mut visited = HashSet::new();
        walk_name_tree(doc, tree, 0, &mut visited, &mut add);
    }
    if let Some(dests) = get_dict(doc, catalog, b"Dests") {
        for (key, value) in dests.iter() {
            if let Some(dest) = destination_value(doc, value) {
                add(String::from_utf8_lossy(key).into_owned(), dest);
            }
        }
    }
    (named, warnings)
}

fn walk_name_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    add: &mut dyn FnMut(String, Destination<ObjectId>),
) {
    if depth > MAX_NAME_TREE_DEPTH {
        return;
    }
    if let Some(Object::Array(pairs)) = get(doc, node, b"Names") {
        for pair in pairs.chunks_exact(2) {
            let key = resolve(doc, &pair[0]).as_str().ok().map(text_string);
            if let (Some(key), Some(dest)) = (key, destination_value(doc, &pair[1])) {
                add(key, dest);
            }
        }
    }
    if let Some(Object::Array(kids)) = get(doc, node, b"Kids") {
        for kid in kids {
            if let Ok(id) = kid.as_reference() {
                if !visited.insert(id) {
                    continue;
                }
            }
            if let Ok(child) = resolve(doc, kid).as_dict() {
                walk_name_tree(doc, child, depth + 1, visited, add);
            }
        }
    }
}
