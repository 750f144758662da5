//! Document-level output records.

use std::ops::Range;

use crate::error::PdfError;
use crate::geometry::{BBox, PdfRect};
use crate::layout::{PageText, round2};

/// Box of one emitted char, top-left origin, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "[f64; 4]", into = "[f64; 4]")
)]
pub struct CharBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CharBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_bbox(bbox: &BBox) -> Self {
        Self::new(
            round2(bbox.x0),
            round2(bbox.top),
            round2(bbox.width()),
            round2(bbox.height()),
        )
    }
}

impl From<[f64; 4]> for CharBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<CharBox> for [f64; 4] {
    fn from(b: CharBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One processed page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRecord {
    /// 0-based position in the document's page list.
    pub page_index: usize,
    /// `[x, y, width, height]` of the media box.
    pub bbox: [f64; 4],
    /// Char offsets into [`Document::text`].
    pub text_range: Range<usize>,
    /// Measured text angle in degrees: the right-angle rotation plus the
    /// residual skew, normalized into (-180, 180]. 0 when the measurement
    /// was unreliable. Recorded whether or not the page was deskewed.
    pub deskew_angle: f64,
    /// `/Rotate` of the page after processing: the detected right angle when
    /// deskewing applied, the page's original value otherwise.
    pub rotation: u16,
}

/// One resolved outline entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    pub title: String,
    /// Nesting depth, 1 for top-level bookmarks.
    pub level: usize,
    pub left: f64,
    pub top: f64,
    /// 0-based page index.
    pub page: usize,
}

/// Plain text of a whole document with one box slot per char.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub text: String,
    pub char_boxes: Vec<Option<CharBox>>,
    pub pages: Vec<PageRecord>,
    pub table_of_contents: Vec<TocEntry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished page; its range starts where the previous page ended.
    pub fn push_page(
        &mut self,
        page_index: usize,
        media_box: &PdfRect,
        page: PageText,
        deskew_angle: f64,
        rotation: u16,
    ) {
        let start = self.char_boxes.len();
        let (text, boxes) = page.into_parts();
        self.text.push_str(&text);
        self.char_boxes.extend(boxes);
        self.pages.push(PageRecord {
            page_index,
            bbox: media_box.to_xywh(),
            text_range: start..self.char_boxes.len(),
            deskew_angle,
            rotation,
        });
    }

    /// Text of the page with the given index, if it was processed.
    pub fn page_text(&self, page_index: usize) -> Option<String> {
        let record = self.pages.iter().find(|p| p.page_index == page_index)?;
        let range = &record.text_range;
        Some(
            self.text
                .chars()
                .skip(range.start)
                .take(range.end - range.start)
                .collect(),
        )
    }

    /// Boxes as `[page, x, y, width, height]`; structural chars are all-zero boxes.
    pub fn char_boxes_with_pages(&self) -> Vec<[f64; 5]> {
        let mut out = Vec::with_capacity(self.char_boxes.len());
        for record in &self.pages {
            let page = record.page_index as f64;
            let slots = self
                .char_boxes
                .get(record.text_range.clone())
                .unwrap_or_default();
            out.extend(slots.iter().map(|slot| match slot {
                Some(b) => [page, b.x, b.y, b.width, b.height],
                None => [page, 0.0, 0.0, 0.0, 0.0],
            }));
        }
        out
    }

    /// Verify that text and boxes line up and page ranges partition the text.
    pub fn check_invariants(&self) -> Result<(), PdfError> {
        let char_len = self.text.chars().count();
        if char_len != self.char_boxes.len() {
            return Err(PdfError::Other(format!(
                "text has {char_len} chars but there are {} char boxes",
                self.char_boxes.len()
            )));
        }
        let mut expected_start = 0;
        for record in &self.pages {
            let range = &record.text_range;
            if range.start != expected_start || range.end < range.start {
                return Err(PdfError::Other(format!(
                    "page {} range {}..{} does not continue at {expected_start}",
                    record.page_index, range.start, range.end
                )));
            }
            expected_start = range.end;
        }
        if expected_start != char_len {
            return Err(PdfError::Other(format!(
                "page ranges end at {expected_start}, text has {char_len} chars"
            )));
        }
        Ok(())
    }
}
