//! Assembly of positioned glyphs into plain text with parallel char boxes.
//!
//! Glyphs arrive with two boxes: a layout box in the upright frame of their
//! angle band (used for reading order and separator heuristics) and an
//! output box in the final page frame (what gets recorded). Every char of
//! the produced text gets exactly one entry in the box list; separators and
//! non-printable chars get `None`.

use crate::document::CharBox;
use crate::geometry::{BBox, Point};

/// Round half up to two decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0 + 0.5).floor() / 100.0
}

/// Glyph metrics in glyph space, thousandths of text space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Horizontal advance, already divided by 1000.
    pub advance: f64,
    pub ascent: f64,
    pub descent: f64,
    pub cap_height: f64,
}

/// Which vertical extent a glyph box covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoxPolicy {
    /// Descent to ascent, the full line box of the font.
    #[default]
    Advance,
    /// Baseline to cap height, tighter around the visible glyph.
    CapHeight,
}

impl BoxPolicy {
    pub fn from_enhanced(enhanced_glyph_boxes: bool) -> Self {
        if enhanced_glyph_boxes {
            BoxPolicy::CapHeight
        } else {
            BoxPolicy::Advance
        }
    }

    /// The four glyph-space corners of the box, counter-clockwise from the
    /// lower left.
    pub fn glyph_corners(&self, metrics: &GlyphMetrics) -> [Point; 4] {
        let (low, high) = match self {
            BoxPolicy::Advance => (metrics.descent / 1000.0, metrics.ascent / 1000.0),
            BoxPolicy::CapHeight => {
                let cap = if metrics.cap_height > 0.0 {
                    metrics.cap_height
                } else {
                    metrics.ascent
                };
                (0.0, cap / 1000.0)
            }
        };
        let w = metrics.advance;
        [
            Point::new(0.0, low),
            Point::new(w, low),
            Point::new(w, high),
            Point::new(0.0, high),
        ]
    }
}

/// What happens to zero-area and control-char glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NonPrintablePolicy {
    /// Keep the chars in the text with a `None` box.
    #[default]
    KeepSentinel,
    /// Leave them out of both text and boxes.
    Drop,
}

impl NonPrintablePolicy {
    pub fn from_remove(remove_non_printable: bool) -> Self {
        if remove_non_printable {
            NonPrintablePolicy::Drop
        } else {
            NonPrintablePolicy::KeepSentinel
        }
    }
}

/// Strings inserted at structural boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Separators {
    pub word: String,
    pub line: String,
    /// Appended after the line separator when a paragraph ends.
    pub paragraph_end: String,
    pub page_end: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            word: " ".to_string(),
            line: "\n".to_string(),
            paragraph_end: "\n".to_string(),
            page_end: "\u{c}".to_string(),
        }
    }
}

/// Knobs for [`PageText::push_run`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyOptions {
    pub sort_by_position: bool,
    /// Baseline gap, in multiples of the previous line height, that ends a paragraph.
    pub drop_threshold: f64,
    /// Horizontal gap, in multiples of the average glyph width, that separates words.
    pub word_spacing_tolerance: f64,
    pub non_printable: NonPrintablePolicy,
    pub separators: Separators,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            sort_by_position: true,
            drop_threshold: 3.5,
            word_spacing_tolerance: 0.5,
            non_printable: NonPrintablePolicy::KeepSentinel,
            separators: Separators::default(),
        }
    }
}

/// One glyph ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    pub text: String,
    /// Top-left origin box in the upright frame of the glyph's angle band.
    pub layout_box: BBox,
    /// Top-left origin box in the output frame.
    pub output_box: BBox,
}

impl PositionedGlyph {
    pub fn new(text: impl Into<String>, layout_box: BBox, output_box: BBox) -> Self {
        Self {
            text: text.into(),
            layout_box,
            output_box,
        }
    }

    pub fn is_non_printable(&self) -> bool {
        let zero_area = self.output_box.width() * self.output_box.height() == 0.0;
        zero_area || self.text.chars().all(char::is_control)
    }

    fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    fn center_y(&self) -> f64 {
        (self.layout_box.top + self.layout_box.bottom) / 2.0
    }
}

/// Text and boxes of one page under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    text: String,
    boxes: Vec<Option<CharBox>>,
}

impl PageText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn boxes(&self) -> &[Option<CharBox>] {
        &self.boxes
    }

    /// Length in chars, which always equals the number of boxes.
    pub fn char_len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<Option<CharBox>>) {
        (self.text, self.boxes)
    }

    pub fn push_separator(&mut self, sep: &str) {
        for ch in sep.chars() {
            self.text.push(ch);
            self.boxes.push(None);
        }
    }

    /// Push every char of `text` with the same box.
    pub fn push_chars(&mut self, text: &str, char_box: Option<CharBox>) {
        for ch in text.chars() {
            self.text.push(ch);
            self.boxes.push(char_box);
        }
    }

    /// Append one run of glyphs sharing an angle band.
    ///
    /// Non-empty runs after the first are set apart by a line separator.
    pub fn push_run(&mut self, glyphs: Vec<PositionedGlyph>, options: &AssemblyOptions) {
        let glyphs: Vec<PositionedGlyph> = match options.non_printable {
            NonPrintablePolicy::KeepSentinel => glyphs,
            NonPrintablePolicy::Drop => glyphs
                .into_iter()
                .filter(|g| !g.is_non_printable())
                .collect(),
        };
        let lines = if options.sort_by_position {
            lines_by_position(glyphs)
        } else {
            lines_in_stream_order(glyphs)
        };
        if lines.is_empty() {
            return;
        }
        if !self.is_empty() {
            self.push_separator(&options.separators.line);
        }

        let seps = &options.separators;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                self.push_separator(&seps.line);
                if is_paragraph_break(&lines[i - 1], line, options.drop_threshold) {
                    self.push_separator(&seps.paragraph_end);
                }
            }
            let mut prev: Option<&PositionedGlyph> = None;
            for glyph in line {
                if let Some(p) = prev {
                    if is_word_gap(p, glyph, options.word_spacing_tolerance) {
                        self.push_separator(&seps.word);
                    }
                }
                let char_box = if glyph.is_non_printable() {
                    None
                } else {
                    Some(CharBox::from_bbox(&glyph.output_box))
                };
                self.push_chars(&glyph.text, char_box);
                prev = Some(glyph);
            }
        }
    }

    pub fn finish(mut self, separators: &Separators) -> Self {
        self.push_separator(&separators.page_end);
        self
    }
}

fn is_word_gap(prev: &PositionedGlyph, next: &PositionedGlyph, tolerance: f64) -> bool {
    if prev.is_whitespace() || next.is_whitespace() {
        return false;
    }
    let gap = next.layout_box.x0 - prev.layout_box.x1;
    let avg_width = (prev.layout_box.width() + next.layout_box.width()) / 2.0;
    gap > tolerance * avg_width
}

fn is_paragraph_break(prev: &[PositionedGlyph], next: &[PositionedGlyph], drop: f64) -> bool {
    let (Some(p), Some(n)) = (prev.first(), next.first()) else {
        return false;
    };
    let max_height = prev
        .iter()
        .map(|g| g.layout_box.height())
        .fold(0.0, f64::max);
    let baseline_gap = (n.layout_box.bottom - p.layout_box.bottom).abs();
    max_height > 0.0 && baseline_gap > drop * max_height
}

/// Group into lines top to bottom, each line left to right.
fn lines_by_position(mut glyphs: Vec<PositionedGlyph>) -> Vec<Vec<PositionedGlyph>> {
    glyphs.sort_by(|a, b| a.layout_box.bottom.total_cmp(&b.layout_box.bottom));

    let mut lines: Vec<Vec<PositionedGlyph>> = Vec::new();
    let mut band: Option<(f64, f64)> = None;
    for glyph in glyphs {
        let center = glyph.center_y();
        match band {
            Some((top, bottom)) if center >= top && center <= bottom => {
                band = Some((top.min(glyph.layout_box.top), bottom.max(glyph.layout_box.bottom)));
                if let Some(line) = lines.last_mut() {
                    line.push(glyph);
                }
            }
            _ => {
                band = Some((glyph.layout_box.top, glyph.layout_box.bottom));
                lines.push(vec![glyph]);
            }
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.layout_box.x0.total_cmp(&b.layout_box.x0));
    }
    lines
}

/// Keep content-stream order, breaking lines when the flow jumps.
fn lines_in_stream_order(glyphs: Vec<PositionedGlyph>) -> Vec<Vec<PositionedGlyph>> {
    let mut lines: Vec<Vec<PositionedGlyph>> = Vec::new();
    let mut band: Option<(f64, f64)> = None;
    for glyph in glyphs {
        let center = glyph.center_y();
        let continues = match (band, lines.last().and_then(|l| l.last())) {
            (Some((top, bottom)), Some(prev)) => {
                let moved_back = glyph.layout_box.x0 < prev.layout_box.x0 - prev.layout_box.width();
                center >= top && center <= bottom && !moved_back
            }
            _ => false,
        };
        if continues {
            band = band.map(|(top, bottom)| {
                (top.min(glyph.layout_box.top), bottom.max(glyph.layout_box.bottom))
            });
            if let Some(line) = lines.last_mut() {
                line.push(glyph);
            }
        } else {
            band = Some((glyph.layout_box.top, glyph.layout_box.bottom));
            lines.push(vec![glyph]);
        }
    }
    lines
}
