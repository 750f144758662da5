//! Callback trait the interpreter drives while walking a content stream.

use pdfcoords_core::{Ctm, ExtractWarning};

use crate::font::FontInfo;

/// One shown glyph.
///
/// `trm` is the full text rendering matrix: glyph space (scaled by 1/1000)
/// maps to user space through it, so the glyph origin is `(trm.e, trm.f)`
/// and its advance runs along `(trm.a, trm.b)`.
#[derive(Debug, Clone)]
pub struct GlyphEvent {
    pub trm: Ctm,
    pub char_code: u32,
    /// Unicode text, normalized; `None` when the font has no mapping.
    pub unicode: Option<String>,
    pub font: FontInfo,
    pub font_size: f64,
    /// Glyph width in text space units per unit font size (width / 1000).
    pub advance: f64,
    /// `Tz` as a factor.
    pub h_scaling: f64,
}

/// Receives interpreter output. Both methods have no-op defaults.
pub trait ContentHandler {
    fn on_glyph(&mut self, _glyph: GlyphEvent) {}

    fn on_warning(&mut self, _warning: ExtractWarning) {}
}
