//! Text state for the content stream interpreter.
//!
//! [`TextParams`] holds the parameters that belong to the graphics state and
//! are saved by `q`/`Q` (spacing, scaling, leading, font, rise, render mode).
//! [`TextState`] adds the text and line matrices that live only inside a
//! `BT`/`ET` object.

use pdfcoords_core::Ctm;

/// Text rendering mode set by `Tr`.
///
/// Invisible text (mode 3) is still extracted: OCR layers over scanned pages
/// are usually drawn that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderMode {
    pub fn from_i64(value: i64) -> Option<Self> {
        Some(match value {
            0 => Self::Fill,
            1 => Self::Stroke,
            2 => Self::FillStroke,
            3 => Self::Invisible,
            4 => Self::FillClip,
            5 => Self::StrokeClip,
            6 => Self::FillStrokeClip,
            7 => Self::Clip,
            _ => return None,
        })
    }
}

/// Text parameters saved and restored with the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    /// `Tc`, in unscaled text space units.
    pub char_spacing: f64,
    /// `Tw`, applied to single-byte code 32 only.
    pub word_spacing: f64,
    /// `Tz`, in percent.
    pub h_scaling: f64,
    /// `TL`.
    pub leading: f64,
    /// Resource name of the font selected by `Tf`.
    pub font: Option<String>,
    pub font_size: f64,
    /// `Ts`.
    pub rise: f64,
    pub render_mode: TextRenderMode,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rise: 0.0,
            render_mode: TextRenderMode::Fill,
        }
    }
}

impl TextParams {
    /// Horizontal scaling as a factor, 1.0 for 100%.
    pub fn h_scale(&self) -> f64 {
        self.h_scaling / 100.0
    }
}

/// Text matrices plus the current parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextState {
    pub params: TextParams,
    matrix: Ctm,
    line_matrix: Ctm,
    in_text_object: bool,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text_object
    }

    pub fn matrix(&self) -> &Ctm {
        &self.matrix
    }

    pub fn line_matrix(&self) -> &Ctm {
        &self.line_matrix
    }

    /// `BT`
    pub fn begin(&mut self) {
        self.matrix = Ctm::identity();
        self.line_matrix = Ctm::identity();
        self.in_text_object = true;
    }

    /// `ET`
    pub fn end(&mut self) {
        self.in_text_object = false;
    }

    /// `Tm`: replaces both matrices.
    pub fn set_matrix(&mut self, m: [f64; 6]) {
        self.matrix = Ctm::from_array(m);
        self.line_matrix = self.matrix;
    }

    /// `Td`: offset from the start of the current line.
    pub fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translation(tx, ty).concat(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    /// `TD`: like `Td`, also sets the leading to `-ty`.
    pub fn move_line_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_line(tx, ty);
    }

    /// `T*`
    pub fn next_line(&mut self) {
        let leading = self.params.leading;
        self.move_line(0.0, -leading);
    }

    /// Move the text matrix along the baseline after a glyph or a `TJ` offset.
    pub fn advance(&mut self, tx: f64) {
        self.matrix = Ctm::translation(tx, 0.0).concat(&self.matrix);
    }

    /// Text rendering matrix for the next glyph:
    /// `[fs·Th 0 0 fs 0 rise] × Tm × CTM`.
    pub fn rendering_matrix(&self, ctm: &Ctm) -> Ctm {
        let p = &self.params;
        Ctm::new(p.font_size * p.h_scale(), 0.0, 0.0, p.font_size, 0.0, p.rise)
            .concat(&self.matrix)
            .concat(ctm)
    }

    /// Text-space advance of a glyph with the given glyph-space width (already /1000).
    pub fn glyph_advance(&self, width: f64, is_single_byte_space: bool) -> f64 {
        let p = &self.params;
        let word = if is_single_byte_space {
            p.word_spacing
        } else {
            0.0
        };
        (width * p.font_size + p.char_spacing + word) * p.h_scale()
    }

    /// Text-space shift for a `TJ` number, in thousandths of text space.
    pub fn tj_adjustment(&self, amount: f64) -> f64 {
        -amount / 1000.0 * self.params.font_size * self.params.h_scale()
    }
}
