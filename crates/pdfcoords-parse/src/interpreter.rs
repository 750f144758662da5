//! Content stream interpreter.
//!
//! Walks the tokenized operators of a page, keeps the graphics and text
//! state, and reports every shown glyph to a [`ContentHandler`]. Form
//! XObjects are entered through `Do`, bounded by the recursion depth and the
//! per-page operator budget of [`ExtractOptions`].

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfcoords_core::{Ctm, ExtractOptions, ExtractWarning, ExtractWarningCode, PdfError};

use crate::error::BackendError;
use crate::font::Font;
use crate::graphics_state::GraphicsState;
use crate::handler::{ContentHandler, GlyphEvent};
use crate::objects::{
    get_array, get_dict, number, page_content, page_resources, resolve, stream_bytes,
};
use crate::text_state::{TextRenderMode, TextState};
use crate::tokenizer::{Operand, Operator, tokenize};

/// Interpret the content stream of one page.
pub fn interpret_page(
    doc: &Document,
    page_id: ObjectId,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
) -> Result<(), BackendError> {
    let content = page_content(doc, page_id)?;
    let resources = page_resources(doc, page_id)?;
    let mut interpreter = Interpreter {
        doc,
        handler,
        options,
        operators_seen: 0,
    };
    let mut gstate = GraphicsState::new();
    let mut tstate = TextState::new();
    interpreter.run(&content, resources, 0, &mut gstate, &mut tstate)
}

struct Interpreter<'a, 'h> {
    doc: &'a Document,
    handler: &'h mut dyn ContentHandler,
    options: &'a ExtractOptions,
    /// Operators interpreted so far on this page, nested forms included.
    operators_seen: usize,
}

/// Fonts of one resource dictionary, loaded on first use.
#[derive(Default)]
struct FontCache {
    fonts: HashMap<String, Rc<Font>>,
}

impl<'a> Interpreter<'a, '_> {
    fn run(
        &mut self,
        content: &[u8],
        resources: &'a Dictionary,
        depth: usize,
        gstate: &mut GraphicsState,
        tstate: &mut TextState,
    ) -> Result<(), BackendError> {
        if depth > self.options.max_recursion_depth {
            return Err(BackendError::Interpreter(format!(
                "Form XObject recursion depth {} exceeds limit {}",
                depth, self.options.max_recursion_depth
            )));
        }

        let operators = tokenize(content)?;
        let mut fonts = FontCache::default();

        for (op_index, op) in operators.iter().enumerate() {
            self.operators_seen += 1;
            if self.operators_seen > self.options.max_operators_per_page {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    limit = self.options.max_operators_per_page,
                    depth,
                    "operator budget exhausted"
                );
                return Err(PdfError::ResourceLimitExceeded {
                    limit_name: "max_operators_per_page".to_string(),
                    limit_value: self.options.max_operators_per_page,
                    actual_value: self.operators_seen,
                }
                .into());
            }

            match op.name.as_str() {
                "q" => gstate.save(&tstate.params),
                "Q" => {
                    if let Some(params) = gstate.restore() {
                        tstate.params = params;
                    }
                }
                "cm" => {
                    if let Some(m) = op.matrix() {
                        gstate.concat(&Ctm::from_array(m));
                    }
                }

                "BT" => tstate.begin(),
                "ET" => tstate.end(),
                "Tf" => {
                    let name = op.operands.first().and_then(Operand::as_name);
                    if let (Some(name), Some(size)) = (name, op.number(1)) {
                        tstate.params.font = Some(name.to_string());
                        tstate.params.font_size = size;
                        self.font(&mut fonts, resources, name, op_index);
                    }
                }
                "Tm" => {
                    if let Some(m) = op.matrix() {
                        tstate.set_matrix(m);
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                        tstate.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                        tstate.move_line_set_leading(tx, ty);
                    }
                }
                "T*" => tstate.next_line(),
                "Tc" => {
                    if let Some(v) = op.number(0) {
                        tstate.params.char_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some(v) = op.number(0) {
                        tstate.params.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some(v) = op.number(0) {
                        tstate.params.h_scaling = v;
                    }
                }
                "TL" => {
                    if let Some(v) = op.number(0) {
                        tstate.params.leading = v;
                    }
                }
                "Ts" => {
                    if let Some(v) = op.number(0) {
                        tstate.params.rise = v;
                    }
                }
                "Tr" => {
                    let mode = op.number(0).and_then(|v| TextRenderMode::from_i64(v as i64));
                    if let Some(mode) = mode {
                        tstate.params.render_mode = mode;
                    }
                }

                "Tj" => {
                    if let Some(bytes) = last_string(op) {
                        self.show(&mut fonts, resources, op_index, gstate, tstate, bytes);
                    }
                }
                "'" => {
                    tstate.next_line();
                    if let Some(bytes) = last_string(op) {
                        self.show(&mut fonts, resources, op_index, gstate, tstate, bytes);
                    }
                }
                "\"" => {
                    if let (Some(aw), Some(ac)) = (op.number(0), op.number(1)) {
                        tstate.params.word_spacing = aw;
                        tstate.params.char_spacing = ac;
                    }
                    tstate.next_line();
                    if let Some(bytes) = last_string(op) {
                        self.show(&mut fonts, resources, op_index, gstate, tstate, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Operand::Array(items)) = op.operands.first() {
                        for item in items {
                            match item {
                                Operand::String(bytes) => {
                                    self.show(&mut fonts, resources, op_index, gstate, tstate, bytes)
                                }
                                Operand::Number(n) => {
                                    let shift = tstate.tj_adjustment(*n);
                                    tstate.advance(shift);
                                }
                                _ => {}
                            }
                        }
                    }
                }

                "Do" => {
                    if let Some(name) = op.operands.first().and_then(Operand::as_name) {
                        self.do_xobject(resources, name, depth, gstate, tstate)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Font for a resource name; a missing one warns once and falls back to defaults.
    fn font(
        &mut self,
        cache: &mut FontCache,
        resources: &Dictionary,
        name: &str,
        op_index: usize,
    ) -> Rc<Font> {
        if let Some(font) = cache.fonts.get(name) {
            return Rc::clone(font);
        }
        let doc = self.doc;
        let dict = get_dict(doc, resources, b"Font")
            .and_then(|fonts| get_dict(doc, fonts, name.as_bytes()));
        let font = match dict {
            Some(dict) => Font::load(doc, dict, name),
            None => {
                self.warn(
                    ExtractWarning::with_code(
                        ExtractWarningCode::MissingFont,
                        "font not found in page resources",
                    )
                    .at_operator(op_index, name),
                );
                Font::fallback(name)
            }
        };
        let font = Rc::new(font);
        cache.fonts.insert(name.to_string(), Rc::clone(&font));
        font
    }

    fn warn(&mut self, warning: ExtractWarning) {
        if self.options.collect_warnings {
            self.handler.on_warning(warning);
        }
    }

    fn show(
        &mut self,
        fonts: &mut FontCache,
        resources: &Dictionary,
        op_index: usize,
        gstate: &GraphicsState,
        tstate: &mut TextState,
        bytes: &[u8],
    ) {
        let Some(font_name) = tstate.params.font.clone() else {
            return;
        };
        let font = self.font(fonts, resources, &font_name, op_index);
        for code in font.codes(bytes) {
            let width = font.width(code.code);
            let unicode = font
                .unicode(code.code)
                .map(|text| self.options.unicode_norm.apply(text));
            self.handler.on_glyph(GlyphEvent {
                trm: tstate.rendering_matrix(gstate.ctm()),
                char_code: code.code,
                unicode,
                font: font.info().clone(),
                font_size: tstate.params.font_size,
                advance: width,
                h_scaling: tstate.params.h_scale(),
            });
            let tx = tstate.glyph_advance(width, code.is_word_space());
            tstate.advance(tx);
        }
    }

    fn do_xobject(
        &mut self,
        resources: &'a Dictionary,
        name: &str,
        depth: usize,
        gstate: &mut GraphicsState,
        tstate: &mut TextState,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some(stream) = get_dict(doc, resources, b"XObject")
            .and_then(|xobjects| xobjects.get(name.as_bytes()).ok())
            .and_then(|obj| resolve(doc, obj).as_stream().ok())
        else {
            self.warn(ExtractWarning::with_code(
                ExtractWarningCode::MalformedObject,
                format!("XObject /{name} not found in resources"),
            ));
            return Ok(());
        };
        if stream.dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Form".as_slice()) {
            return Ok(());
        }
        self.run_form(stream, resources, depth, gstate, tstate)
    }

    fn run_form(
        &mut self,
        stream: &'a Stream,
        parent_resources: &'a Dictionary,
        depth: usize,
        gstate: &mut GraphicsState,
        tstate: &mut TextState,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let content = stream_bytes(stream)?;
        let resources = get_dict(doc, &stream.dict, b"Resources").unwrap_or(parent_resources);

        gstate.save(&tstate.params);
        let matrix = get_array(doc, &stream.dict, b"Matrix").and_then(|items| matrix_of(doc, items));
        if let Some(m) = matrix {
            gstate.concat(&Ctm::from_array(m));
        }
        let result = self.run(&content, resources, depth + 1, gstate, tstate);
        if let Some(params) = gstate.restore() {
            tstate.params = params;
        }
        result
    }
}

/// The string operand of `Tj`, `'` and `"` is the last one.
fn last_string(op: &Operator) -> Option<&[u8]> {
    op.operands.last().and_then(Operand::as_bytes)
}

fn matrix_of(doc: &Document, items: &[Object]) -> Option<[f64; 6]> {
    if items.len() != 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, item) in m.iter_mut().zip(items) {
        *slot = number(resolve(doc, item))?;
    }
    Some(m)
}
