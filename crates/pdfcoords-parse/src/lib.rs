//! pdfcoords-parse: PDF access and content stream interpretation over lopdf.
//!
//! Layer 1 reads pages, boxes, rotation, outlines and named destinations and
//! mutates page content ([`LopdfDocument`], [`TemporaryTransform`]). Layer 2
//! interprets content streams and reports positioned glyphs to a
//! [`ContentHandler`]. Shared data types come from `pdfcoords-core`.

pub mod cmap;
pub mod error;
pub mod font;
pub mod graphics_state;
pub mod handler;
pub mod interpreter;
pub mod lopdf_backend;
mod objects;
pub mod outline;
pub mod text_state;
pub mod tokenizer;

pub use error::BackendError;
pub use font::{Font, FontInfo};
pub use handler::{ContentHandler, GlyphEvent};
pub use interpreter::interpret_page;
pub use lopdf;
pub use lopdf_backend::{LopdfDocument, TemporaryTransform};
pub use outline::{read_named_destinations, read_outline};
pub use pdfcoords_core;
