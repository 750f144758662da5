//! pdfcoords: Extract positioned text with per-character boxes from PDF
//! documents, detecting and compensating page rotation and skew.
//!
//! This is the public API facade crate. It re-exports types from
//! pdfcoords-core and uses pdfcoords-parse for PDF reading and interpretation.
//!
//! # Architecture
//!
//! - **pdfcoords-core**: Geometry, angle statistics, text assembly and output records
//! - **pdfcoords-parse**: PDF access (Layer 1) and content stream interpreter (Layer 2)
//! - **pdfcoords** (this crate): Page deskew orchestration and the [`Pdf`] entry point

mod orchestrator;
mod pdf;

pub use orchestrator::process;
#[cfg(feature = "serde")]
pub use pdf::to_json;
pub use pdf::Pdf;

pub use pdfcoords_core;
pub use pdfcoords_core::{
    CharBox, Document, ExtractOptions, ExtractResult, ExtractWarning, ExtractWarningCode,
    PageRecord, PdfError, ProcessOptions, Separators, TocEntry, UnicodeNorm,
};
pub use pdfcoords_parse;
pub use pdfcoords_parse::LopdfDocument;
