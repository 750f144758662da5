//! Errors raised while reading pages and interpreting their content.
//!
//! [`BackendError`] is derived with [`thiserror`]; at the public API it
//! converts into [`PdfError`].

use pdfcoords_core::PdfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Broken document structure.
    #[error("PDF parse error: {0}")]
    Parse(String),

    #[error("lopdf error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A content stream that cannot be tokenized or run.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// Neither the page nor its ancestors define `/MediaBox`.
    #[error("page {index} has no /MediaBox")]
    MissingMediaBox { index: usize },

    #[error("page index {index} out of range (document has {page_count} pages)")]
    PageOutOfRange { index: usize, page_count: usize },

    #[error(transparent)]
    Core(#[from] PdfError),
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => PdfError::IoError(e.to_string()),
            BackendError::Interpreter(msg) => PdfError::InterpreterError(msg),
            BackendError::PageOutOfRange { index, page_count } => {
                PdfError::PageOutOfRange { index, page_count }
            }
            BackendError::Core(e) => e,
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            other @ (BackendError::Lopdf(_) | BackendError::MissingMediaBox { .. }) => {
                PdfError::ParseError(other.to_string())
            }
        }
    }
}
