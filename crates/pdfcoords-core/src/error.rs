//! Fatal errors and recoverable warnings.
//!
//! A [`PdfError`] stops the document (or, inside the page loop, the page).
//! Everything the pipeline can work around is reported as an
//! [`ExtractWarning`] next to the value in an [`ExtractResult`].

use std::fmt;

/// Errors that abort processing.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// The file or an object in it could not be parsed.
    ParseError(String),
    /// Reading or writing PDF bytes failed.
    IoError(String),
    /// A content stream could not be interpreted.
    InterpreterError(String),
    /// A page index past the end of the page tree.
    PageOutOfRange { index: usize, page_count: usize },
    /// A configured interpreter limit was exceeded.
    ResourceLimitExceeded {
        /// Option name, e.g. `max_operators_per_page`.
        limit_name: String,
        limit_value: usize,
        actual_value: usize,
    },
    /// The document is encrypted.
    PasswordRequired,
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::InterpreterError(msg) => write!(f, "interpreter error: {msg}"),
            PdfError::PageOutOfRange { index, page_count } => {
                write!(f, "page {index} out of range (document has {page_count} pages)")
            }
            PdfError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
            ),
            PdfError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfError::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// What kind of problem a warning reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum ExtractWarningCode {
    /// `Tf` named a font missing from the page resources; its text is not shown.
    MissingFont,
    /// An object had the wrong type or was missing, e.g. an unknown XObject.
    MalformedObject,
    /// Glyphs without a Unicode mapping were emitted as U+FFFD.
    EncodingFallback,
    /// The page failed and has no page record.
    PageSkipped,
    /// A named destination was defined again; the first definition is kept.
    DuplicateDestination,
}

impl ExtractWarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractWarningCode::MissingFont => "MISSING_FONT",
            ExtractWarningCode::MalformedObject => "MALFORMED_OBJECT",
            ExtractWarningCode::EncodingFallback => "ENCODING_FALLBACK",
            ExtractWarningCode::PageSkipped => "PAGE_SKIPPED",
            ExtractWarningCode::DuplicateDestination => "DUPLICATE_DESTINATION",
        }
    }
}

impl fmt::Display for ExtractWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem, with as much location as is known.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractWarning {
    pub code: ExtractWarningCode,
    pub description: String,
    /// 0-based page index.
    pub page: Option<usize>,
    /// Index of the operator within its content stream.
    pub operator_index: Option<usize>,
    pub font_name: Option<String>,
}

impl ExtractWarning {
    pub fn with_code(code: ExtractWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
            operator_index: None,
            font_name: None,
        }
    }

    /// Attach the page index unless one is already set.
    pub fn on_page(mut self, page: usize) -> Self {
        self.page.get_or_insert(page);
        self
    }

    pub fn at_operator(mut self, operator_index: usize, font_name: impl Into<String>) -> Self {
        self.operator_index = Some(operator_index);
        self.font_name = Some(font_name.into());
        self
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(page) = self.page {
            write!(f, "page {page}: ")?;
        }
        write!(f, "{}: {}", self.code, self.description)?;
        match (self.operator_index, &self.font_name) {
            (Some(index), Some(font)) => write!(f, " (operator {index}, font {font})"),
            (Some(index), None) => write!(f, " (operator {index})"),
            _ => Ok(()),
        }
    }
}

/// A value together with the warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct ExtractResult<T> {
    pub value: T,
    pub warnings: Vec<ExtractWarning>,
}

impl<T> ExtractResult<T> {
    pub fn with_warnings(value: T, warnings: Vec<ExtractWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Warnings with the given code.
    pub fn warnings_with(
        &self,
        code: ExtractWarningCode,
    ) -> impl Iterator<Item = &ExtractWarning> + '_ {
        self.warnings.iter().filter(move |w| w.code == code)
    }
}
