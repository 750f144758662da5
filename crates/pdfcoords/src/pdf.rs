//! Top-level PDF document type for processing and saving.

use std::io::Write;

use pdfcoords_core::{
    Document, ExtractResult, PdfError, ProcessOptions, TocEntry, resolve_table_of_contents,
};
use pdfcoords_parse::{LopdfDocument, read_named_destinations, read_outline};

use crate::orchestrator;

/// A PDF document opened for positioned text extraction.
///
/// Processing may rotate and deskew pages in place (see
/// [`ProcessOptions::deskew`]); [`Pdf::save_to`] writes the result.
///
/// # Example
///
/// ```ignore
/// let mut pdf = Pdf::open(&bytes)?;
/// let result = pdf.process(&ProcessOptions::default())?;
/// println!("{}", result.value.text);
/// ```
pub struct Pdf {
    doc: LopdfDocument,
}

impl Pdf {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or is not a valid PDF.
    #[cfg(feature = "std")]
    pub fn open_file(path: impl AsRef<std::path::Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| PdfError::IoError(e.to_string()))?;
        Self::open(&bytes)
    }

    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PasswordRequired`] if the PDF is encrypted.
    /// Returns [`PdfError`] if the bytes are not a valid PDF document.
    pub fn open(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = LopdfDocument::open(bytes)?;
        Ok(Self { doc })
    }

    /// Wrap an already parsed lopdf document.
    pub fn from_document(inner: pdfcoords_parse::lopdf::Document) -> Result<Self, PdfError> {
        let doc = LopdfDocument::from_document(inner)?;
        Ok(Self { doc })
    }

    /// Return the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    /// The underlying document, including any page changes made so far.
    pub fn document(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Extract the text of every page and resolve the table of contents.
    ///
    /// Per-page failures become warnings; the page is left out of
    /// `pages`. With `options.deskew` set, rotated and skewed pages are
    /// corrected in this document.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] only for failures that affect the whole document.
    pub fn process(
        &mut self,
        options: &ProcessOptions,
    ) -> Result<ExtractResult<Document>, PdfError> {
        let ExtractResult {
            value: mut document,
            mut warnings,
        } = orchestrator::process(&mut self.doc, options)?;
        let toc = self.table_of_contents();
        document.table_of_contents = toc.value;
        warnings.extend(toc.warnings);
        Ok(ExtractResult::with_warnings(document, warnings))
    }

    /// Resolve the outline into page-ordered table-of-contents entries.
    ///
    /// Entries whose destination cannot be resolved to a page are dropped.
    /// Duplicate named destinations are reported as warnings.
    pub fn table_of_contents(&self) -> ExtractResult<Vec<TocEntry>> {
        let inner = self.doc.inner();
        let items = read_outline(inner);
        let (named, warnings) = read_named_destinations(inner);
        let entries = resolve_table_of_contents(&items, &named, self.doc.page_ids());
        ExtractResult::with_warnings(entries, warnings)
    }

    /// Write the document, with any deskew corrections, to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::IoError`] if writing fails.
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<(), PdfError> {
        self.doc.save_to(writer)?;
        Ok(())
    }

    /// Write the document to a file path.
    #[cfg(feature = "std")]
    pub fn save_file(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), PdfError> {
        let mut file =
            std::fs::File::create(path.as_ref()).map_err(|e| PdfError::IoError(e.to_string()))?;
        self.save_to(&mut file)
    }
}

/// Serialize a processed document as JSON.
///
/// # Errors
///
/// Returns [`PdfError::Other`] if serialization fails.
#[cfg(feature = "serde")]
pub fn to_json(document: &Document) -> Result<String, PdfError> {
    serde_json::to_string(document).map_err(|e| PdfError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfcoords_parse::lopdf::{Object, dictionary};

    fn empty_pdf(pages: usize) -> Pdf {
        let mut doc = pdfcoords_parse::lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                }))
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Pdf::from_document(doc).unwrap()
    }

    #[test]
    fn open_rejects_garbage() {
        assert!(Pdf::open(b"not a pdf").is_err());
    }

    #[test]
    fn pages_without_content_give_empty_records() {
        let mut pdf = empty_pdf(2);
        assert_eq!(pdf.page_count(), 2);
        let result = pdf.process(&ProcessOptions::default()).unwrap();
        assert!(result.is_clean());
        let document = result.value;
        assert_eq!(document.text, "\u{c}\u{c}");
        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.pages[1].page_index, 1);
        assert_eq!(document.pages[1].bbox, [0.0, 0.0, 612.0, 792.0]);
        assert!(document.table_of_contents.is_empty());
        assert!(document.check_invariants().is_ok());
    }

    #[test]
    fn save_writes_a_pdf() {
        let mut pdf = empty_pdf(1);
        let mut out = Vec::new();
        pdf.save_to(&mut out).unwrap();
        assert!(out.starts_with(b"%PDF-1.5"));
        assert_eq!(Pdf::open(&out).unwrap().page_count(), 1);
    }
}
