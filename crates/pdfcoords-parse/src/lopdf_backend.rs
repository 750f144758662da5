//! lopdf-based document access: page boxes, rotation and content mutation.
//!
//! [`LopdfDocument`] owns the parsed [`lopdf::Document`] and the ordered page
//! list. Content changes are made by adding `cm` streams in front of a page's
//! `/Contents`; [`TemporaryTransform`] undoes its change when dropped.

use std::io::Write;
use std::ops::Deref;
use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId, Stream};
use pdfcoords_core::{Ctm, ExtractOptions, PdfError, PdfRect};

use crate::error::BackendError;
use crate::handler::ContentHandler;
use crate::interpreter::interpret_page;
use crate::objects::{inherited, rect, resolve};

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page ids in page order.
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl LopdfDocument {
    /// Parse a document from memory. Encrypted documents are rejected.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
        Self::from_document(inner)
    }

    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let bytes = std::fs::read(path)?;
        Self::open(&bytes)
    }

    /// Wrap an already loaded lopdf document.
    pub fn from_document(inner: lopdf::Document) -> Result<Self, BackendError> {
        if inner.is_encrypted() {
            return Err(BackendError::Core(PdfError::PasswordRequired));
        }
        // get_pages is keyed by 1-based page number.
        let page_ids = inner.get_pages().into_values().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(BackendError::PageOutOfRange {
                index,
                page_count: self.page_ids.len(),
            })
    }

    fn inherited_rect(&self, index: usize, key: &[u8]) -> Result<Option<PdfRect>, BackendError> {
        let page_id = self.page_id(index)?;
        let Some(obj) = inherited(&self.inner, page_id, key)? else {
            return Ok(None);
        };
        let [x0, y0, x1, y1] = obj
            .as_array()
            .ok()
            .and_then(|items| rect(&self.inner, items))
            .ok_or_else(|| {
                BackendError::Parse(format!(
                    "/{} is not an array of 4 numbers",
                    String::from_utf8_lossy(key)
                ))
            })?;
        Ok(Some(PdfRect::new(x0, y0, x1, y1)))
    }

    /// `/MediaBox`, inherited through the page tree.
    pub fn media_box(&self, index: usize) -> Result<PdfRect, BackendError> {
        self.inherited_rect(index, b"MediaBox")?
            .ok_or(BackendError::MissingMediaBox { index })
    }

    /// `/CropBox`, inherited through the page tree; the media box when absent.
    pub fn crop_box(&self, index: usize) -> Result<PdfRect, BackendError> {
        match self.inherited_rect(index, b"CropBox")? {
            Some(crop) => Ok(crop),
            None => self.media_box(index),
        }
    }

    /// `/Rotate` normalized into 0, 90, 180 or 270.
    pub fn rotation(&self, index: usize) -> Result<u16, BackendError> {
        let page_id = self.page_id(index)?;
        let value = inherited(&self.inner, page_id, b"Rotate")?
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        // Non-multiples of 90 are invalid; round down to the right angle.
        let degrees = value.rem_euclid(360) / 90 * 90;
        Ok(degrees as u16)
    }

    /// Set `/Rotate` on the page itself, overriding any inherited value.
    pub fn set_rotation(&mut self, index: usize, degrees: u16) -> Result<(), BackendError> {
        let value = i64::from(degrees % 360);
        self.page_dict_mut(index)?.set("Rotate", value);
        Ok(())
    }

    /// The `/Rotate` entry of the page dictionary itself, inherited values
    /// not included.
    pub fn own_rotation_entry(&self, index: usize) -> Result<Option<Object>, BackendError> {
        let page_id = self.page_id(index)?;
        Ok(self.inner.get_dictionary(page_id)?.get(b"Rotate").ok().cloned())
    }

    /// Put back an entry read by [`own_rotation_entry`](Self::own_rotation_entry).
    /// `None` removes the key so an inherited value applies again.
    pub fn restore_rotation_entry(
        &mut self,
        index: usize,
        entry: Option<Object>,
    ) -> Result<(), BackendError> {
        let page = self.page_dict_mut(index)?;
        match entry {
            Some(value) => page.set("Rotate", value),
            None => {
                page.remove(b"Rotate");
            }
        }
        Ok(())
    }

    /// Prepend `matrix` to the page's content permanently.
    pub fn prepend_transform(&mut self, index: usize, matrix: &Ctm) -> Result<(), BackendError> {
        self.inject_transform(index, matrix)?;
        Ok(())
    }

    /// Rotate the page's content counter-clockwise by `degrees` about the
    /// crop box centre.
    pub fn rotate_page_contents(&mut self, index: usize, degrees: f64) -> Result<(), BackendError> {
        let centre = self.crop_box(index)?.center();
        self.prepend_transform(index, &Ctm::rotation_about(degrees, centre.x, centre.y))
    }

    /// Prepend `matrix` until the returned guard is dropped.
    ///
    /// The guard dereferences to the document, so the page can be
    /// interpreted while the transform is in place.
    pub fn temporary_transform(
        &mut self,
        index: usize,
        matrix: &Ctm,
    ) -> Result<TemporaryTransform<'_>, BackendError> {
        let page_id = self.page_id(index)?;
        let (injected, previous) = self.inject_transform(index, matrix)?;
        Ok(TemporaryTransform {
            doc: self,
            page_id,
            injected,
            previous,
        })
    }

    /// Add a `cm` stream in front of `/Contents`.
    ///
    /// Returns the new stream's id and the `/Contents` value it replaced.
    fn inject_transform(
        &mut self,
        index: usize,
        matrix: &Ctm,
    ) -> Result<(ObjectId, Option<Object>), BackendError> {
        let page_id = self.page_id(index)?;
        let previous = self
            .inner
            .get_dictionary(page_id)?
            .get(b"Contents")
            .ok()
            .cloned();

        let mut parts = match previous.as_ref().map(|obj| resolve(&self.inner, obj)) {
            Some(Object::Array(items)) => items.clone(),
            Some(_) => previous.iter().cloned().collect(),
            None => Vec::new(),
        };
        let injected = self
            .inner
            .add_object(Stream::new(Dictionary::new(), cm_operator(matrix).into_bytes()));
        parts.insert(0, Object::Reference(injected));
        self.page_dict_mut(index)?.set("Contents", parts);
        Ok((injected, previous))
    }

    fn page_dict_mut(&mut self, index: usize) -> Result<&mut Dictionary, BackendError> {
        let page_id = self.page_id(index)?;
        Ok(self.inner.get_object_mut(page_id)?.as_dict_mut()?)
    }

    /// Run the content interpreter over one page.
    pub fn interpret_page(
        &self,
        index: usize,
        handler: &mut dyn ContentHandler,
        options: &ExtractOptions,
    ) -> Result<(), BackendError> {
        interpret_page(&self.inner, self.page_id(index)?, handler, options)
    }

    /// Serialize the document, including any content changes.
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<(), BackendError> {
        self.inner.save_to(writer)?;
        Ok(())
    }
}

/// A transform prepended to one page's content, removed on drop.
///
/// Dropping restores the page's exact previous `/Contents` value and deletes
/// the injected stream object.
pub struct TemporaryTransform<'d> {
    doc: &'d mut LopdfDocument,
    page_id: ObjectId,
    injected: ObjectId,
    previous: Option<Object>,
}

impl Deref for TemporaryTransform<'_> {
    type Target = LopdfDocument;

    fn deref(&self) -> &LopdfDocument {
        self.doc
    }
}

impl Drop for TemporaryTransform<'_> {
    fn drop(&mut self) {
        let inner = &mut self.doc.inner;
        if let Ok(page) = inner
            .get_object_mut(self.page_id)
            .and_then(Object::as_dict_mut)
        {
            match self.previous.take() {
                Some(contents) => page.set("Contents", contents),
                None => {
                    page.remove(b"Contents");
                }
            }
        }
        inner.objects.remove(&self.injected);
    }
}

fn cm_operator(m: &Ctm) -> String {
    let values: Vec<String> = m.to_array().iter().map(|&v| format_number(v)).collect();
    format!("{} cm\n", values.join(" "))
}

/// Fixed-point with at most 6 decimals, trailing zeros removed.
fn format_number(v: f64) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}
