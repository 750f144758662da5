//! Small helpers over lopdf objects shared by the loaders.

use std::sync::LazyLock;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::BackendError;

/// Follow one level of indirection; dangling references resolve to themselves.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up `key` and follow a reference.
pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match get(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

pub(crate) fn get_array<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a [Object]> {
    get(doc, dict, key)?.as_array().ok().map(Vec::as_slice)
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, dict, key).and_then(number)
}

pub(crate) fn get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    get(doc, dict, key)?
        .as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Four numbers, as in `/MediaBox` and `/FontBBox`.
pub(crate) fn rect(doc: &Document, items: &[Object]) -> Option<[f64; 4]> {
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = number(resolve(doc, item))?;
    }
    Some(out)
}

/// Stream bytes with filters applied.
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

/// Page tree nesting deeper than this is treated as a cycle.
const MAX_TREE_DEPTH: usize = 64;

/// Look up a page attribute, walking `/Parent` links for inherited keys.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current)?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse(format!(
        "page tree above {page_id:?} is deeper than {MAX_TREE_DEPTH}"
    )))
}

static EMPTY_RESOURCES: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);

/// Resources of a page; a page without any uses an empty dictionary.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    match inherited(doc, page_id, b"Resources")? {
        Some(Object::Dictionary(dict)) => Ok(dict),
        Some(_) => Err(BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_RESOURCES),
    }
}

/// Decoded `/Contents` of a page. Array parts are joined with a space.
pub(crate) fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, BackendError> {
    let page = doc.get_dictionary(page_id)?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    let parts: Vec<&Object> = match resolve(doc, contents) {
        Object::Array(items) => items.iter().map(|o| resolve(doc, o)).collect(),
        other => vec![other],
    };
    let mut out = Vec::new();
    for part in parts {
        let stream = part
            .as_stream()
            .map_err(|_| BackendError::Parse("/Contents entry is not a stream".to_string()))?;
        if !out.is_empty() {
            out.push(b' ');
        }
        out.extend(stream_bytes(stream)?);
    }
    Ok(out)
}

/// Decode a PDF text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
pub(crate) fn text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
