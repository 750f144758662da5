//! PDF builders shared by the integration suites.
//!
//! Every page shares one `/F1` Helvetica resource. Without `/Widths` each
//! glyph advances 0.6 em, and without a descriptor its box runs from 0.25 em
//! below the baseline to 0.75 em above it.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// One page of a generated test document.
pub struct TestPage {
    content: String,
    rotate: Option<i64>,
    media_box: bool,
}

pub fn page(content: &str) -> TestPage {
    TestPage {
        content: content.to_string(),
        rotate: None,
        media_box: true,
    }
}

impl TestPage {
    pub fn rotated(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn without_media_box(mut self) -> Self {
        self.media_box = false;
        self
    }
}

/// Text operators showing `text` at `(x, y)`, rotated counter-clockwise by `degrees`.
pub fn text_at(text: &str, size: f64, x: f64, y: f64, degrees: f64) -> String {
    let (sin, cos) = degrees.to_radians().sin_cos();
    format!(
        "BT /F1 {size} Tf {cos:.6} {sin:.6} {:.6} {cos:.6} {x} {y} Tm ({text}) Tj ET\n",
        -sin
    )
}

/// Build a document; returns it with its page ids in order.
pub fn build(pages: Vec<TestPage>) -> (Document, Vec<ObjectId>) {
    let mut doc = Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for test_page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, test_page.content.into_bytes()));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        };
        if test_page.media_box {
            page_dict.set(
                "MediaBox",
                vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            );
        }
        if let Some(rotate) = test_page.rotate {
            page_dict.set("Rotate", Object::Integer(rotate));
        }
        page_ids.push(doc.add_object(page_dict));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_ids.len() as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    (doc, page_ids)
}

pub fn to_bytes(doc: &mut Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn pdf(pages: Vec<TestPage>) -> Vec<u8> {
    let (mut doc, _) = build(pages);
    to_bytes(&mut doc)
}

/// `/Rotate` and the number of `/Contents` parts of a saved page.
pub fn saved_page(bytes: &[u8], index: usize) -> (i64, usize) {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&(index as u32 + 1)];
    let dict = doc.get_dictionary(page_id).unwrap();
    let rotate = dict.get(b"Rotate").and_then(Object::as_i64).unwrap_or(0);
    let parts = match dict.get(b"Contents") {
        Ok(Object::Array(items)) => items.len(),
        Ok(_) => 1,
        Err(_) => 0,
    };
    (rotate, parts)
}

/// The page's own `/Rotate` entry in a saved document, inherited values
/// not included.
pub fn own_rotate(bytes: &[u8], index: usize) -> Option<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&(index as u32 + 1)];
    let dict = doc.get_dictionary(page_id).unwrap();
    dict.get(b"Rotate").and_then(Object::as_i64).ok()
}

/// Put `/Rotate` on the page tree root so every page inherits it.
pub fn inherit_rotate(doc: &mut Document, degrees: i64) {
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let pages = doc
        .get_dictionary(root)
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    doc.get_object_mut(pages)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Rotate", Object::Integer(degrees));
}

pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

/// Circular distance between two angles in degrees.
pub fn angle_gap(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}
