//! JSON shape of the public output records.

#![cfg(feature = "serde")]

use pdfcoords_core::*;

fn sample_document() -> Document {
    let mut page = PageText::new();
    page.push_chars("Hi", Some(CharBox::new(72.0, 63.5, 6.67, 12.0)));
    let page = page.finish(&Separators::default());

    let mut doc = Document::new();
    doc.push_page(0, &PdfRect::new(0.0, 0.0, 612.0, 792.0), page, 0.5, 90);
    doc.table_of_contents.push(TocEntry {
        title: "Intro".to_string(),
        level: 1,
        left: 72.0,
        top: 700.0,
        page: 0,
    });
    doc
}

#[test]
fn char_boxes_serialize_as_arrays_and_nulls() {
    let json = serde_json::to_value(sample_document()).unwrap();
    assert_eq!(json["char_boxes"][0], serde_json::json!([72.0, 63.5, 6.67, 12.0]));
    assert!(json["char_boxes"][2].is_null());
}

#[test]
fn page_record_shape() {
    let json = serde_json::to_value(sample_document()).unwrap();
    let page = &json["pages"][0];
    assert_eq!(page["bbox"], serde_json::json!([0.0, 0.0, 612.0, 792.0]));
    assert_eq!(page["text_range"]["start"], 0);
    assert_eq!(page["text_range"]["end"], 3);
    assert_eq!(page["deskew_angle"], 0.5);
    assert_eq!(page["rotation"], 90);
}

#[test]
fn document_survives_json() {
    let doc = sample_document();
    let json = serde_json::to_string(&doc).unwrap();
    let restored: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, doc);
    assert!(restored.check_invariants().is_ok());
}

#[test]
fn warning_code_is_tagged() {
    let w = ExtractWarning::with_code(ExtractWarningCode::PageSkipped, "bad stream").on_page(4);
    let json = serde_json::to_value(&w).unwrap();
    assert_eq!(json["code"]["type"], "PageSkipped");
    assert_eq!(json["page"], 4);
    let restored: ExtractWarning = serde_json::from_value(json).unwrap();
    assert_eq!(restored, w);
}

#[test]
fn options_load_from_partial_json() {
    let opts: ProcessOptions = serde_json::from_str(
        r#"{"enhanced_glyph_boxes": true, "separators": {"line": "\r\n"}}"#,
    )
    .unwrap();
    assert!(opts.enhanced_glyph_boxes);
    assert_eq!(opts.separators.line, "\r\n");
    assert_eq!(opts.separators.word, " ");
    assert_eq!(opts.ignore_angles_closer_than, 3.0);
}
