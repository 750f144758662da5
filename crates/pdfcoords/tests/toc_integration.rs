//! Table-of-contents resolution from outlines and named destinations.

mod common;

use common::{build, page, to_bytes};
use lopdf::{Document, Object, ObjectId, dictionary};
use pdfcoords::{ExtractWarningCode, Pdf, ProcessOptions};

fn set_catalog(doc: &mut Document, key: &str, value: Object) {
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    doc.get_object_mut(root)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set(key, value);
}

fn xyz(page: ObjectId, left: Object, top: Object) -> Object {
    Object::Array(vec![
        Object::Reference(page),
        "XYZ".into(),
        left,
        top,
        Object::Null,
    ])
}

/// Ten empty pages with an outline pointing at pages 5, 2, 2 and 9, plus
/// two entries that cannot be resolved.
fn outlined_pdf() -> Vec<u8> {
    let (mut doc, pages) = build((0..10).map(|_| page("")).collect());

    let outlines = doc.new_object_id();
    let five = doc.new_object_id();
    let two_a = doc.new_object_id();
    let two_b = doc.new_object_id();
    let nine = doc.new_object_id();
    let web = doc.new_object_id();
    let stale = doc.new_object_id();

    let items = [
        (
            outlines,
            dictionary! {
                "Type" => "Outlines",
                "First" => five,
                "Last" => stale,
                "Count" => 6,
            },
        ),
        (
            five,
            dictionary! {
                "Title" => Object::string_literal("five"),
                "Parent" => outlines,
                "Next" => two_a,
                "Dest" => Object::string_literal("chap5"),
            },
        ),
        (
            two_a,
            dictionary! {
                "Title" => Object::string_literal("two-a"),
                "Parent" => outlines,
                "Prev" => five,
                "Next" => nine,
                "First" => two_b,
                "Last" => two_b,
                "Count" => 1,
                "Dest" => xyz(pages[2], 72.into(), 700.into()),
            },
        ),
        (
            two_b,
            dictionary! {
                "Title" => Object::string_literal("two-b"),
                "Parent" => two_a,
                "A" => dictionary! {
                    "S" => "GoTo",
                    "D" => vec![Object::Reference(pages[2]), "Fit".into()],
                },
            },
        ),
        (
            nine,
            dictionary! {
                "Title" => Object::string_literal("nine"),
                "Parent" => outlines,
                "Prev" => two_a,
                "Next" => web,
                "Dest" => xyz(pages[9], Object::Null, 300.into()),
            },
        ),
        (
            web,
            dictionary! {
                "Title" => Object::string_literal("web"),
                "Parent" => outlines,
                "Prev" => nine,
                "Next" => stale,
                "A" => dictionary! {
                    "S" => "URI",
                    "URI" => Object::string_literal("https://example.com"),
                },
            },
        ),
        (
            stale,
            dictionary! {
                "Title" => Object::string_literal("stale"),
                "Parent" => outlines,
                "Prev" => web,
                "Dest" => Object::string_literal("missing"),
            },
        ),
    ];
    for (id, dict) in items {
        doc.objects.insert(id, Object::Dictionary(dict));
    }

    set_catalog(&mut doc, "Outlines", Object::Reference(outlines));
    set_catalog(
        &mut doc,
        "Names",
        Object::Dictionary(dictionary! {
            "Dests" => dictionary! {
                "Names" => vec![
                    Object::string_literal("chap5"),
                    xyz(pages[5], 0.into(), 500.into()),
                ],
            },
        }),
    );
    // Same name in the catalog dictionary; the name tree entry wins.
    set_catalog(
        &mut doc,
        "Dests",
        Object::Dictionary(dictionary! {
            "chap5" => vec![Object::Reference(pages[1]), "Fit".into()],
        }),
    );

    to_bytes(&mut doc)
}

#[test]
fn entries_are_ordered_by_page() {
    let pdf = Pdf::open(&outlined_pdf()).unwrap();
    let toc = pdf.table_of_contents();

    let order: Vec<(&str, usize, usize)> = toc
        .value
        .iter()
        .map(|e| (e.title.as_str(), e.level, e.page))
        .collect();
    assert_eq!(
        order,
        vec![
            ("two-a", 1, 2),
            ("two-b", 2, 2),
            ("five", 1, 5),
            ("nine", 1, 9),
        ]
    );
}

#[test]
fn locations_come_from_xyz_destinations() {
    let pdf = Pdf::open(&outlined_pdf()).unwrap();
    let toc = pdf.table_of_contents().value;
    let location: Vec<(f64, f64)> = toc.iter().map(|e| (e.left, e.top)).collect();
    assert_eq!(
        location,
        vec![(72.0, 700.0), (0.0, 0.0), (0.0, 500.0), (0.0, 300.0)]
    );
}

#[test]
fn duplicate_destination_is_a_warning() {
    let pdf = Pdf::open(&outlined_pdf()).unwrap();
    let toc = pdf.table_of_contents();
    assert_eq!(toc.warnings.len(), 1);
    assert_eq!(toc.warnings[0].code, ExtractWarningCode::DuplicateDestination);
}

#[test]
fn process_attaches_the_table_of_contents() {
    let mut pdf = Pdf::open(&outlined_pdf()).unwrap();
    let result = pdf.process(&ProcessOptions::default()).unwrap();
    assert_eq!(result.value.table_of_contents.len(), 4);
    assert_eq!(result.value.pages.len(), 10);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.code == ExtractWarningCode::DuplicateDestination)
    );
}

#[test]
fn document_without_outline_has_empty_toc() {
    let pdf = Pdf::open(&common::pdf(vec![page("")])).unwrap();
    let toc = pdf.table_of_contents();
    assert!(toc.value.is_empty());
    assert!(toc.is_clean());
}
