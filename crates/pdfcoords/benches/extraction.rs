//! Performance benchmarks for pdfcoords.
//!
//! Benchmarks cover the page pipeline (angle pass, band replay, text
//! assembly) on three generated documents:
//! - Simple: 1 page, upright paragraph
//! - Mixed: 10 pages, upright body text with a 90° margin note per page
//! - Skewed: 10 pages, text skewed by 2°, with deskew enabled

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Object, Stream, dictionary};
use pdfcoords::{Pdf, ProcessOptions};

// ---------------------------------------------------------------------------
// PDF fixture generators
// ---------------------------------------------------------------------------

/// Build a PDF with one page per content stream.
fn build_pdf(contents: &[String]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");

    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone().into_bytes()));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font) },
            },
        }));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(contents.len() as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save benchmark PDF");
    buf
}

/// Lines of text at `degrees`, starting at `(x, y)` and stepping down the page.
fn paragraph(lines: usize, x: f64, y: f64, degrees: f64) -> String {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let mut out = String::new();
    for i in 0..lines {
        let offset = i as f64 * 14.0;
        let (lx, ly) = (x + offset * sin, y - offset * cos);
        out.push_str(&format!(
            "BT /F1 11 Tf {cos:.6} {sin:.6} {:.6} {cos:.6} {lx:.2} {ly:.2} Tm \
             (The quick brown fox jumps over the lazy dog, line {i}.) Tj ET\n",
            -sin
        ));
    }
    out
}

fn simple_pdf() -> Vec<u8> {
    build_pdf(&[paragraph(20, 72.0, 720.0, 0.0)])
}

fn mixed_pdf() -> Vec<u8> {
    let pages: Vec<String> = (0..10)
        .map(|_| paragraph(40, 72.0, 720.0, 0.0) + &paragraph(3, 560.0, 120.0, 90.0))
        .collect();
    build_pdf(&pages)
}

fn skewed_pdf() -> Vec<u8> {
    let pages: Vec<String> = (0..10).map(|_| paragraph(40, 72.0, 700.0, 2.0)).collect();
    build_pdf(&pages)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    let upright = ProcessOptions::default();
    let deskew = ProcessOptions {
        deskew: true,
        ..ProcessOptions::default()
    };

    for (name, bytes, options) in [
        ("simple", simple_pdf(), &upright),
        ("mixed", mixed_pdf(), &upright),
        ("skewed", skewed_pdf(), &deskew),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut pdf = Pdf::open(black_box(&bytes)).unwrap();
                black_box(pdf.process(options).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_open(c: &mut Criterion) {
    let bytes = mixed_pdf();
    c.bench_function("open/mixed", |b| {
        b.iter(|| Pdf::open(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, bench_process, bench_open);
criterion_main!(benches);
