//! Page deskew orchestration.
//!
//! Each page is measured once to build its glyph angle histogram, then
//! replayed once per angle cluster with the content turned upright for that
//! cluster. Each glyph's cluster is fixed by the measuring pass, indexed by
//! its position in the content stream, so every glyph lands in exactly one
//! replay. Glyph boxes are mapped back into one frame per page, upright
//! when deskewing is on and the original user space otherwise.

use pdfcoords_core::{
    AngleClusters, AngleHistogram, BBox, BoxPolicy, Ctm, DeskewDecision, Document, ExtractResult,
    ExtractWarning, ExtractWarningCode, GlyphMetrics, PageText, PdfError, PdfRect, Point,
    PositionedGlyph, ProcessOptions, glyph_angle, norm_angle, select_deskew_angle,
};
use pdfcoords_parse::lopdf::Object;
use pdfcoords_parse::{BackendError, ContentHandler, GlyphEvent, LopdfDocument};

/// Text shown for glyphs whose font gives no Unicode mapping.
const REPLACEMENT: &str = "\u{FFFD}";

/// Extract positioned text from every page of `doc`.
///
/// With `options.deskew` set the pages of `doc` are left rotated and
/// deskewed, ready to be saved. A page that fails is skipped with a
/// `PageSkipped` warning; its index is missing from the page records.
pub fn process(
    doc: &mut LopdfDocument,
    options: &ProcessOptions,
) -> Result<ExtractResult<Document>, PdfError> {
    let mut document = Document::new();
    let mut warnings = Vec::new();

    for index in 0..doc.page_count() {
        match process_page(doc, index, options) {
            Ok(page) => {
                warnings.extend(page.warnings);
                document.push_page(
                    index,
                    &page.media_box,
                    page.text,
                    page.deskew_angle,
                    page.rotation,
                );
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(page = index, error = %err, "page skipped");
                warnings.push(
                    ExtractWarning::with_code(
                        ExtractWarningCode::PageSkipped,
                        format!("page skipped: {err}"),
                    )
                    .on_page(index),
                );
            }
        }
    }
    Ok(ExtractResult::with_warnings(document, warnings))
}

struct PageOutcome {
    media_box: PdfRect,
    text: PageText,
    deskew_angle: f64,
    rotation: u16,
    warnings: Vec<ExtractWarning>,
}

fn process_page(
    doc: &mut LopdfDocument,
    index: usize,
    options: &ProcessOptions,
) -> Result<PageOutcome, BackendError> {
    let media_box = doc.media_box(index)?;
    let crop_box = doc.crop_box(index)?;
    let original_rotation = doc.rotation(index)?;
    // The page's own entry, kept only when measuring has to override it.
    let saved_rotation = if original_rotation != 0 {
        let entry = doc.own_rotation_entry(index)?;
        doc.set_rotation(index, 0)?;
        Some(entry)
    } else {
        None
    };

    match extract_page(doc, index, options, &media_box, &crop_box) {
        Ok((text, decision, warnings)) => {
            let rotation =
                finish_page(doc, index, options, &decision, original_rotation, saved_rotation)?;
            let deskew_angle = if decision.reliable {
                norm_angle(f64::from(decision.page_rotation) + decision.skew_angle)
            } else {
                0.0
            };
            Ok(PageOutcome {
                media_box,
                text,
                deskew_angle,
                rotation,
                warnings,
            })
        }
        Err(err) => {
            if let Some(entry) = saved_rotation {
                if let Err(_restore_err) = doc.restore_rotation_entry(index, entry) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        page = index,
                        error = %_restore_err,
                        "could not restore /Rotate"
                    );
                }
            }
            Err(err)
        }
    }
}

/// Measure the page, then replay each cluster in descending angle order.
fn extract_page(
    doc: &mut LopdfDocument,
    index: usize,
    options: &ProcessOptions,
    media_box: &PdfRect,
    crop_box: &PdfRect,
) -> Result<(PageText, DeskewDecision, Vec<ExtractWarning>), BackendError> {
    let mut measure = AnglePass::new(index);
    doc.interpret_page(index, &mut measure, &options.extract)?;
    let AnglePass {
        histogram,
        angles,
        mut warnings,
        ..
    } = measure;

    let threshold = options.ignore_angles_closer_than;
    let clusters = if histogram.is_empty() {
        AngleClusters::single(0.0, threshold)
    } else {
        AngleClusters::cleanup(&histogram, threshold)
    };
    let decision = select_deskew_angle(
        &histogram,
        options.angle_tails_skip_quantile,
        options.max_deskew_angle_abs,
    );
    #[cfg(feature = "tracing")]
    tracing::debug!(
        page = index,
        clusters = ?clusters.angles(),
        full_angle = decision.full_angle,
        page_rotation = decision.page_rotation,
        skew_angle = decision.skew_angle,
        reliable = decision.reliable,
        "page angles measured"
    );
    let bands: Vec<Option<usize>> = angles.iter().map(|&a| clusters.band_of(a)).collect();

    let skew = if options.deskew && decision.reliable {
        decision.skew_angle
    } else {
        0.0
    };
    let centre = crop_box.center();
    let assembly = options.assembly();
    let mut order: Vec<usize> = (0..clusters.len()).collect();
    order.sort_by(|&a, &b| clusters.angles()[b].total_cmp(&clusters.angles()[a]));

    let mut text = PageText::new();
    let mut unmapped = 0;
    for band in order {
        let angle = clusters.angles()[band];
        let mut replay = BandReplay {
            bands: &bands,
            next: 0,
            band,
            back: Ctm::rotation_about(angle - skew, centre.x, centre.y),
            policy: options.box_policy(),
            page_top: media_box.ury,
            glyphs: Vec::new(),
            unmapped: 0,
        };
        if angle == 0.0 {
            doc.interpret_page(index, &mut replay, &options.extract)?;
        } else {
            let upright = Ctm::rotation_about(-angle, centre.x, centre.y);
            let rotated = doc.temporary_transform(index, &upright)?;
            rotated.interpret_page(index, &mut replay, &options.extract)?;
        }
        unmapped += replay.unmapped;
        text.push_run(replay.glyphs, &assembly);
    }

    if unmapped > 0 && options.extract.collect_warnings {
        warnings.push(
            ExtractWarning::with_code(
                ExtractWarningCode::EncodingFallback,
                format!("{unmapped} glyphs without a Unicode mapping"),
            )
            .on_page(index),
        );
    }
    Ok((text.finish(&options.separators), decision, warnings))
}

/// Apply the deskew decision to the stored page. Returns the final `/Rotate`.
///
/// `/Rotate` is written only when the final rotation differs from the
/// page's original one; otherwise the page's own entry (or its absence)
/// is put back as it was.
fn finish_page(
    doc: &mut LopdfDocument,
    index: usize,
    options: &ProcessOptions,
    decision: &DeskewDecision,
    original_rotation: u16,
    saved_rotation: Option<Option<Object>>,
) -> Result<u16, BackendError> {
    let deskew = options.deskew && decision.reliable;
    let rotation = if deskew {
        decision.page_rotation
    } else {
        original_rotation
    };
    if rotation != original_rotation {
        doc.set_rotation(index, rotation)?;
    } else if let Some(entry) = saved_rotation {
        doc.restore_rotation_entry(index, entry)?;
    }
    if deskew && decision.skew_angle != 0.0 {
        doc.rotate_page_contents(index, -decision.skew_angle)?;
    }
    Ok(rotation)
}

/// Builds the angle histogram and keeps the interpreter's warnings.
struct AnglePass {
    page: usize,
    histogram: AngleHistogram,
    /// Angle of every glyph in content stream order, signal or not.
    angles: Vec<f64>,
    warnings: Vec<ExtractWarning>,
}

impl AnglePass {
    fn new(page: usize) -> Self {
        Self {
            page,
            histogram: AngleHistogram::new(),
            angles: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ContentHandler for AnglePass {
    fn on_glyph(&mut self, glyph: GlyphEvent) {
        self.angles.push(glyph_angle(&glyph.trm));
        if let Some(text) = &glyph.unicode {
            self.histogram.add_glyph(&glyph.trm, text);
        }
    }

    fn on_warning(&mut self, warning: ExtractWarning) {
        self.warnings.push(warning.on_page(self.page));
    }
}

/// Collects the glyphs of one angle band while the page is turned upright
/// for that band.
struct BandReplay<'c> {
    /// Band of each glyph, by content stream position.
    bands: &'c [Option<usize>],
    /// Position of the next glyph.
    next: usize,
    band: usize,
    /// Upright view to output frame.
    back: Ctm,
    policy: BoxPolicy,
    /// `/MediaBox` top, for the flip to top-left coordinates.
    page_top: f64,
    glyphs: Vec<PositionedGlyph>,
    unmapped: usize,
}

impl BandReplay<'_> {
    fn flipped_box(&self, points: impl Iterator<Item = Point>) -> Option<BBox> {
        let flipped: Vec<Point> = points.map(|p| Point::new(p.x, self.page_top - p.y)).collect();
        BBox::from_points(&flipped)
    }
}

impl ContentHandler for BandReplay<'_> {
    fn on_glyph(&mut self, glyph: GlyphEvent) {
        let position = self.next;
        self.next += 1;
        if self.bands.get(position).copied().flatten() != Some(self.band) {
            return;
        }

        let (ascent, descent) = glyph.font.line_extent();
        let metrics = GlyphMetrics {
            advance: glyph.advance,
            ascent,
            descent,
            cap_height: glyph.font.cap_height,
        };
        let upright: Vec<Point> = self
            .policy
            .glyph_corners(&metrics)
            .iter()
            .map(|&corner| glyph.trm.transform_point(corner))
            .collect();
        let layout_box = self.flipped_box(upright.iter().copied());
        let output_box = self.flipped_box(upright.iter().map(|&p| self.back.transform_point(p)));
        let (Some(layout_box), Some(output_box)) = (layout_box, output_box) else {
            return;
        };

        let text = match glyph.unicode {
            Some(text) => text,
            None => {
                self.unmapped += 1;
                REPLACEMENT.to_string()
            }
        };
        self.glyphs
            .push(PositionedGlyph::new(text, layout_box, output_box));
    }
}
