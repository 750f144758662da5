//! Glyph baseline angles and the per-page angle histogram.
//!
//! Angles are measured from the text rendering matrix of each glyph as
//! `atan2(shear_y, scale_y)` in degrees, normalized into `(-180, 180]` and
//! quantized to tenths of a degree.

use std::collections::BTreeMap;

use crate::geometry::Ctm;

/// Histogram resolution: buckets per degree.
const BUCKETS_PER_DEGREE: f64 = 10.0;

/// Normalize an angle in degrees into `(-180, 180]`.
pub fn norm_angle(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(360.0);
    if a > 180.0 { a - 360.0 } else { a }
}

/// Round to the histogram resolution and normalize.
pub fn round_angle(degrees: f64) -> f64 {
    norm_angle((degrees * BUCKETS_PER_DEGREE).round() / BUCKETS_PER_DEGREE)
}

/// Baseline rotation of a glyph, in degrees, from its text rendering matrix.
pub fn glyph_angle(trm: &Ctm) -> f64 {
    norm_angle(trm.b.atan2(trm.d).to_degrees())
}

/// Shortest distance between two angles on the circle, in `[0, 180]`.
pub fn angle_distance(a: f64, b: f64) -> f64 {
    signed_angle_diff(a, b).abs()
}

/// `a - b` wrapped into `(-180, 180]`.
pub fn signed_angle_diff(a: f64, b: f64) -> f64 {
    norm_angle(a - b)
}

/// Whether a glyph's text is a usable angle signal.
///
/// Punctuation and whitespace are often drawn with arbitrary orientation by
/// OCR layers, so only glyphs with at least one alphanumeric char count.
pub fn is_angle_signal(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Histogram weight of a glyph: its UTF-16 code-unit count.
pub fn glyph_weight(text: &str) -> f64 {
    text.encode_utf16().count() as f64
}

/// Accumulated glyph weight per rounded baseline angle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleHistogram {
    /// Keyed by the angle in tenths of a degree.
    buckets: BTreeMap<i32, f64>,
}

impl AngleHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the bucket of `degrees`. Non-positive weights are ignored.
    pub fn add(&mut self, degrees: f64, weight: f64) {
        if weight <= 0.0 || !degrees.is_finite() {
            return;
        }
        *self.buckets.entry(bucket_key(degrees)).or_insert(0.0) += weight;
    }

    /// Record one glyph, skipping it when its text carries no angle signal.
    pub fn add_glyph(&mut self, trm: &Ctm, text: &str) {
        if is_angle_signal(text) {
            self.add(glyph_angle(trm), glyph_weight(text));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn weight(&self, degrees: f64) -> f64 {
        self.buckets
            .get(&bucket_key(degrees))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total_weight(&self) -> f64 {
        self.buckets.values().sum()
    }

    /// `(angle, weight)` pairs in ascending angle order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.buckets
            .iter()
            .map(|(&key, &w)| (f64::from(key) / BUCKETS_PER_DEGREE, w))
    }

    /// The heaviest bucket; ties go to the lower angle.
    pub fn mode(&self) -> Option<(f64, f64)> {
        self.iter().fold(None, |best, (angle, w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((angle, w)),
        })
    }
}

impl FromIterator<(f64, f64)> for AngleHistogram {
    fn from_iter<T: IntoIterator<Item = (f64, f64)>>(iter: T) -> Self {
        let mut hist = AngleHistogram::new();
        for (angle, weight) in iter {
            hist.add(angle, weight);
        }
        hist
    }
}

fn bucket_key(degrees: f64) -> i32 {
    let key = (round_angle(degrees) * BUCKETS_PER_DEGREE).round() as i32;
    // -1800 and 1800 are the same direction; keep the canonical (-180, 180] key.
    if key == -1800 { 1800 } else { key }
}
