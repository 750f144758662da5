//! Page rotation and residual skew selection from an angle histogram.

use crate::angle::{AngleHistogram, norm_angle, signed_angle_diff};
use crate::weighted::{AngleStats, WeightedAngle, deviation_ok, weighted_average};

/// Fewer distinct histogram buckets than this disable tail trimming.
pub const MIN_ANGLES_FOR_TAIL_TRIM: usize = 2;

/// Default share of the most distant mass cut on each side.
pub const DEFAULT_TAILS_SKIP_QUANTILE: f64 = 0.05;

/// Default bound on a residual skew that is still trusted.
pub const DEFAULT_MAX_DESKEW_ANGLE_ABS: f64 = 6.0;

/// How a page is oriented and how far it is skewed from that orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeskewDecision {
    /// Trimmed weighted mean of the glyph angles.
    pub full_angle: f64,
    /// Right-angle page rotation in degrees: 0, 90, 180 or 270.
    pub page_rotation: u16,
    /// What remains of `full_angle` after removing the right-angle rotation.
    pub skew_angle: f64,
    /// False when the angles were too scattered to trust.
    pub reliable: bool,
}

impl DeskewDecision {
    /// The decision for a page that should be left as it is.
    pub fn unrotated(full_angle: f64) -> Self {
        Self {
            full_angle,
            page_rotation: 0,
            skew_angle: 0.0,
            reliable: false,
        }
    }
}

/// Weighted-mean statistics of a histogram around its heaviest bucket.
///
/// Angles are unwrapped around the mode so a cluster straddling ±180°
/// averages to 180° instead of 0°.
pub fn histogram_stats(histogram: &AngleHistogram, tails_skip_quantile: f64) -> AngleStats {
    let Some((mode, _)) = histogram.mode() else {
        return AngleStats::default();
    };
    let samples: Vec<WeightedAngle> = histogram
        .iter()
        .map(|(angle, weight)| {
            let unwrapped = mode + signed_angle_diff(angle, mode);
            WeightedAngle::new(unwrapped, weight, (unwrapped - mode).abs())
        })
        .collect();
    let quantile = if samples.len() < MIN_ANGLES_FOR_TAIL_TRIM {
        0.0
    } else {
        tails_skip_quantile
    };
    let stats = weighted_average(&samples, quantile);
    AngleStats {
        mean: norm_angle(stats.mean),
        deviation: stats.deviation,
    }
}

/// Pick the page rotation and residual skew for a page.
pub fn select_deskew_angle(
    histogram: &AngleHistogram,
    tails_skip_quantile: f64,
    max_deskew_angle_abs: f64,
) -> DeskewDecision {
    if histogram.is_empty() {
        return DeskewDecision::unrotated(0.0);
    }
    let stats = histogram_stats(histogram, tails_skip_quantile);
    if !deviation_ok(stats.mean, stats.deviation) {
        return DeskewDecision::unrotated(stats.mean);
    }

    let quarter_turns = (stats.mean / 90.0).round();
    let right_angle = quarter_turns * 90.0;
    let mut skew_angle = stats.mean - right_angle;
    if skew_angle.abs() > max_deskew_angle_abs {
        skew_angle = 0.0;
    }
    DeskewDecision {
        full_angle: stats.mean,
        page_rotation: (quarter_turns as i64).rem_euclid(4) as u16 * 90,
        skew_angle,
        reliable: true,
    }
}
