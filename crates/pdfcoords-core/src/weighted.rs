//! Weighted mean and deviation of glyph angles with tail trimming.

/// One histogram sample: an angle, its weight, and its distance from an
/// initial location estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedAngle {
    pub angle: f64,
    pub weight: f64,
    pub distance: f64,
}

impl WeightedAngle {
    pub fn new(angle: f64, weight: f64, distance: f64) -> Self {
        Self {
            angle,
            weight,
            distance,
        }
    }
}

/// Trimmed weighted mean and the weighted standard deviation around it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleStats {
    pub mean: f64,
    pub deviation: f64,
}

/// Weighted average of `items` after cutting `tails_skip_quantile` of the mass.
///
/// When every distance is zero the samples are ordered by angle and the
/// quantile is cut from both ends. Otherwise they are ordered by distance and
/// twice the quantile is cut from the far end only. A zero quantile returns
/// the plain weighted mean with no deviation.
pub fn weighted_average(items: &[WeightedAngle], tails_skip_quantile: f64) -> AngleStats {
    match items {
        [] => return AngleStats::default(),
        [only] => {
            return AngleStats {
                mean: only.angle,
                deviation: 0.0,
            };
        }
        _ => {}
    }

    let total: f64 = items.iter().map(|it| it.weight).sum();
    if total <= 0.0 {
        return AngleStats::default();
    }
    let mut normalized: Vec<WeightedAngle> = items
        .iter()
        .map(|it| WeightedAngle::new(it.angle, it.weight / total, it.distance))
        .collect();

    if tails_skip_quantile <= 0.0 {
        let mean = normalized.iter().map(|it| it.angle * it.weight).sum();
        return AngleStats {
            mean,
            deviation: 0.0,
        };
    }

    if normalized.iter().all(|it| it.distance == 0.0) {
        normalized.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        series_stats(&normalized, tails_skip_quantile, tails_skip_quantile)
    } else {
        normalized.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        series_stats(&normalized, 0.0, tails_skip_quantile * 2.0)
    }
}

/// Whether `deviation` is acceptable for an angle around `mean`.
///
/// The tolerance grows with the angle: about 0.28° near zero, 0.57° at 1°
/// and 4.8° at 90°.
pub fn deviation_ok(mean: f64, deviation: f64) -> bool {
    deviation < ((mean.abs() + 0.32) * 0.25).sqrt()
}

fn series_stats(sorted: &[WeightedAngle], head: f64, tail: f64) -> AngleStats {
    let mean = fold_series_body(sorted, head, tail, |acc, share, it| acc + it.angle * share);
    let variance = fold_series_body(sorted, head, tail, |acc, share, it| {
        let d = it.angle - mean;
        acc + d * d * share
    });
    AngleStats {
        mean,
        deviation: variance.sqrt(),
    }
}

/// Fold over the body of an ordered, weight-normalized series.
///
/// Skips the first `head` and the last `tail` of the cumulative weight; the
/// items straddling either cut contribute only their inside part. `share` is
/// the item's body weight renormalized by the body size.
fn fold_series_body(
    sorted: &[WeightedAngle],
    head: f64,
    tail: f64,
    step: impl Fn(f64, f64, &WeightedAngle) -> f64,
) -> f64 {
    let tail_limit = 1.0 - tail;
    let body = 1.0 - head - tail;
    if body <= 0.0 {
        return 0.0;
    }

    let mut accumulated = 0.0;
    let mut acc = 0.0;
    let mut passed_head = false;
    for item in sorted {
        let mut w = item.weight;
        accumulated += w;
        if !passed_head {
            if accumulated < head {
                continue;
            }
            w = accumulated - head;
            passed_head = true;
        }
        let passed_tail = accumulated > tail_limit;
        if passed_tail {
            w -= accumulated - tail_limit;
        }
        acc = step(acc, w / body, item);
        if passed_tail {
            break;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(entries: &[(f64, f64)]) -> Vec<WeightedAngle> {
        entries
            .iter()
            .map(|&(angle, weight)| WeightedAngle::new(angle, weight, 0.0))
            .collect()
    }

    fn with_distance_from(mut items: Vec<WeightedAngle>, center: f64) -> Vec<WeightedAngle> {
        for item in &mut items {
            item.distance = (item.angle - center).abs();
        }
        items
    }

    fn four_peaks() -> Vec<WeightedAngle> {
        samples(&[(1.0, 10.0), (5.0, 500.0), (6.0, 500.0), (100.0, 10.0)])
    }

    // --- degenerate input ---

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(weighted_average(&[], 0.05), AngleStats::default());
    }

    #[test]
    fn single_sample_is_its_angle() {
        let stats = weighted_average(&samples(&[(12.5, 3.0)]), 0.05);
        assert_eq!(stats.mean, 12.5);
        assert_eq!(stats.deviation, 0.0);
    }

    // --- fixtures ---

    #[test]
    fn plain_weighted_mean_without_trimming() {
        let stats = weighted_average(&samples(&[(0.0, 10.0), (10.0, 990.0)]), 0.0);
        assert!((stats.mean - 9.9).abs() < 1e-3, "got {}", stats.mean);
        assert_eq!(stats.deviation, 0.0);
    }

    #[test]
    fn equidistant_trimming_cuts_both_ends() {
        let trimmed = weighted_average(&four_peaks(), 0.1).mean;
        assert!((trimmed - 5.5).abs() < 0.05, "got {trimmed}");
        let untrimmed = weighted_average(&four_peaks(), 0.0).mean;
        assert!(untrimmed > trimmed);
    }

    #[test]
    fn distance_trimming_follows_the_estimate() {
        let base = weighted_average(&four_peaks(), 0.1).mean;
        let low = weighted_average(&with_distance_from(four_peaks(), 3.0), 0.1).mean;
        let high = weighted_average(&with_distance_from(four_peaks(), 7.0), 0.1).mean;
        assert!(low < base, "{low} !< {base}");
        assert!(high > base, "{high} !> {base}");
    }

    #[test]
    fn trimming_removes_noise_from_the_deviation() {
        let items = with_distance_from(
            samples(&[
                (1.0, 5.0),
                (89.0, 500.0),
                (91.0, 500.0),
                (180.0, 4.0),
                (1270.0, 1.0),
            ]),
            90.0,
        );
        let trimmed = weighted_average(&items, 0.05);
        assert_eq!(trimmed.mean.round(), 90.0);
        assert!(trimmed.deviation < 1.0, "got {}", trimmed.deviation);

        let barely_trimmed = weighted_average(&items, 0.001);
        assert!(barely_trimmed.deviation > 1.0, "got {}", barely_trimmed.deviation);
    }

    #[test]
    fn small_far_cluster_is_cut_away() {
        let items = with_distance_from(samples(&[(0.0, 1149.0), (88.9, 12.0)]), 0.0);
        let stats = weighted_average(&items, 0.05);
        assert!(stats.mean < 0.2, "got {}", stats.mean);
    }

    // --- deviation check ---

    #[test]
    fn tolerance_grows_with_angle() {
        assert!(deviation_ok(0.0, 0.2));
        assert!(!deviation_ok(0.0, 0.3));
        assert!(deviation_ok(90.0, 4.5));
        assert!(!deviation_ok(90.0, 5.0));
        assert!(deviation_ok(-90.0, 4.5));
    }
}
