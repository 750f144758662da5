//! Merging close histogram angles into orientation clusters.

use crate::angle::{AngleHistogram, angle_distance, norm_angle, signed_angle_diff};

/// Representative angles of the text orientations found on a page.
///
/// Built by [`AngleClusters::cleanup`]; each cluster owns a half-open angle
/// band so every glyph maps to exactly one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleClusters {
    /// Ascending anchor angles.
    angles: Vec<f64>,
    /// Accumulated weight per anchor, parallel to `angles`.
    weights: Vec<f64>,
    threshold: f64,
}

impl AngleClusters {
    /// Greedy highest-weight-first merge of histogram buckets.
    ///
    /// A bucket closer than `ignore_angles_closer_than` to an existing anchor
    /// donates its weight to the nearest such anchor; the anchor itself does
    /// not move. Otherwise the bucket becomes a new anchor.
    pub fn cleanup(histogram: &AngleHistogram, ignore_angles_closer_than: f64) -> Self {
        let mut entries: Vec<(f64, f64)> = histogram.iter().collect();
        // Stable on the ascending input, so equal weights keep the lower angle first.
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut anchors: Vec<(f64, f64)> = Vec::new();
        for (angle, weight) in entries {
            let nearest = anchors
                .iter_mut()
                .map(|anchor| (angle_distance(anchor.0, angle), anchor))
                .filter(|(dist, _)| *dist < ignore_angles_closer_than)
                .min_by(|a, b| a.0.total_cmp(&b.0));
            match nearest {
                Some((_, anchor)) => anchor.1 += weight,
                None => anchors.push((angle, weight)),
            }
        }

        anchors.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            angles: anchors.iter().map(|a| a.0).collect(),
            weights: anchors.iter().map(|a| a.1).collect(),
            threshold: ignore_angles_closer_than,
        }
    }

    /// A single cluster at `angle`, used when a page has no angle signal.
    pub fn single(angle: f64, ignore_angles_closer_than: f64) -> Self {
        Self {
            angles: vec![norm_angle(angle)],
            weights: vec![0.0],
            threshold: ignore_angles_closer_than,
        }
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Band `[left, right)` of the cluster at `index`.
    ///
    /// Each side extends half way to the neighbouring anchor, or by the merge
    /// threshold when there is no neighbour on that side.
    pub fn limits_by_angle(&self, index: usize) -> Option<(f64, f64)> {
        let angle = *self.angles.get(index)?;
        let left = match index.checked_sub(1).and_then(|i| self.angles.get(i)) {
            Some(prev) => (prev + angle) / 2.0,
            None => angle - self.threshold,
        };
        let right = match self.angles.get(index + 1) {
            Some(next) => (angle + next) / 2.0,
            None => angle + self.threshold,
        };
        Some((left, right))
    }

    /// Index of the cluster whose band contains `angle`.
    ///
    /// Angles outside every band (across the ±180° seam, or further than the
    /// threshold from the outermost anchors) go to the nearest anchor.
    pub fn band_of(&self, angle: f64) -> Option<usize> {
        if self.angles.is_empty() {
            return None;
        }
        let angle = norm_angle(angle);
        for index in 0..self.angles.len() {
            let Some((left, right)) = self.limits_by_angle(index) else {
                continue;
            };
            let anchor = self.angles[index];
            // Compare relative to the anchor so bands reaching past ±180 still match.
            let offset = signed_angle_diff(angle, anchor);
            if offset >= left - anchor && offset < right - anchor {
                return Some(index);
            }
        }
        self.angles
            .iter()
            .enumerate()
            .min_by(|a, b| {
                angle_distance(*a.1, angle).total_cmp(&angle_distance(*b.1, angle))
            })
            .map(|(i, _)| i)
    }
}
