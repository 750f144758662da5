//! Options for whole-document processing.

use crate::deskew::{DEFAULT_MAX_DESKEW_ANGLE_ABS, DEFAULT_TAILS_SKIP_QUANTILE};
use crate::layout::{AssemblyOptions, BoxPolicy, NonPrintablePolicy, Separators};
use crate::unicode_norm::UnicodeNorm;

/// Limits and text handling for the content stream interpreter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractOptions {
    /// Nesting bound for Form XObjects (default: 10).
    pub max_recursion_depth: usize,
    /// Operators per page, nested forms included, before the page fails
    /// (default: 1,000,000).
    pub max_operators_per_page: usize,
    /// Report recoverable problems as warnings (default: true).
    pub collect_warnings: bool,
    /// Applied to each glyph's decoded text (default: none).
    pub unicode_norm: UnicodeNorm,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 10,
            max_operators_per_page: 1_000_000,
            collect_warnings: true,
            unicode_norm: UnicodeNorm::None,
        }
    }
}

/// Options for `process`.
///
/// All fields have defaults; under the `serde` feature missing fields in a
/// JSON config fall back to them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcessOptions {
    /// Use cap-height glyph boxes instead of descent-to-ascent boxes (default: false).
    pub enhanced_glyph_boxes: bool,
    /// Drop zero-area and control-char glyphs instead of keeping them with no box (default: false).
    pub remove_non_printable: bool,
    /// Rotate and deskew the stored pages and report boxes in the corrected frame (default: false).
    pub deskew: bool,
    /// Histogram angles closer than this, in degrees, merge into one cluster (default: 3.0).
    pub ignore_angles_closer_than: f64,
    /// Residual skews larger than this, in degrees, are not corrected (default: 6.0).
    pub max_deskew_angle_abs: f64,
    /// Order glyphs by position rather than content-stream order (default: true).
    pub sort_by_position: bool,
    /// Baseline gap, in line heights, that starts a new paragraph (default: 3.5).
    pub drop_threshold: f64,
    /// Share of distant angle mass ignored by the skew estimate (default: 0.05).
    pub angle_tails_skip_quantile: f64,
    pub separators: Separators,
    pub extract: ExtractOptions,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            enhanced_glyph_boxes: false,
            remove_non_printable: false,
            deskew: false,
            ignore_angles_closer_than: 3.0,
            max_deskew_angle_abs: DEFAULT_MAX_DESKEW_ANGLE_ABS,
            sort_by_position: true,
            drop_threshold: 3.5,
            angle_tails_skip_quantile: DEFAULT_TAILS_SKIP_QUANTILE,
            separators: Separators::default(),
            extract: ExtractOptions::default(),
        }
    }
}

impl ProcessOptions {
    pub fn box_policy(&self) -> BoxPolicy {
        BoxPolicy::from_enhanced(self.enhanced_glyph_boxes)
    }

    pub fn assembly(&self) -> AssemblyOptions {
        AssemblyOptions {
            sort_by_position: self.sort_by_position,
            drop_threshold: self.drop_threshold,
            non_printable: NonPrintablePolicy::from_remove(self.remove_non_printable),
            separators: self.separators.clone(),
            ..AssemblyOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ProcessOptions::default();
        assert!(!opts.enhanced_glyph_boxes);
        assert!(!opts.remove_non_printable);
        assert!(!opts.deskew);
        assert_eq!(opts.ignore_angles_closer_than, 3.0);
        assert_eq!(opts.max_deskew_angle_abs, 6.0);
        assert!(opts.sort_by_position);
        assert_eq!(opts.drop_threshold, 3.5);
        assert_eq!(opts.angle_tails_skip_quantile, 0.05);
        assert_eq!(opts.box_policy(), BoxPolicy::Advance);
        assert_eq!(opts.extract.max_recursion_depth, 10);
        assert_eq!(opts.extract.max_operators_per_page, 1_000_000);
        assert!(opts.extract.collect_warnings);
        assert_eq!(opts.extract.unicode_norm, UnicodeNorm::None);
    }

    #[test]
    fn assembly_follows_flags() {
        let opts = ProcessOptions {
            remove_non_printable: true,
            sort_by_position: false,
            drop_threshold: 2.0,
            ..ProcessOptions::default()
        };
        let assembly = opts.assembly();
        assert_eq!(assembly.non_printable, NonPrintablePolicy::Drop);
        assert!(!assembly.sort_by_position);
        assert_eq!(assembly.drop_threshold, 2.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_config_uses_defaults() {
        let opts: ProcessOptions =
            serde_json::from_str(r#"{"deskew": true, "extract": {"max_recursion_depth": 4}}"#)
                .unwrap();
        assert!(opts.deskew);
        assert_eq!(opts.extract.max_recursion_depth, 4);
        assert_eq!(opts.extract.max_operators_per_page, 1_000_000);
        assert_eq!(opts.drop_threshold, 3.5);
    }
}
