//! pdfcoords-core: Backend-independent data types and algorithms.
//!
//! This crate provides the geometry types (Point, Ctm, BBox), the glyph-angle
//! histogram and clustering, the weighted deskew decision, positioned text
//! assembly, the document output records and table-of-contents resolution
//! used by pdfcoords. It does not read PDF files itself.

pub mod angle;
pub mod cluster;
pub mod deskew;
pub mod document;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod options;
pub mod toc;
pub mod unicode_norm;
pub mod weighted;

pub use angle::{AngleHistogram, angle_distance, glyph_angle, norm_angle, signed_angle_diff};
pub use cluster::AngleClusters;
pub use deskew::{DeskewDecision, histogram_stats, select_deskew_angle};
pub use document::{CharBox, Document, PageRecord, TocEntry};
pub use error::{ExtractResult, ExtractWarning, ExtractWarningCode, PdfError};
pub use geometry::{BBox, Ctm, PdfRect, Point};
pub use layout::{
    AssemblyOptions, BoxPolicy, GlyphMetrics, NonPrintablePolicy, PageText, PositionedGlyph,
    Separators, round2,
};
pub use options::{ExtractOptions, ProcessOptions};
pub use toc::{
    Destination, DestinationView, NamedDestinations, OutlineItem, OutlineTarget,
    resolve_table_of_contents,
};
pub use unicode_norm::UnicodeNorm;
pub use weighted::{AngleStats, WeightedAngle, deviation_ok, weighted_average};
