//! Measurement engine of geodraw.
//!
//! * [`units`]: length, area and angle units and conversions
//! * [`measure`]: label annotations for points, lines and polygons (`cal`)
//! * [`format`]: unit-aware label formats that plug into `cal`

pub mod format;
pub mod measure;
pub mod units;

pub use format::{LabelFormatter, Precisions};
pub use measure::{Annotation, AnnotationKind, MeasureInput, MeasureOptions, annotations_to_json, cal};
