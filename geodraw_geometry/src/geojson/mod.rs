//! GeoJSON conversion for the crate's geometry types.
//!
//! Parsing goes through `serde_json::Value`, so any valid JSON text is accepted as long as
//! its structure matches the GeoJSON object model. Serialization lives on the types
//! themselves (`Geometry::to_json`, `GeoFeature::to_json`, `GeoCollection::to_json`).

mod parse;
mod read;

pub use parse::*;
pub use read::*;
