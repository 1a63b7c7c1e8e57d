//! Geometry foundation of geodraw: coordinates and geometry types, identified features,
//! GeoJSON conversion, planar length/area math and forward projections.

mod geo;
pub mod geojson;
pub mod math;
pub mod projection;

pub use geo::*;
pub use geojson::*;
