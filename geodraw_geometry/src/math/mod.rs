//! Planar measurement on projected coordinates.
//!
//! The `planar_*` functions work on coordinates that are already in meters. The geometry-level
//! functions first run every ring through a [`crate::projection::Projector`].

mod area;
mod center;
mod length;
mod winding;

pub use area::*;
pub use center::*;
pub use length::*;
pub use winding::*;
