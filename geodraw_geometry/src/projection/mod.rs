//! Forward projections from `[lng, lat]` degrees into planar meters.
//!
//! Measurements are computed on projected coordinates. A [`Projector`] receives a whole ring at
//! a time, so implementations are free to choose projection parameters per ring, as
//! [`CenteredTransverseMercator`] does.

mod proj_string;
mod tmerc;

pub use tmerc::*;

use crate::Coordinates;
use std::fmt::Debug;

pub trait Projector: Debug {
	/// Projects all positions of one ring or line with a single set of parameters.
	fn project_ring(&self, ring: &[Coordinates]) -> Vec<Coordinates>;
}

/// Leaves coordinates untouched; useful for data that is already planar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Planar;

impl Projector for Planar {
	fn project_ring(&self, ring: &[Coordinates]) -> Vec<Coordinates> {
		ring.to_vec()
	}
}

/// Wraps a closure as a projector.
pub struct FnProjector<F>(pub F);

impl<F> Projector for FnProjector<F>
where
	F: Fn(&[Coordinates]) -> Vec<Coordinates>,
{
	fn project_ring(&self, ring: &[Coordinates]) -> Vec<Coordinates> {
		(self.0)(ring)
	}
}

impl<F> Debug for FnProjector<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("FnProjector")
	}
}
