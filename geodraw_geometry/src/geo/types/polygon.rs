use super::{GeometryTrait, RingGeometry};
use anyhow::{Result, ensure};
use serde_json::Value;

/// The outer ring first, followed by any number of holes.
#[derive(Clone, PartialEq)]
pub struct PolygonGeometry(pub Vec<RingGeometry>);

impl PolygonGeometry {
	#[must_use]
	pub fn outer(&self) -> Option<&RingGeometry> {
		self.0.first()
	}

	pub fn outer_mut(&mut self) -> Option<&mut RingGeometry> {
		self.0.first_mut()
	}
}

impl GeometryTrait for PolygonGeometry {
	fn verify(&self) -> Result<()> {
		ensure!(!self.0.is_empty(), "a polygon needs an outer ring");
		self.0.iter().try_for_each(RingGeometry::verify)
	}

	fn to_coord_json(&self) -> Value {
		Value::from(self.0.iter().map(RingGeometry::to_coord_json).collect::<Vec<_>>())
	}
}
