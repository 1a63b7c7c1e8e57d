use super::{Coordinates, GeometryTrait};
use anyhow::{Result, ensure};
use serde_json::Value;

/// A ring bounding a polygon or a hole. Complete rings repeat their first position at the end;
/// rings of a polygon still being drawn may be open.
#[derive(Clone, PartialEq)]
pub struct RingGeometry(pub Vec<Coordinates>);

impl RingGeometry {
	#[must_use]
	pub fn is_closed(&self) -> bool {
		self.0.len() > 1 && self.0.first() == self.0.last()
	}

	/// Appends the first position unless the ring is closed already.
	pub fn close(&mut self) {
		if self.is_closed() {
			return;
		}
		if let Some(first) = self.0.first().copied() {
			self.0.push(first);
		}
	}

	/// The distinct positions, without the closing one.
	#[must_use]
	pub fn open_vertices(&self) -> &[Coordinates] {
		if self.is_closed() {
			&self.0[..self.0.len() - 1]
		} else {
			&self.0
		}
	}
}

impl GeometryTrait for RingGeometry {
	fn verify(&self) -> Result<()> {
		ensure!(self.0.len() >= 4, "a ring needs at least 4 positions");
		ensure!(self.is_closed(), "a ring must be closed");
		Ok(())
	}

	fn to_coord_json(&self) -> Value {
		Value::from(self.0.iter().map(Coordinates::to_json).collect::<Vec<_>>())
	}
}

impl From<&RingGeometry> for geo::LineString<f64> {
	fn from(ring: &RingGeometry) -> Self {
		geo::LineString::new(ring.0.iter().copied().map(geo::Coord::from).collect())
	}
}
