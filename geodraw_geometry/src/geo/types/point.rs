use super::{Coordinates, GeometryTrait};
use anyhow::Result;
use serde_json::Value;
use std::fmt::Debug;

/// A single position, e.g. a drawn marker or a label anchor.
#[derive(Clone, Copy, PartialEq)]
pub struct PointGeometry(pub Coordinates);

impl PointGeometry {
	#[must_use]
	pub fn as_coord(&self) -> &Coordinates {
		&self.0
	}
}

impl GeometryTrait for PointGeometry {
	fn verify(&self) -> Result<()> {
		Ok(())
	}

	fn to_coord_json(&self) -> Value {
		self.0.to_json()
	}
}

impl Debug for PointGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

impl<T> From<T> for PointGeometry
where
	Coordinates: From<T>,
{
	fn from(value: T) -> Self {
		Self(Coordinates::from(value))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_wraps_one_position() {
		let point = PointGeometry::from(&[1, 2]);
		assert_eq!(point.as_coord(), &Coordinates::new(1.0, 2.0));
		assert_eq!(format!("{point:?}"), "[1.0, 2.0]");
		assert_eq!(point.to_coord_json(), serde_json::json!([1.0, 2.0]));
		assert!(point.verify().is_ok());
	}
}
