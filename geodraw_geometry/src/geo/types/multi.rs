use super::{GeometryTrait, LineStringGeometry, PointGeometry, PolygonGeometry};
use anyhow::Result;
use serde_json::Value;

#[derive(Clone, PartialEq)]
pub struct MultiPointGeometry(pub Vec<PointGeometry>);

#[derive(Clone, PartialEq)]
pub struct MultiLineStringGeometry(pub Vec<LineStringGeometry>);

/// Polygons, each with an outer ring and optional holes.
#[derive(Clone, PartialEq)]
pub struct MultiPolygonGeometry(pub Vec<PolygonGeometry>);

fn verify_all<G: GeometryTrait>(parts: &[G]) -> Result<()> {
	parts.iter().try_for_each(GeometryTrait::verify)
}

fn coord_json_list<G: GeometryTrait>(parts: &[G]) -> Value {
	Value::from(parts.iter().map(GeometryTrait::to_coord_json).collect::<Vec<_>>())
}

impl GeometryTrait for MultiPointGeometry {
	fn verify(&self) -> Result<()> {
		verify_all(&self.0)
	}

	fn to_coord_json(&self) -> Value {
		coord_json_list(&self.0)
	}
}

impl GeometryTrait for MultiLineStringGeometry {
	fn verify(&self) -> Result<()> {
		verify_all(&self.0)
	}

	fn to_coord_json(&self) -> Value {
		coord_json_list(&self.0)
	}
}

impl GeometryTrait for MultiPolygonGeometry {
	fn verify(&self) -> Result<()> {
		verify_all(&self.0)
	}

	fn to_coord_json(&self) -> Value {
		coord_json_list(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn multi_polygon_verifies_every_member() {
		let valid = MultiPolygonGeometry::from(&[
			[[[0, 0], [1, 0], [1, 1], [0, 0]]],
			[[[5, 5], [6, 5], [6, 7], [5, 5]]],
		]);
		assert!(valid.verify().is_ok());

		let open = MultiPolygonGeometry::from(&[[[[0, 0], [1, 0], [1, 1], [0, 1]]]]);
		assert_eq!(open.verify().unwrap_err().to_string(), "a ring must be closed");
	}

	#[test]
	fn multi_line_string_json() {
		let lines = MultiLineStringGeometry::from(&[[[0, 0], [1, 1]], [[2, 2], [3, 3]]]);
		assert_eq!(lines.to_coord_json(), json!([[[0.0, 0.0], [1.0, 1.0]], [[2.0, 2.0], [3.0, 3.0]]]));
		assert_eq!(
			format!("{lines:?}"),
			"[[[0.0, 0.0], [1.0, 1.0]], [[2.0, 2.0], [3.0, 3.0]]]"
		);
	}

	#[test]
	fn multi_point_json() {
		let points = MultiPointGeometry::from(vec![[1.0, 2.0], [3.0, 4.0]]);
		assert_eq!(points.to_coord_json(), json!([[1.0, 2.0], [3.0, 4.0]]));
		assert!(points.verify().is_ok());
	}
}
