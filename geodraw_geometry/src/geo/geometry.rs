use super::*;
use anyhow::Result;
use serde_json::{Value, json};
use std::fmt::Debug;

/// Closed sum type over every geometry kind a feature can carry.
#[derive(Clone, PartialEq)]
pub enum Geometry {
	Point(PointGeometry),
	LineString(LineStringGeometry),
	Polygon(PolygonGeometry),
	MultiPoint(MultiPointGeometry),
	MultiLineString(MultiLineStringGeometry),
	MultiPolygon(MultiPolygonGeometry),
	Collection(Vec<Geometry>),
}

impl Geometry {
	pub fn new_point<T>(value: T) -> Self
	where
		Coordinates: From<T>,
	{
		Self::Point(PointGeometry::from(value))
	}
	pub fn new_line_string<T>(value: Vec<T>) -> Self
	where
		Coordinates: From<T>,
	{
		Self::LineString(LineStringGeometry::from(value))
	}
	pub fn new_polygon<T>(value: Vec<Vec<T>>) -> Self
	where
		Coordinates: From<T>,
	{
		Self::Polygon(PolygonGeometry::from(value))
	}
	pub fn new_multi_point<T>(value: Vec<T>) -> Self
	where
		Coordinates: From<T>,
	{
		Self::MultiPoint(MultiPointGeometry::from(value))
	}
	pub fn new_multi_line_string<T>(value: Vec<Vec<T>>) -> Self
	where
		Coordinates: From<T>,
	{
		Self::MultiLineString(MultiLineStringGeometry::from(value))
	}
	pub fn new_multi_polygon<T>(value: Vec<Vec<Vec<T>>>) -> Self
	where
		Coordinates: From<T>,
	{
		Self::MultiPolygon(MultiPolygonGeometry::from(value))
	}

	/// The GeoJSON `type` name of this geometry.
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Geometry::Point(_) => "Point",
			Geometry::LineString(_) => "LineString",
			Geometry::Polygon(_) => "Polygon",
			Geometry::MultiPoint(_) => "MultiPoint",
			Geometry::MultiLineString(_) => "MultiLineString",
			Geometry::MultiPolygon(_) => "MultiPolygon",
			Geometry::Collection(_) => "GeometryCollection",
		}
	}

	/// See [`GeometryTrait::verify`]. Collections verify every member.
	pub fn verify(&self) -> Result<()> {
		match self {
			Geometry::Point(g) => g.verify(),
			Geometry::LineString(g) => g.verify(),
			Geometry::Polygon(g) => g.verify(),
			Geometry::MultiPoint(g) => g.verify(),
			Geometry::MultiLineString(g) => g.verify(),
			Geometry::MultiPolygon(g) => g.verify(),
			Geometry::Collection(list) => list.iter().try_for_each(Geometry::verify),
		}
	}

	/// Serializes into a GeoJSON geometry object.
	#[must_use]
	pub fn to_json(&self) -> Value {
		let coordinates = match self {
			Geometry::Point(g) => g.to_coord_json(),
			Geometry::LineString(g) => g.to_coord_json(),
			Geometry::Polygon(g) => g.to_coord_json(),
			Geometry::MultiPoint(g) => g.to_coord_json(),
			Geometry::MultiLineString(g) => g.to_coord_json(),
			Geometry::MultiPolygon(g) => g.to_coord_json(),
			Geometry::Collection(list) => {
				return json!({
					"type": "GeometryCollection",
					"geometries": list.iter().map(Geometry::to_json).collect::<Vec<_>>(),
				});
			}
		};
		json!({ "type": self.type_name(), "coordinates": coordinates })
	}

	#[cfg(test)]
	pub fn new_example() -> Self {
		Self::new_multi_polygon(vec![
			vec![
				vec![[0.0, 0.0], [5.0, 0.0], [2.5, 4.0], [0.0, 0.0]],
				vec![[2.0, 1.0], [2.5, 2.0], [3.0, 1.0], [2.0, 1.0]],
			],
			vec![
				vec![[6.0, 0.0], [9.0, 0.0], [9.0, 4.0], [6.0, 4.0], [6.0, 0.0]],
				vec![[7.0, 1.0], [7.0, 3.0], [8.0, 3.0], [8.0, 1.0], [7.0, 1.0]],
			],
		])
	}
}

impl Debug for Geometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner: &dyn Debug = match self {
			Geometry::Point(g) => g,
			Geometry::LineString(g) => g,
			Geometry::Polygon(g) => g,
			Geometry::MultiPoint(g) => g,
			Geometry::MultiLineString(g) => g,
			Geometry::MultiPolygon(g) => g,
			Geometry::Collection(g) => g,
		};
		f.debug_tuple(self.type_name()).field(inner).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn type_names() {
		assert_eq!(Geometry::new_point([1.0, 2.0]).type_name(), "Point");
		assert_eq!(Geometry::Collection(vec![]).type_name(), "GeometryCollection");
		assert_eq!(Geometry::new_example().type_name(), "MultiPolygon");
	}


	#[test]
	fn to_json() {
		let line = Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 0.5]]);
		assert_eq!(
			line.to_json(),
			json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 0.5]]})
		);
		let collection = Geometry::Collection(vec![Geometry::new_point([3.0, 4.0])]);
		assert_eq!(
			collection.to_json(),
			json!({"type": "GeometryCollection", "geometries": [{"type": "Point", "coordinates": [3.0, 4.0]}]})
		);
	}

	#[test]
	fn debug() {
		assert_eq!(
			format!("{:?}", Geometry::new_point([1.0, 2.0])),
			"Point([1.0, 2.0])"
		);
	}

	#[test]
	fn verify_descends_into_collections() {
		assert!(Geometry::new_example().verify().is_ok());
		let collection = Geometry::Collection(vec![
			Geometry::new_point([-1.0, 2.0]),
			Geometry::new_line_string(vec![[3.0, -4.0]]),
		]);
		assert_eq!(collection.verify().unwrap_err().to_string(), "a line needs at least 2 positions");
	}
}
