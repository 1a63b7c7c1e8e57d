use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// A position as `[x, y]`: either `[lng, lat]` in degrees or a locally projected pair in meters.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates([f64; 2]);

impl Coordinates {
	#[must_use]
	pub fn new(x: f64, y: f64) -> Self {
		Self([x, y])
	}

	#[must_use]
	pub fn x(&self) -> f64 {
		self.0[0]
	}

	#[must_use]
	pub fn y(&self) -> f64 {
		self.0[1]
	}

	/// Euclidean distance to another position in the same frame.
	#[must_use]
	pub fn distance_to(&self, other: &Coordinates) -> f64 {
		(self.x() - other.x()).hypot(self.y() - other.y())
	}

	#[must_use]
	pub fn to_json(&self) -> Value {
		Value::from(vec![self.0[0], self.0[1]])
	}
}

impl<'a, T> From<&'a [T; 2]> for Coordinates
where
	T: Copy + Into<f64>,
{
	fn from(value: &'a [T; 2]) -> Self {
		Coordinates([value[0].into(), value[1].into()])
	}
}

impl From<[f64; 2]> for Coordinates {
	fn from(value: [f64; 2]) -> Self {
		Coordinates(value)
	}
}

impl From<geo::Coord> for Coordinates {
	fn from(value: geo::Coord) -> Self {
		Coordinates([value.x, value.y])
	}
}

impl From<Coordinates> for geo::Coord {
	fn from(value: Coordinates) -> Self {
		geo::Coord {
			x: value.x(),
			y: value.y(),
		}
	}
}

impl Debug for Coordinates {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_and_accessors() {
		let c = Coordinates::new(13.404954, 52.520008);
		assert_eq!(c.x(), 13.404954);
		assert_eq!(c.y(), 52.520008);
	}

	#[test]
	fn debug_formats_like_array() {
		let c = Coordinates::new(1.0, 2.0);
		assert_eq!(format!("{:?}", c), "[1.0, 2.0]");
	}

	#[test]
	fn distance_is_euclidean() {
		let a = Coordinates::new(0.0, 0.0);
		let b = Coordinates::new(3.0, 4.0);
		assert_eq!(a.distance_to(&b), 5.0);
		assert_eq!(b.distance_to(&a), 5.0);
	}

	#[test]
	fn to_json_is_pair() {
		let json = Coordinates::new(1.5, -2.25).to_json();
		assert_eq!(json, serde_json::json!([1.5, -2.25]));
	}

	#[test]
	fn serde_is_transparent() {
		let c: Coordinates = serde_json::from_str("[7.0, 8.5]").unwrap();
		assert_eq!(c, Coordinates::new(7.0, 8.5));
		assert_eq!(serde_json::to_string(&c).unwrap(), "[7.0,8.5]");
	}

	#[test]
	fn from_integer_array_ref() {
		assert_eq!(Coordinates::from(&[7, 8]), Coordinates::new(7.0, 8.0));
	}

	#[test]
	fn geo_coord_round_trip() {
		let gc = geo::Coord { x: 11.0, y: 22.0 };
		let c = Coordinates::from(gc);
		assert_eq!(geo::Coord::from(c), gc);
	}
}
