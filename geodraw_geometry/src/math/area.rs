use crate::{Coordinates, Geometry, PolygonGeometry, projection::Projector};

/// Absolute shoelace area of a ring. The ring may be open or closed; fewer than three
/// positions enclose nothing.
#[must_use]
pub fn planar_area(ring: &[Coordinates]) -> f64 {
	if ring.len() < 3 {
		return 0.0;
	}
	let sum: f64 = ring
		.iter()
		.zip(ring.iter().cycle().skip(1))
		.map(|(current, next)| current.x() * next.y() - current.y() * next.x())
		.sum();
	(0.5 * sum).abs()
}

/// Area of a polygon in projected square meters: the outer ring minus every hole.
#[must_use]
pub fn polygon_area(polygon: &PolygonGeometry, projector: &dyn Projector) -> f64 {
	let mut rings = polygon.0.iter().map(|ring| planar_area(&projector.project_ring(&ring.0)));
	let outer = rings.next().unwrap_or(0.0);
	rings.fold(outer, |area, hole| area - hole)
}

/// Area of any geometry. Only polygons enclose area; collections sum their members.
#[must_use]
pub fn geometry_area(geometry: &Geometry, projector: &dyn Projector) -> f64 {
	match geometry {
		Geometry::Point(_) | Geometry::MultiPoint(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => 0.0,
		Geometry::Polygon(g) => polygon_area(g, projector),
		Geometry::MultiPolygon(g) => g.0.iter().map(|polygon| polygon_area(polygon, projector)).sum(),
		Geometry::Collection(list) => list.iter().map(|g| geometry_area(g, projector)).sum(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::projection::{CenteredTransverseMercator, Planar};
	use approx::assert_relative_eq;
	use rstest::rstest;

	fn coords(list: &[[f64; 2]]) -> Vec<Coordinates> {
		list.iter().copied().map(Coordinates::from).collect()
	}

	#[rstest]
	#[case(&[[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0], [0.0, 0.0]], 12.0)]
	#[case(&[[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0]], 12.0)]
	#[case(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]], 2.0)]
	#[case(&[[0.0, 0.0], [2.0, 0.0]], 0.0)]
	fn shoelace(#[case] ring: &[[f64; 2]], #[case] expected: f64) {
		assert_relative_eq!(planar_area(&coords(ring)), expected);
	}

	#[test]
	fn invariant_under_rotation_and_reversal() {
		let ring = coords(&[[1.0, 1.0], [6.0, 2.0], [7.0, 5.0], [3.0, 8.0], [0.0, 4.0]]);
		let expected = planar_area(&ring);
		for shift in 0..ring.len() {
			let mut rotated = ring.clone();
			rotated.rotate_left(shift);
			assert_relative_eq!(planar_area(&rotated), expected, epsilon = 1e-9);
			rotated.reverse();
			assert_relative_eq!(planar_area(&rotated), expected, epsilon = 1e-9);
		}
	}

	#[test]
	fn holes_subtract() {
		let polygon = PolygonGeometry::from(vec![
			vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
			vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0], [2.0, 2.0]],
		]);
		assert_relative_eq!(polygon_area(&polygon, &Planar), 96.0);
	}

	#[test]
	fn non_areal_geometries() {
		let line = Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 1.0]]);
		assert_eq!(geometry_area(&line, &Planar), 0.0);
		let collection = Geometry::Collection(vec![
			line,
			Geometry::new_polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]),
		]);
		assert_relative_eq!(geometry_area(&collection, &Planar), 1.0);
	}

	#[test]
	fn geodetic_area_of_small_square() {
		// roughly 0.01° × 0.01° at the equator
		let square = Geometry::new_polygon(vec![vec![[0.0, 0.0], [0.01, 0.0], [0.01, 0.01], [0.0, 0.01], [0.0, 0.0]]]);
		assert_relative_eq!(
			geometry_area(&square, &CenteredTransverseMercator),
			1113.2 * 1105.74,
			max_relative = 1e-3
		);
	}
}
