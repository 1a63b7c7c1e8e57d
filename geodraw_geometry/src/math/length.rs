use crate::{Coordinates, Geometry, projection::Projector};

/// Euclidean length of a polyline in its own units.
#[must_use]
pub fn planar_length(positions: &[Coordinates]) -> f64 {
	positions.windows(2).map(|pair| pair[0].distance_to(&pair[1])).sum()
}

/// Projects the positions as one ring and measures their length.
#[must_use]
pub fn projected_length(positions: &[Coordinates], projector: &dyn Projector) -> f64 {
	planar_length(&projector.project_ring(positions))
}

/// Length of any geometry in projected meters. Points have no length, polygon rings count as
/// lines, and collections sum their members.
#[must_use]
pub fn geometry_length(geometry: &Geometry, projector: &dyn Projector) -> f64 {
	match geometry {
		Geometry::Point(_) | Geometry::MultiPoint(_) => 0.0,
		Geometry::LineString(g) => projected_length(&g.0, projector),
		Geometry::MultiLineString(g) => g.0.iter().map(|line| projected_length(&line.0, projector)).sum(),
		Geometry::Polygon(g) => g.0.iter().map(|ring| projected_length(&ring.0, projector)).sum(),
		Geometry::MultiPolygon(g) => g
			.0
			.iter()
			.flat_map(|polygon| polygon.0.iter())
			.map(|ring| projected_length(&ring.0, projector))
			.sum(),
		Geometry::Collection(list) => list.iter().map(|g| geometry_length(g, projector)).sum(),
	}
}
