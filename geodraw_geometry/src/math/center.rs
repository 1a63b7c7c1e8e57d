use crate::Coordinates;
use geo::BoundingRect;

/// Center of the bounding box of the positions.
#[must_use]
pub fn positions_center(positions: &[Coordinates]) -> Option<Coordinates> {
	let line = geo::LineString::new(positions.iter().copied().map(geo::Coord::from).collect());
	line.bounding_rect().map(|rect| Coordinates::from(rect.center()))
}
