use crate::RingGeometry;
use geo::Winding;

/// Returns `true` when the ring runs clockwise in `[x, y]` space. Degenerate rings are
/// reported as counter-clockwise.
#[must_use]
pub fn is_clockwise(ring: &RingGeometry) -> bool {
	let mut line = geo::LineString::from(ring);
	line.close();
	line.is_cw()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_orientation() {
		let ccw = RingGeometry::from(&[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]);
		assert!(!is_clockwise(&ccw));

		let cw = RingGeometry::from(&[[0, 0], [0, 1], [1, 1], [1, 0], [0, 0]]);
		assert!(is_clockwise(&cw));
	}

	#[test]
	fn open_ring_is_closed_first() {
		let cw = RingGeometry::from(&[[0, 0], [0, 1], [1, 1]]);
		assert!(is_clockwise(&cw));
	}

	#[test]
	fn degenerate_ring() {
		let ring = RingGeometry::from(&[[0, 0], [1, 1]]);
		assert!(!is_clockwise(&ring));
	}
}
