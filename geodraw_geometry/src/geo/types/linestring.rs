use super::{Coordinates, GeometryTrait};
use anyhow::{Result, ensure};
use serde_json::Value;

/// An open path of positions.
#[derive(Clone, PartialEq)]
pub struct LineStringGeometry(pub Vec<Coordinates>);

impl GeometryTrait for LineStringGeometry {
	fn verify(&self) -> Result<()> {
		ensure!(self.0.len() >= 2, "a line needs at least 2 positions");
		Ok(())
	}

	fn to_coord_json(&self) -> Value {
		Value::from(self.0.iter().map(Coordinates::to_json).collect::<Vec<_>>())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(vec![[0.0, 0.0]], false)]
	#[case(vec![[0.0, 0.0], [1.0, 1.0]], true)]
	#[case(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]], true)]
	fn verify_counts_positions(#[case] positions: Vec<[f64; 2]>, #[case] valid: bool) {
		assert_eq!(LineStringGeometry::from(positions).verify().is_ok(), valid);
	}

	#[test]
	fn to_coord_json() {
		let line = LineStringGeometry::from(&[[1, 2], [3, 4]]);
		assert_eq!(line.to_coord_json(), serde_json::json!([[1.0, 2.0], [3.0, 4.0]]));
		assert_eq!(format!("{line:?}"), "[[1.0, 2.0], [3.0, 4.0]]");
	}
}
