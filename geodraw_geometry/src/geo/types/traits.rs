use anyhow::Result;
use serde_json::Value;

pub trait GeometryTrait {
	/// Checks that a finished geometry is well-formed: enough positions and closed rings.
	/// Drawing sessions store unfinished geometries, so the store never calls this.
	fn verify(&self) -> Result<()>;

	/// The GeoJSON `coordinates` member.
	fn to_coord_json(&self) -> Value;
}
