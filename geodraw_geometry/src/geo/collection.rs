use super::GeoFeature;
use crate::geojson::parse_geojson;
use anyhow::Result;
use serde_json::{Value, json};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoCollection {
	pub features: Vec<GeoFeature>,
}

impl GeoCollection {
	#[must_use]
	pub fn from(features: Vec<GeoFeature>) -> Self {
		Self { features }
	}

	pub fn from_json_str(json_str: &str) -> Result<Self> {
		parse_geojson(json_str)
	}

	#[must_use]
	pub fn to_json(&self) -> Value {
		json!({
			"type": "FeatureCollection",
			"features": self.features.iter().map(GeoFeature::to_json).collect::<Vec<_>>(),
		})
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.features.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.features.is_empty()
	}
}
