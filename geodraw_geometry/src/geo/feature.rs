use super::*;
use serde_json::{Value, json};

/// A geometry with a stable string identity and free-form properties.
///
/// The id is mirrored into `properties.id`, since render engines only expose
/// properties when a rendered feature is picked.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
	pub id: String,
	pub geometry: Geometry,
	pub properties: GeoProperties,
}

impl GeoFeature {
	pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
		let id = id.into();
		let mut properties = GeoProperties::new();
		properties.insert("id", id.as_str());
		Self {
			id,
			geometry,
			properties,
		}
	}

	/// Replaces all properties, keeping `properties.id` in sync with the id.
	pub fn set_properties(&mut self, properties: GeoProperties) {
		self.properties = properties;
		self.properties.insert("id", self.id.as_str());
	}

	pub fn set_property<T>(&mut self, key: &str, value: T)
	where
		GeoValue: From<T>,
	{
		self.properties.insert(key, value);
	}

	#[must_use]
	pub fn with_property<T>(mut self, key: &str, value: T) -> Self
	where
		GeoValue: From<T>,
	{
		self.set_property(key, value);
		self
	}

	#[must_use]
	pub fn to_json(&self) -> Value {
		json!({
			"type": "Feature",
			"id": self.id,
			"geometry": self.geometry.to_json(),
			"properties": self.properties.to_json(),
		})
	}

	#[cfg(test)]
	pub fn new_example() -> Self {
		GeoFeature::new("13", Geometry::new_example())
			.with_property("name", "Nice")
			.with_property("population", 348_085u32)
			.with_property("is_nice", true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn id_is_mirrored() {
		let feature = GeoFeature::new("a1", Geometry::new_point([0.0, 0.0]));
		assert_eq!(feature.properties.get("id"), Some(&GeoValue::from("a1")));
	}

	#[test]
	fn set_properties_keeps_id() {
		let mut feature = GeoFeature::new("a1", Geometry::new_point([0.0, 0.0]));
		feature.set_properties(GeoProperties::from(vec![("name", GeoValue::from("x"))]));
		assert_eq!(feature.properties.get("id"), Some(&GeoValue::from("a1")));
		assert_eq!(feature.properties.get("name"), Some(&GeoValue::from("x")));
	}

	#[test]
	fn to_json() {
		let feature = GeoFeature::new("p", Geometry::new_point([1.0, 2.0])).with_property("n", 1u32);
		assert_eq!(
			feature.to_json(),
			json!({
				"type": "Feature",
				"id": "p",
				"geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
				"properties": {"id": "p", "n": 1}
			})
		);
	}

	#[test]
	fn example_has_properties() {
		let feature = GeoFeature::new_example();
		assert_eq!(feature.properties.len(), 4);
	}
}
