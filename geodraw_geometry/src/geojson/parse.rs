use crate::{Coordinates, GeoCollection, GeoFeature, GeoProperties, GeoValue, Geometry};
use anyhow::{Context, Result, anyhow, bail, ensure};
use serde_json::{Map, Value};

pub fn parse_geojson(json: &str) -> Result<GeoCollection> {
	let value: Value = serde_json::from_str(json).context("invalid GeoJSON")?;
	parse_geojson_collection(&value)
}

/// Parses a `FeatureCollection`, or a single `Feature` wrapped into a collection.
pub fn parse_geojson_value(value: &Value) -> Result<GeoCollection> {
	let object = as_object(value, "GeoJSON")?;
	match get_type(object, "GeoJSON")? {
		"FeatureCollection" => parse_geojson_collection(value),
		"Feature" => Ok(GeoCollection::from(vec![parse_geojson_feature(value)?])),
		other => bail!("expected a Feature or FeatureCollection, but got '{other}'"),
	}
}

pub fn parse_geojson_collection(value: &Value) -> Result<GeoCollection> {
	let object = as_object(value, "FeatureCollection")?;
	check_type(object, "FeatureCollection")?;

	let features = object
		.get("features")
		.and_then(Value::as_array)
		.ok_or_else(|| anyhow!("FeatureCollection must have a 'features' array"))?
		.iter()
		.enumerate()
		.map(|(index, feature)| parse_geojson_feature(feature).with_context(|| format!("feature {index}")))
		.collect::<Result<Vec<_>>>()?;

	Ok(GeoCollection { features })
}

/// Parses a `Feature`. The identity is taken from `properties.id`, falling back to the
/// top-level `id` member.
pub fn parse_geojson_feature(value: &Value) -> Result<GeoFeature> {
	let object = as_object(value, "Feature")?;
	check_type(object, "Feature")?;

	let geometry = parse_geojson_geometry(
		object
			.get("geometry")
			.ok_or_else(|| anyhow!("feature is missing 'geometry'"))?,
	)?;

	let properties = match object.get("properties") {
		None | Some(Value::Null) => GeoProperties::new(),
		Some(Value::Object(map)) => GeoProperties::from(map),
		Some(_) => bail!("feature 'properties' must be an object"),
	};

	let id = properties
		.get("id")
		.or(object.get("id").map(GeoValue::from).as_ref())
		.and_then(id_to_string)
		.ok_or_else(|| anyhow!("feature is missing an id"))?;

	let mut feature = GeoFeature::new(id, geometry);
	feature.set_properties(properties);
	Ok(feature)
}

fn id_to_string(value: &GeoValue) -> Option<String> {
	match value {
		GeoValue::String(s) if !s.is_empty() => Some(s.clone()),
		GeoValue::Int(_) | GeoValue::UInt(_) => Some(value.to_string()),
		_ => None,
	}
}

pub fn parse_geojson_geometry(value: &Value) -> Result<Geometry> {
	let object = as_object(value, "geometry")?;
	let geometry_type = get_type(object, "geometry")?;

	if geometry_type == "GeometryCollection" {
		let geometries = object
			.get("geometries")
			.and_then(Value::as_array)
			.ok_or_else(|| anyhow!("GeometryCollection must have a 'geometries' array"))?;
		return Ok(Geometry::Collection(
			geometries.iter().map(parse_geojson_geometry).collect::<Result<Vec<_>>>()?,
		));
	}

	let coordinates = object
		.get("coordinates")
		.ok_or_else(|| anyhow!("geometry must have coordinates"))?;

	let geometry = match geometry_type {
		"Point" => Geometry::Point(parse_position(coordinates)?.into()),
		"LineString" => Geometry::new_line_string(parse_positions(coordinates)?),
		"Polygon" => Geometry::new_polygon(parse_nested(coordinates, parse_positions)?),
		"MultiPoint" => Geometry::new_multi_point(parse_positions(coordinates)?),
		"MultiLineString" => Geometry::new_multi_line_string(parse_nested(coordinates, parse_positions)?),
		"MultiPolygon" => Geometry::new_multi_polygon(parse_nested(coordinates, |rings| {
			parse_nested(rings, parse_positions)
		})?),
		_ => bail!("unknown geometry type '{geometry_type}'"),
	};

	Ok(geometry)
}

fn as_object<'a>(value: &'a Value, name: &str) -> Result<&'a Map<String, Value>> {
	value
		.as_object()
		.ok_or_else(|| anyhow!("{name} must be a JSON object"))
}

fn get_type<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
	object
		.get("type")
		.and_then(Value::as_str)
		.ok_or_else(|| anyhow!("{name} must have a type"))
}

fn check_type(object: &Map<String, Value>, name: &str) -> Result<()> {
	let object_type = get_type(object, name)?;
	ensure!(object_type == name, "type must be '{name}'");
	Ok(())
}

/// Reads `[x, y]`; additional ordinates such as altitude are dropped.
fn parse_position(value: &Value) -> Result<Coordinates> {
	let array = value
		.as_array()
		.ok_or_else(|| anyhow!("position must be an array"))?;
	ensure!(array.len() >= 2, "position must have at least two values");
	let mut numbers = array.iter().take(2).map(|v| {
		v.as_f64()
			.ok_or_else(|| anyhow!("position values must be numbers, but got {v}"))
	});
	let x = numbers.next().ok_or_else(|| anyhow!("missing x"))??;
	let y = numbers.next().ok_or_else(|| anyhow!("missing y"))??;
	Ok(Coordinates::new(x, y))
}

fn parse_positions(value: &Value) -> Result<Vec<Coordinates>> {
	parse_nested(value, parse_position)
}

fn parse_nested<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
	value
		.as_array()
		.ok_or_else(|| anyhow!("coordinates must be nested arrays"))?
		.iter()
		.map(parse)
		.collect()
}
