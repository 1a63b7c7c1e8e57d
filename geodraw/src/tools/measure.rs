use super::{load_config, print_json};
use anyhow::{Context, Result};
use geodraw_geometry::{GeoFeature, parse_geojson_geometry, parse_geojson_value};
use geodraw_measure::{
	annotations_to_json, cal,
	units::{AreaSetting, LengthSetting},
};
use serde_json::Value;
use std::{fs, path::PathBuf};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// GeoJSON file: a FeatureCollection, a Feature or a bare geometry
	#[arg()]
	input_file: PathBuf,

	/// YAML config file; its `measure` section sets units, precisions and projection
	#[arg(long, short, value_name = "FILE")]
	config: Option<PathBuf>,

	/// length unit: M, KM or MKM (automatic)
	#[arg(long, value_name = "UNIT", display_order = 1)]
	length_unit: Option<LengthSetting>,

	/// area unit: M2, KM2, MU or M2KM2 (automatic)
	#[arg(long, value_name = "UNIT", display_order = 1)]
	area_unit: Option<AreaSetting>,

	/// pretty-print the output
	#[arg(long, short, display_order = 2)]
	pretty: bool,
}

/// Features of a GeoJSON document. A bare geometry becomes a feature with id `0`.
/// Every geometry must be well-formed, e.g. rings closed.
fn read_features(text: &str) -> Result<Vec<GeoFeature>> {
	let value: Value = serde_json::from_str(text).context("invalid GeoJSON")?;
	let features = match value.get("type").and_then(Value::as_str) {
		Some("FeatureCollection" | "Feature") => parse_geojson_value(&value)?.features,
		_ => vec![GeoFeature::new("0", parse_geojson_geometry(&value)?)],
	};
	for feature in &features {
		feature
			.geometry
			.verify()
			.with_context(|| format!("invalid geometry of feature '{}'", feature.id))?;
	}
	Ok(features)
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = load_config(arguments.config.as_deref())?.measure;
	if let Some(unit) = arguments.length_unit {
		config.length_unit = unit;
	}
	if let Some(unit) = arguments.area_unit {
		config.area_unit = unit;
	}

	let path = &arguments.input_file;
	let text = fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
	let features = read_features(&text).with_context(|| format!("failed to parse {path:?}"))?;

	let options = config.formatter().measure_options_with(config.projector()?);
	let annotations = cal(&features, &options)?
		.into_iter()
		.filter(|annotation| config.shows(annotation))
		.collect::<Vec<_>>();
	log::info!("measured {} features into {} labels", features.len(), annotations.len());

	print_json(&annotations_to_json(&annotations), arguments.pretty)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::run_command;
	use geodraw_geometry::Geometry;
	use pretty_assertions::assert_eq;

	#[test]
	fn measure_file() {
		run_command(vec!["geodraw", "measure", "../testdata/shapes.geojson"]).unwrap();
	}

	#[test]
	fn measure_with_config_and_units() {
		run_command(vec![
			"geodraw",
			"measure",
			"--config",
			"../testdata/editor.yml",
			"--length-unit",
			"M",
			"../testdata/shapes.geojson",
		])
		.unwrap();
	}

	#[test]
	fn missing_file() {
		let error = run_command(vec!["geodraw", "measure", "../testdata/missing.geojson"]).unwrap_err();
		assert!(error.to_string().starts_with("failed to read"));
	}

	#[test]
	fn read_bare_geometry() -> Result<()> {
		let features = read_features(r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#)?;
		assert_eq!(features.len(), 1);
		assert_eq!(features[0].id, "0");
		assert_eq!(features[0].geometry, Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 1.0]]));
		Ok(())
	}

	#[test]
	fn read_single_feature() -> Result<()> {
		let features =
			read_features(r#"{"type":"Feature","id":"x","geometry":{"type":"Point","coordinates":[1,2]},"properties":{}}"#)?;
		assert_eq!(features[0].id, "x");
		Ok(())
	}

	#[test]
	fn read_rejects_open_ring() {
		let error = read_features(
			r#"{"type":"Feature","id":"f","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1]]]},"properties":{}}"#,
		)
		.unwrap_err();
		assert_eq!(format!("{error:#}"), "invalid geometry of feature 'f': a ring must be closed");
	}

	#[test]
	fn read_invalid_json() {
		assert_eq!(read_features("{").unwrap_err().to_string(), "invalid GeoJSON");
	}
}
