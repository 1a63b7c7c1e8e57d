use anyhow::{Context, Result};
use geodraw_geometry::projection::{CenteredTransverseMercator, Projector, TransverseMercator};
use geodraw_measure::{
	Annotation, AnnotationKind, LabelFormatter, Precisions,
	units::{AreaSetting, LengthSetting},
};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
	rc::Rc,
	time::Duration,
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
	/// Drawing behaviour
	#[serde(default)]
	pub draw: DrawConfig,

	/// Measurement labels
	#[serde(default)]
	pub measure: MeasureConfig,
}

impl EditorConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open config file {path:?}"))?;
		EditorConfig::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse config file {path:?}"))
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DrawConfig {
	/// Stop drawing after the first finished feature.
	pub once: bool,

	/// Delay of the polygon edge overlay, in milliseconds.
	pub preview_debounce_ms: u64,

	/// Color of the drawn features.
	pub color: String,
}

impl Default for DrawConfig {
	fn default() -> Self {
		Self {
			once: false,
			preview_debounce_ms: 50,
			color: String::from("#fbb03b"),
		}
	}
}

impl DrawConfig {
	pub fn preview_debounce(&self) -> Duration {
		Duration::from_millis(self.preview_debounce_ms)
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MeasureConfig {
	/// `M`, `KM` or `MKM` (automatic)
	pub length_unit: LengthSetting,

	/// `M2`, `KM2`, `MU` or `M2KM2` (automatic)
	pub area_unit: AreaSetting,

	/// Decimals per unit
	pub precisions: Precisions,

	/// Optional `+proj=tmerc ...` string used instead of the per-ring transverse Mercator.
	pub projection: Option<String>,

	pub show_line_segments: bool,
	/// Cumulative length labels on polygon rings.
	pub show_polygon_lines: bool,
	pub show_polygon_line_segments: bool,
	pub show_polygon_direction: bool,
}

impl Default for MeasureConfig {
	fn default() -> Self {
		Self {
			length_unit: LengthSetting::Auto,
			area_unit: AreaSetting::Auto,
			precisions: Precisions::default(),
			projection: None,
			show_line_segments: true,
			show_polygon_lines: true,
			show_polygon_line_segments: true,
			show_polygon_direction: false,
		}
	}
}

impl MeasureConfig {
	pub fn formatter(&self) -> LabelFormatter {
		LabelFormatter {
			length_unit: self.length_unit,
			area_unit: self.area_unit,
			precisions: self.precisions,
		}
	}

	pub fn projector(&self) -> Result<Rc<dyn Projector>> {
		Ok(match &self.projection {
			Some(proj) => Rc::new(
				proj
					.parse::<TransverseMercator>()
					.with_context(|| format!("invalid projection '{proj}'"))?,
			),
			None => Rc::new(CenteredTransverseMercator),
		})
	}

	/// Whether the label layers show `annotation` with the current toggles.
	pub fn shows(&self, annotation: &Annotation) -> bool {
		match (annotation.kind, annotation.center) {
			(AnnotationKind::Line, true) => self.show_line_segments,
			(AnnotationKind::PolygonLine, false) => self.show_polygon_lines,
			(AnnotationKind::PolygonLine, true) => self.show_polygon_line_segments,
			_ => true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use geodraw_geometry::Geometry;
	use geodraw_measure::{MeasureOptions, cal};
	use pretty_assertions::assert_eq;
	use std::io::Write;

	#[test]
	fn parse_example_config() {
		let path = Path::new("../testdata/editor.yml");
		let cfg = EditorConfig::from_path(path).unwrap();

		assert_eq!(
			cfg,
			EditorConfig {
				draw: DrawConfig {
					once: true,
					preview_debounce_ms: 80,
					color: String::from("#3887be"),
				},
				measure: MeasureConfig {
					length_unit: LengthSetting::Kilometer,
					area_unit: AreaSetting::Mu,
					precisions: Precisions {
						kilometer: 3,
						mu: 1,
						..Precisions::default()
					},
					projection: Some(String::from("+proj=tmerc +lon_0=120 +ellps=GRS80 +units=m")),
					show_line_segments: false,
					show_polygon_lines: true,
					show_polygon_line_segments: false,
					show_polygon_direction: true,
				},
			}
		);
	}

	#[test]
	fn parse_empty_config() {
		assert_eq!(EditorConfig::from_string("").unwrap(), EditorConfig::default());
	}

	#[test]
	fn parse_partial_config() {
		let cfg = EditorConfig::from_string("draw:\n  once: true\n").unwrap();
		assert!(cfg.draw.once);
		assert_eq!(cfg.draw.preview_debounce(), Duration::from_millis(50));
		assert_eq!(cfg.measure, MeasureConfig::default());
	}

	#[test]
	fn parse_invalid_config() {
		assert!(EditorConfig::from_string("draw:\n  onse: true").is_err());
		assert!(EditorConfig::from_string("measure:\n  length_unit: FT").is_err());
	}

	#[test]
	fn shows_labels_per_toggle() {
		let line = Geometry::new_line_string(vec![[0.0, 0.0], [0.0, 0.001]]);
		let square = Geometry::new_polygon(vec![vec![
			[0.0, 0.0],
			[0.001, 0.0],
			[0.001, 0.001],
			[0.0, 0.001],
			[0.0, 0.0],
		]]);
		let mut annotations = cal(&line, &MeasureOptions::default()).unwrap();
		annotations.extend(cal(&square, &MeasureOptions::default()).unwrap());

		let config = MeasureConfig {
			show_line_segments: false,
			show_polygon_lines: false,
			..MeasureConfig::default()
		};
		let shown = annotations
			.iter()
			.filter(|a| config.shows(a))
			.map(|a| (a.kind, a.center))
			.collect::<Vec<_>>();
		assert_eq!(
			shown,
			vec![
				(AnnotationKind::Line, false),
				(AnnotationKind::Line, false),
				(AnnotationKind::PolygonLine, true),
				(AnnotationKind::PolygonLine, true),
				(AnnotationKind::PolygonLine, true),
				(AnnotationKind::PolygonLine, true),
				(AnnotationKind::Polygon, false),
			]
		);
	}

	#[test]
	fn from_path_reads_a_file() -> Result<()> {
		let mut file = tempfile::NamedTempFile::new()?;
		writeln!(file, "measure:\n  area_unit: KM2")?;
		let cfg = EditorConfig::from_path(file.path())?;
		assert_eq!(cfg.measure.area_unit, AreaSetting::SquareKilometer);
		Ok(())
	}

	#[test]
	fn missing_file_names_the_path() {
		let error = EditorConfig::from_path(Path::new("/does/not/exist.yml")).unwrap_err();
		assert_eq!(error.to_string(), "failed to open config file \"/does/not/exist.yml\"");
	}

	#[test]
	fn projector_from_config() {
		let mut cfg = MeasureConfig::default();
		assert!(format!("{:?}", cfg.projector().unwrap()).contains("CenteredTransverseMercator"));
		cfg.projection = Some(String::from("+proj=merc"));
		assert_eq!(
			format!("{:#}", cfg.projector().unwrap_err()),
			"invalid projection '+proj=merc': unsupported projection 'merc'"
		);
	}
}
