//! Derives label annotations from geometries.
//!
//! `cal` walks a geometry and emits one point annotation per vertex, per segment midpoint and
//! per polygon center. Annotations are plain data; they are recomputed wholesale whenever the
//! measured features change.

use anyhow::{Result, bail};
use geodraw_geometry::{
	Coordinates, GeoFeature, Geometry, PolygonGeometry,
	math::{planar_length, polygon_area, positions_center},
	projection::{CenteredTransverseMercator, Projector},
};
use serde_json::{Value, json};
use std::{fmt::Debug, rc::Rc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationKind {
	Point,
	Line,
	/// Length label on a polygon ring.
	PolygonLine,
	Polygon,
}

impl AnnotationKind {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			AnnotationKind::Point => "point",
			AnnotationKind::Line => "line",
			AnnotationKind::PolygonLine => "polygon-line",
			AnnotationKind::Polygon => "polygon",
		}
	}
}

/// One rendered measurement label.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
	pub position: Coordinates,
	pub value: String,
	pub kind: AnnotationKind,
	/// Set for segment labels placed at the midpoint of a segment.
	pub center: bool,
	/// Id of the measured feature, when the input was a feature list.
	pub parent_id: Option<String>,
}

impl Annotation {
	fn new(position: Coordinates, value: String, kind: AnnotationKind) -> Self {
		Self {
			position,
			value,
			kind,
			center: false,
			parent_id: None,
		}
	}

	/// Converts into a GeoJSON point feature with `value`, `type`, optional `center` and the
	/// parent `id` as properties.
	#[must_use]
	pub fn to_json(&self) -> Value {
		let mut properties = json!({
			"value": self.value,
			"type": self.kind.as_str(),
		});
		if self.center {
			properties["center"] = Value::Bool(true);
		}
		if let Some(id) = &self.parent_id {
			properties["id"] = Value::from(id.as_str());
		}
		json!({
			"type": "Feature",
			"geometry": { "type": "Point", "coordinates": self.position.to_json() },
			"properties": properties,
		})
	}
}

/// Converts a list of annotations into a GeoJSON `FeatureCollection`.
#[must_use]
pub fn annotations_to_json(annotations: &[Annotation]) -> Value {
	json!({
		"type": "FeatureCollection",
		"features": annotations.iter().map(Annotation::to_json).collect::<Vec<_>>(),
	})
}

/// Position of a label inside a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthContext {
	/// Index of the vertex the label belongs to. Segment labels use the index of the segment's end.
	pub index: usize,
	/// `true` for the cumulative label at the last vertex.
	pub last: bool,
	/// `true` for segment labels, `false` for cumulative vertex labels.
	pub segment: bool,
}

pub type PointFormat = Rc<dyn Fn(&Coordinates) -> String>;
pub type LengthFormat = Rc<dyn Fn(f64, LengthContext) -> String>;
pub type AreaFormat = Rc<dyn Fn(f64) -> String>;

#[derive(Clone, Default)]
pub struct PointOptions {
	pub format: Option<PointFormat>,
}

#[derive(Clone)]
pub struct LineOptions {
	/// Receives the length in meters.
	pub format: Option<LengthFormat>,
	/// Emit the zero-length label at the first vertex.
	pub with_start: bool,
}

impl Default for LineOptions {
	fn default() -> Self {
		Self {
			format: None,
			with_start: true,
		}
	}
}

#[derive(Clone)]
pub struct PolygonOptions {
	/// Receives the area in square meters.
	pub format: Option<AreaFormat>,
	/// Label the rings like lines.
	pub with_line_string: bool,
	/// Options for the ring labels.
	pub line: LineOptions,
}

impl Default for PolygonOptions {
	fn default() -> Self {
		Self {
			format: None,
			with_line_string: true,
			line: LineOptions::default(),
		}
	}
}

#[derive(Clone)]
pub struct MeasureOptions {
	pub point: PointOptions,
	pub line: LineOptions,
	pub polygon: PolygonOptions,
	pub projector: Rc<dyn Projector>,
}

impl Default for MeasureOptions {
	fn default() -> Self {
		Self {
			point: PointOptions::default(),
			line: LineOptions::default(),
			polygon: PolygonOptions::default(),
			projector: Rc::new(CenteredTransverseMercator),
		}
	}
}

impl Debug for MeasureOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MeasureOptions")
			.field("line.with_start", &self.line.with_start)
			.field("polygon.with_line_string", &self.polygon.with_line_string)
			.field("polygon.line.with_start", &self.polygon.line.with_start)
			.field("projector", &self.projector)
			.finish_non_exhaustive()
	}
}

/// What to measure.
#[derive(Clone, Copy, Debug)]
pub enum MeasureInput<'a> {
	Feature(&'a GeoFeature),
	/// Every annotation carries the id of the feature it was derived from.
	Features(&'a [GeoFeature]),
	Geometry(&'a Geometry),
}

impl<'a> From<&'a GeoFeature> for MeasureInput<'a> {
	fn from(value: &'a GeoFeature) -> Self {
		MeasureInput::Feature(value)
	}
}

impl<'a> From<&'a [GeoFeature]> for MeasureInput<'a> {
	fn from(value: &'a [GeoFeature]) -> Self {
		MeasureInput::Features(value)
	}
}

impl<'a> From<&'a Vec<GeoFeature>> for MeasureInput<'a> {
	fn from(value: &'a Vec<GeoFeature>) -> Self {
		MeasureInput::Features(value)
	}
}

impl<'a> From<&'a Geometry> for MeasureInput<'a> {
	fn from(value: &'a Geometry) -> Self {
		MeasureInput::Geometry(value)
	}
}

/// Computes the annotations of a feature, a feature list or a bare geometry.
pub fn cal<'a>(input: impl Into<MeasureInput<'a>>, options: &MeasureOptions) -> Result<Vec<Annotation>> {
	match input.into() {
		MeasureInput::Feature(feature) => cal_geometry(&feature.geometry, options),
		MeasureInput::Geometry(geometry) => cal_geometry(geometry, options),
		MeasureInput::Features(features) => {
			let mut result = Vec::new();
			for feature in features {
				let mut annotations = cal_geometry(&feature.geometry, options)?;
				for annotation in &mut annotations {
					annotation.parent_id = Some(feature.id.clone());
				}
				result.append(&mut annotations);
			}
			Ok(result)
		}
	}
}

fn cal_geometry(geometry: &Geometry, options: &MeasureOptions) -> Result<Vec<Annotation>> {
	let mut result = Vec::new();
	match geometry {
		Geometry::Point(g) => result.push(cal_point(g.as_coord(), &options.point)),
		Geometry::MultiPoint(g) => result.extend(g.0.iter().map(|p| cal_point(p.as_coord(), &options.point))),
		Geometry::LineString(g) => cal_line(
			&g.0,
			&options.line,
			AnnotationKind::Line,
			options.projector.as_ref(),
			&mut result,
		),
		Geometry::MultiLineString(g) => {
			for line in &g.0 {
				cal_line(&line.0, &options.line, AnnotationKind::Line, options.projector.as_ref(), &mut result);
			}
		}
		Geometry::Polygon(g) => cal_polygon(g, &options.polygon, options.projector.as_ref(), &mut result),
		Geometry::MultiPolygon(g) => {
			for polygon in &g.0 {
				cal_polygon(polygon, &options.polygon, options.projector.as_ref(), &mut result);
			}
		}
		Geometry::Collection(_) => bail!("unsupported geometry for measurement: {}", geometry.type_name()),
	}
	Ok(result)
}

fn cal_point(position: &Coordinates, options: &PointOptions) -> Annotation {
	let value = match &options.format {
		Some(format) => format(position),
		None => format!("{:.6},{:.6}", position.x(), position.y()),
	};
	Annotation::new(*position, value, AnnotationKind::Point)
}

fn format_length(length: f64, context: LengthContext, options: &LineOptions) -> String {
	match &options.format {
		Some(format) => format(length, context),
		None => format!("{length:.2} m"),
	}
}

fn cal_line(
	positions: &[Coordinates],
	options: &LineOptions,
	kind: AnnotationKind,
	projector: &dyn Projector,
	result: &mut Vec<Annotation>,
) {
	let mut sum = 0.0;
	let count = positions.len();

	for (index, current) in positions.iter().enumerate() {
		if index > 0 {
			let segment = [positions[index - 1], *current];
			let length = planar_length(&projector.project_ring(&segment));
			sum += length;

			let context = LengthContext {
				index,
				last: false,
				segment: true,
			};
			let mut annotation = Annotation::new(
				positions_center(&segment).unwrap_or(*current),
				format_length(length, context, options),
				kind,
			);
			annotation.center = true;
			result.push(annotation);
		}

		if index == 0 && !options.with_start {
			continue;
		}

		let context = LengthContext {
			index,
			last: index + 1 == count,
			segment: false,
		};
		result.push(Annotation::new(
			*current,
			format_length(sum, context, options),
			kind,
		));
	}
}

fn cal_polygon(
	polygon: &PolygonGeometry,
	options: &PolygonOptions,
	projector: &dyn Projector,
	result: &mut Vec<Annotation>,
) {
	if options.with_line_string {
		for ring in &polygon.0 {
			cal_line(&ring.0, &options.line, AnnotationKind::PolygonLine, projector, result);
		}
	}

	let Some(outer) = polygon.outer() else {
		return;
	};
	if outer.0.len() <= 3 {
		return;
	}

	let area = polygon_area(polygon, projector).abs();

	let value = match &options.format {
		Some(format) => format(area),
		None => format!("{area:.2} m²"),
	};
	let center = positions_center(&outer.0).unwrap_or(outer.0[0]);
	result.push(Annotation::new(center, value, AnnotationKind::Polygon));
}
