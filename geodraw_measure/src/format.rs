use crate::{
	measure::{LengthContext, LineOptions, MeasureOptions, PointOptions, PolygonOptions},
	units::{AreaSetting, AreaUnit, LengthSetting, LengthUnit, convert_area, convert_length},
};
use geodraw_geometry::{
	Coordinates,
	projection::{CenteredTransverseMercator, Projector},
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Number of decimals per unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Precisions {
	#[serde(rename = "M")]
	pub meter: usize,
	#[serde(rename = "KM")]
	pub kilometer: usize,
	#[serde(rename = "M2")]
	pub square_meter: usize,
	#[serde(rename = "KM2")]
	pub square_kilometer: usize,
	#[serde(rename = "MU")]
	pub mu: usize,
}

impl Default for Precisions {
	fn default() -> Self {
		Self {
			meter: 1,
			kilometer: 2,
			square_meter: 2,
			square_kilometer: 2,
			mu: 2,
		}
	}
}

impl Precisions {
	#[must_use]
	pub fn length(&self, unit: LengthUnit) -> usize {
		match unit {
			LengthUnit::Meter => self.meter,
			LengthUnit::Kilometer => self.kilometer,
		}
	}

	#[must_use]
	pub fn area(&self, unit: AreaUnit) -> usize {
		match unit {
			AreaUnit::SquareMeter => self.square_meter,
			AreaUnit::SquareKilometer => self.square_kilometer,
			AreaUnit::Mu => self.mu,
		}
	}

	pub fn set_length(&mut self, unit: LengthUnit, precision: usize) {
		match unit {
			LengthUnit::Meter => self.meter = precision,
			LengthUnit::Kilometer => self.kilometer = precision,
		}
	}

	pub fn set_area(&mut self, unit: AreaUnit, precision: usize) {
		match unit {
			AreaUnit::SquareMeter => self.square_meter = precision,
			AreaUnit::SquareKilometer => self.square_kilometer = precision,
			AreaUnit::Mu => self.mu = precision,
		}
	}
}

/// Formats measured values with unit selection and per-unit precision, and turns those
/// formats into [`MeasureOptions`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LabelFormatter {
	pub length_unit: LengthSetting,
	pub area_unit: AreaSetting,
	pub precisions: Precisions,
}

impl LabelFormatter {
	/// `"12.3 m"`, `"4.56 km"`, ... for a length in meters.
	#[must_use]
	pub fn format_length(&self, meters: f64) -> String {
		let unit = self.length_unit.resolve(meters);
		let value = convert_length(meters, LengthUnit::Meter, unit);
		format!("{value:.prec$} {unit}", prec = self.precisions.length(unit))
	}

	/// `"12.34 m²"`, `"4.56 km²"`, ... for an area in square meters.
	#[must_use]
	pub fn format_area(&self, square_meters: f64) -> String {
		let unit = self.area_unit.resolve(square_meters);
		let value = convert_area(square_meters, AreaUnit::SquareMeter, unit);
		format!("{value:.prec$} {unit}", prec = self.precisions.area(unit))
	}

	#[must_use]
	pub fn format_position(lng: f64, lat: f64) -> String {
		format!("{lng:.6},{lat:.6}")
	}

	/// Builds measurement options using these formats and the default projection.
	#[must_use]
	pub fn measure_options(&self) -> MeasureOptions {
		self.measure_options_with(Rc::new(CenteredTransverseMercator))
	}

	/// Builds measurement options. Polygon rings skip their start label, since the closing
	/// vertex sits on top of it, and the last ring label is prefixed with `end: `.
	#[must_use]
	pub fn measure_options_with(&self, projector: Rc<dyn Projector>) -> MeasureOptions {
		let line = self.clone();
		let ring = self.clone();
		let area = self.clone();

		MeasureOptions {
			point: PointOptions {
				format: Some(Rc::new(|p: &Coordinates| LabelFormatter::format_position(p.x(), p.y()))),
			},
			line: LineOptions {
				format: Some(Rc::new(move |length: f64, _: LengthContext| line.format_length(length))),
				with_start: true,
			},
			polygon: PolygonOptions {
				format: Some(Rc::new(move |square_meters: f64| area.format_area(square_meters))),
				with_line_string: true,
				line: LineOptions {
					format: Some(Rc::new(move |length: f64, context: LengthContext| {
						let label = ring.format_length(length);
						if context.last { format!("end: {label}") } else { label }
					})),
					with_start: false,
				},
			},
			projector,
		}
	}
}
