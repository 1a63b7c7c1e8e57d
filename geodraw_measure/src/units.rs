//! Length, area and angle units.
//!
//! Every conversion goes through the base unit of its kind (meters, square meters, degrees):
//! `to_base` first, then `from_base` into the target unit.

use anyhow::{Error, Result, bail};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, fmt::Display, str::FromStr};

/// Square meters in one mu.
pub const SQUARE_METERS_PER_MU: f64 = 666.67;

/// Symbol and human readable name of a unit, for UI formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitDescription {
	pub token: &'static str,
	pub symbol: &'static str,
	pub name: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
	#[serde(rename = "M")]
	Meter,
	#[serde(rename = "KM")]
	Kilometer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaUnit {
	#[serde(rename = "M2")]
	SquareMeter,
	#[serde(rename = "KM2")]
	SquareKilometer,
	#[serde(rename = "MU")]
	Mu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleUnit {
	#[serde(rename = "D")]
	Degree,
	#[serde(rename = "M")]
	Minute,
	#[serde(rename = "S")]
	Second,
	#[serde(rename = "R")]
	Radian,
}

impl LengthUnit {
	pub const ALL: [LengthUnit; 2] = [LengthUnit::Meter, LengthUnit::Kilometer];

	#[must_use]
	pub fn to_base(self, value: f64) -> f64 {
		match self {
			LengthUnit::Meter => value,
			LengthUnit::Kilometer => value * 1000.0,
		}
	}

	#[must_use]
	pub fn from_base(self, meters: f64) -> f64 {
		match self {
			LengthUnit::Meter => meters,
			LengthUnit::Kilometer => meters / 1000.0,
		}
	}

	#[must_use]
	pub fn description(self) -> UnitDescription {
		match self {
			LengthUnit::Meter => UnitDescription {
				token: "M",
				symbol: "m",
				name: "meter",
			},
			LengthUnit::Kilometer => UnitDescription {
				token: "KM",
				symbol: "km",
				name: "kilometer",
			},
		}
	}
}

impl AreaUnit {
	pub const ALL: [AreaUnit; 3] = [AreaUnit::SquareMeter, AreaUnit::SquareKilometer, AreaUnit::Mu];

	#[must_use]
	pub fn to_base(self, value: f64) -> f64 {
		match self {
			AreaUnit::SquareMeter => value,
			AreaUnit::SquareKilometer => value * 1_000_000.0,
			AreaUnit::Mu => value * SQUARE_METERS_PER_MU,
		}
	}

	#[must_use]
	pub fn from_base(self, square_meters: f64) -> f64 {
		match self {
			AreaUnit::SquareMeter => square_meters,
			AreaUnit::SquareKilometer => square_meters / 1_000_000.0,
			AreaUnit::Mu => square_meters / SQUARE_METERS_PER_MU,
		}
	}

	#[must_use]
	pub fn description(self) -> UnitDescription {
		match self {
			AreaUnit::SquareMeter => UnitDescription {
				token: "M2",
				symbol: "m²",
				name: "square meter",
			},
			AreaUnit::SquareKilometer => UnitDescription {
				token: "KM2",
				symbol: "km²",
				name: "square kilometer",
			},
			AreaUnit::Mu => UnitDescription {
				token: "MU",
				symbol: "mu",
				name: "mu",
			},
		}
	}
}

impl AngleUnit {
	pub const ALL: [AngleUnit; 4] = [AngleUnit::Degree, AngleUnit::Minute, AngleUnit::Second, AngleUnit::Radian];

	#[must_use]
	pub fn to_base(self, value: f64) -> f64 {
		match self {
			AngleUnit::Degree => value,
			AngleUnit::Minute => value / 60.0,
			AngleUnit::Second => value / 3600.0,
			AngleUnit::Radian => value * 180.0 / PI,
		}
	}

	#[must_use]
	pub fn from_base(self, degrees: f64) -> f64 {
		match self {
			AngleUnit::Degree => degrees,
			AngleUnit::Minute => degrees * 60.0,
			AngleUnit::Second => degrees * 3600.0,
			AngleUnit::Radian => degrees * PI / 180.0,
		}
	}

	#[must_use]
	pub fn description(self) -> UnitDescription {
		match self {
			AngleUnit::Degree => UnitDescription {
				token: "D",
				symbol: "°",
				name: "degree",
			},
			AngleUnit::Minute => UnitDescription {
				token: "M",
				symbol: "′",
				name: "arcminute",
			},
			AngleUnit::Second => UnitDescription {
				token: "S",
				symbol: "″",
				name: "arcsecond",
			},
			AngleUnit::Radian => UnitDescription {
				token: "R",
				symbol: "rad",
				name: "radian",
			},
		}
	}
}

#[must_use]
pub fn convert_length(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
	to.from_base(from.to_base(value))
}

#[must_use]
pub fn convert_area(value: f64, from: AreaUnit, to: AreaUnit) -> f64 {
	to.from_base(from.to_base(value))
}

#[must_use]
pub fn convert_angle(value: f64, from: AngleUnit, to: AngleUnit) -> f64 {
	to.from_base(from.to_base(value))
}

macro_rules! impl_unit_traits {
	($($t:ty => $kind:expr),*) => {$(
		impl FromStr for $t {
			type Err = Error;

			fn from_str(s: &str) -> Result<Self> {
				let token = s.trim().to_ascii_uppercase();
				match Self::ALL.into_iter().find(|unit| unit.description().token == token) {
					Some(unit) => Ok(unit),
					None => bail!("unsupported {} unit '{}'", $kind, s),
				}
			}
		}

		impl Display for $t {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.write_str(self.description().symbol)
			}
		}
	)*};
}

impl_unit_traits!(LengthUnit => UnitKind::Length, AreaUnit => UnitKind::Area, AngleUnit => UnitKind::Angle);

/// The quantity a unit measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
	Length,
	Area,
	Angle,
}

impl Display for UnitKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			UnitKind::Length => "length",
			UnitKind::Area => "area",
			UnitKind::Angle => "angle",
		})
	}
}

impl FromStr for UnitKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s.trim().to_ascii_lowercase().as_str() {
			"length" => UnitKind::Length,
			"area" => UnitKind::Area,
			"angle" => UnitKind::Angle,
			_ => bail!("unsupported unit kind '{s}'"),
		})
	}
}

/// A unit of any kind, for callers that handle all kinds uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
	Length(LengthUnit),
	Area(AreaUnit),
	Angle(AngleUnit),
}

impl Unit {
	/// Parses a unit token of the given kind. Tokens are only unique per kind, e.g. `M` is
	/// meters as a length and arcminutes as an angle.
	pub fn parse(kind: UnitKind, token: &str) -> Result<Unit> {
		Ok(match kind {
			UnitKind::Length => Unit::Length(token.parse()?),
			UnitKind::Area => Unit::Area(token.parse()?),
			UnitKind::Angle => Unit::Angle(token.parse()?),
		})
	}

	#[must_use]
	pub fn kind(&self) -> UnitKind {
		match self {
			Unit::Length(_) => UnitKind::Length,
			Unit::Area(_) => UnitKind::Area,
			Unit::Angle(_) => UnitKind::Angle,
		}
	}

	#[must_use]
	pub fn description(&self) -> UnitDescription {
		match self {
			Unit::Length(u) => u.description(),
			Unit::Area(u) => u.description(),
			Unit::Angle(u) => u.description(),
		}
	}
}

/// Converts between two units of the same kind.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64> {
	Ok(match (from, to) {
		(Unit::Length(a), Unit::Length(b)) => convert_length(value, a, b),
		(Unit::Area(a), Unit::Area(b)) => convert_area(value, a, b),
		(Unit::Angle(a), Unit::Angle(b)) => convert_angle(value, a, b),
		_ => bail!("cannot convert {} unit '{}' into {} unit '{}'", from.kind(), from.description().token, to.kind(), to.description().token),
	})
}

/// Length unit selection for labels. `Auto` switches from meters to kilometers above 1000 m.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthSetting {
	#[serde(rename = "M")]
	Meter,
	#[serde(rename = "KM")]
	Kilometer,
	#[default]
	#[serde(rename = "MKM")]
	Auto,
}

impl LengthSetting {
	/// Picks the unit for one measured value, given in meters.
	#[must_use]
	pub fn resolve(self, meters: f64) -> LengthUnit {
		match self {
			LengthSetting::Meter => LengthUnit::Meter,
			LengthSetting::Kilometer => LengthUnit::Kilometer,
			LengthSetting::Auto if meters > 1000.0 => LengthUnit::Kilometer,
			LengthSetting::Auto => LengthUnit::Meter,
		}
	}
}

impl FromStr for LengthSetting {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		if s.trim().eq_ignore_ascii_case("MKM") {
			return Ok(LengthSetting::Auto);
		}
		Ok(match s.parse::<LengthUnit>()? {
			LengthUnit::Meter => LengthSetting::Meter,
			LengthUnit::Kilometer => LengthSetting::Kilometer,
		})
	}
}

/// Area unit selection for labels. `Auto` switches from m² to km² above 1 000 000 m².
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaSetting {
	#[serde(rename = "M2")]
	SquareMeter,
	#[serde(rename = "KM2")]
	SquareKilometer,
	#[serde(rename = "MU")]
	Mu,
	#[default]
	#[serde(rename = "M2KM2")]
	Auto,
}

impl AreaSetting {
	/// Picks the unit for one measured value, given in square meters.
	#[must_use]
	pub fn resolve(self, square_meters: f64) -> AreaUnit {
		match self {
			AreaSetting::SquareMeter => AreaUnit::SquareMeter,
			AreaSetting::SquareKilometer => AreaUnit::SquareKilometer,
			AreaSetting::Mu => AreaUnit::Mu,
			AreaSetting::Auto if square_meters > 1_000_000.0 => AreaUnit::SquareKilometer,
			AreaSetting::Auto => AreaUnit::SquareMeter,
		}
	}
}

impl FromStr for AreaSetting {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		if s.trim().eq_ignore_ascii_case("M2KM2") {
			return Ok(AreaSetting::Auto);
		}
		Ok(match s.parse::<AreaUnit>()? {
			AreaUnit::SquareMeter => AreaSetting::SquareMeter,
			AreaUnit::SquareKilometer => AreaSetting::SquareKilometer,
			AreaUnit::Mu => AreaSetting::Mu,
		})
	}
}
