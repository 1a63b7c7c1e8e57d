use super::{Ellipsoid, TransverseMercator};
use anyhow::{Context, Error, Result, bail};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

lazy_static! {
	static ref REG_PARAM: Regex = Regex::new(r"\+([A-Za-z_0-9]+)(?:=(\S+))?").unwrap();
}

/// Parses the `+proj=tmerc` subset of PROJ strings, e.g.
/// `+proj=tmerc +lat_0=0 +lon_0=120 +k=1 +x_0=500000 +y_0=0 +ellps=GRS80 +units=m +no_defs`.
/// Unknown parameters are ignored.
impl FromStr for TransverseMercator {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let mut tm = TransverseMercator::default();
		let mut proj: Option<&str> = None;

		for capture in REG_PARAM.captures_iter(s) {
			let key = capture.get(1).map_or("", |m| m.as_str());
			let value = capture.get(2).map(|m| m.as_str());
			let number = || -> Result<f64> {
				let value = value.with_context(|| format!("parameter '+{key}' needs a value"))?;
				value
					.parse::<f64>()
					.with_context(|| format!("invalid number '{value}' for '+{key}'"))
			};
			match key {
				"proj" => proj = value,
				"lat_0" => tm.lat_0 = number()?,
				"lon_0" => tm.lon_0 = number()?,
				"k" | "k_0" => tm.k_0 = number()?,
				"x_0" => tm.x_0 = number()?,
				"y_0" => tm.y_0 = number()?,
				"ellps" => {
					tm.ellipsoid = match value {
						Some("GRS80") => Ellipsoid::Grs80,
						Some("WGS84") => Ellipsoid::Wgs84,
						other => bail!("unsupported ellipsoid '{}'", other.unwrap_or_default()),
					}
				}
				"units" => {
					if value != Some("m") {
						bail!("unsupported units '{}', only 'm' is supported", value.unwrap_or_default());
					}
				}
				_ => {}
			}
		}

		match proj {
			Some("tmerc") => Ok(tm),
			Some(other) => bail!("unsupported projection '{other}'"),
			None => bail!("projection string is missing '+proj'"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn parse_full_string() -> Result<()> {
		let tm: TransverseMercator =
			"+proj=tmerc +lat_0=0 +lon_0=120 +k=0.9996 +x_0=400000 +y_0=10 +ellps=WGS84 +units=m +no_defs +type=crs"
				.parse()?;
		assert_eq!(
			tm,
			TransverseMercator {
				ellipsoid: Ellipsoid::Wgs84,
				lat_0: 0.0,
				lon_0: 120.0,
				k_0: 0.9996,
				x_0: 400_000.0,
				y_0: 10.0,
			}
		);
		Ok(())
	}

	#[test]
	fn defaults_fill_missing_parameters() -> Result<()> {
		let tm: TransverseMercator = "+proj=tmerc +lon_0=7.5".parse()?;
		assert_eq!(tm, TransverseMercator::with_central_meridian(7.5));
		Ok(())
	}

	#[rstest]
	#[case("+proj=merc +lon_0=0", "unsupported projection 'merc'")]
	#[case("+lon_0=0", "projection string is missing '+proj'")]
	#[case("+proj=tmerc +units=ft", "unsupported units 'ft', only 'm' is supported")]
	#[case("+proj=tmerc +ellps=bessel", "unsupported ellipsoid 'bessel'")]
	#[case("+proj=tmerc +lon_0=east", "invalid number 'east' for '+lon_0'")]
	#[case("+proj=tmerc +lon_0", "parameter '+lon_0' needs a value")]
	fn parse_errors(#[case] input: &str, #[case] message: &str) {
		let error = input.parse::<TransverseMercator>().unwrap_err();
		assert_eq!(error.to_string(), message);
	}
}
