use super::{parse_geojson, parse_geojson_feature};
use crate::{GeoCollection, GeoFeature};
use anyhow::{Result, anyhow};
use std::io::{BufRead, Read};

pub fn read_geojson(mut reader: impl Read) -> Result<GeoCollection> {
	let mut buffer = String::new();
	reader.read_to_string(&mut buffer)?;
	parse_geojson(&buffer)
}

fn process_line(line: std::io::Result<String>, index: usize) -> Result<Option<GeoFeature>> {
	match line {
		Ok(line) if line.trim().is_empty() => Ok(None),
		Ok(line) => serde_json::from_str(&line)
			.map_err(anyhow::Error::from)
			.and_then(|value| parse_geojson_feature(&value))
			.map(Some)
			.map_err(|e| anyhow!("line {}: {}", index + 1, e)),
		Err(e) => Err(anyhow!("line {}: {}", index + 1, e)),
	}
}

/// Reads newline-delimited GeoJSON features, skipping blank lines.
pub fn read_ndgeojson_iter(reader: impl BufRead) -> impl Iterator<Item = Result<GeoFeature>> {
	reader
		.lines()
		.enumerate()
		.filter_map(|(index, line)| process_line(line, index).transpose())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn read_geojson_basic() -> Result<()> {
		let json = r#"{"type":"FeatureCollection","features":[{"type":"Feature","id":"a","geometry":{"type":"Point","coordinates":[0,0]},"properties":{}}]}"#;
		let collection = read_geojson(Cursor::new(json))?;
		assert_eq!(collection.features.len(), 1);
		assert_eq!(collection.features[0].geometry.type_name(), "Point");
		Ok(())
	}

	#[test]
	fn read_ndgeojson_with_empty_lines() -> Result<()> {
		let text = concat!(
			r#"{"type":"Feature","id":"a","geometry":{"type":"Point","coordinates":[1,1]}}"#,
			"\n\n   \n",
			r#"{"type":"Feature","id":"b","geometry":{"type":"Point","coordinates":[2,2]}}"#,
			"\n"
		);
		let features = read_ndgeojson_iter(Cursor::new(text)).collect::<Result<Vec<_>>>()?;
		assert_eq!(features.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
		Ok(())
	}

	#[test]
	fn read_ndgeojson_reports_line() {
		let text = "\n{\"type\":\"Feature\"}\n";
		let error = read_ndgeojson_iter(Cursor::new(text)).next().unwrap().unwrap_err();
		assert!(error.to_string().starts_with("line 2:"));
	}
}
