pub mod convert;
pub mod measure;
pub mod replay;

use anyhow::Result;
use geodraw_editor::EditorConfig;
use std::path::Path;

/// Loads `--config`, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
	match path {
		Some(path) => {
			log::debug!("loading config from {path:?}");
			EditorConfig::from_path(path)
		}
		None => Ok(EditorConfig::default()),
	}
}

pub fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
	let text = if pretty {
		serde_json::to_string_pretty(value)?
	} else {
		serde_json::to_string(value)?
	};
	println!("{text}");
	Ok(())
}
