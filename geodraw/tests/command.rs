use assert_cmd::{Command, cargo};
use predicates::{prelude::PredicateBooleanExt, str};
use rstest::rstest;
use std::fs;
use test_utilities::*;

#[test]
fn command() -> Result<(), Box<dyn std::error::Error>> {
	let mut cmd = Command::new(cargo::cargo_bin!());
	cmd.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} [OPTIONS] <COMMAND>")));
	Ok(())
}

#[rstest]
#[case("convert", "[OPTIONS] <VALUE> <FROM> <TO>")]
#[case("measure", "[OPTIONS] <INPUT_FILE>")]
#[case("replay", "[OPTIONS] <SCRIPT>")]
fn subcommand(#[case] sub_command: &str, #[case] usage: &str) -> Result<(), Box<dyn std::error::Error>> {
	Command::new(cargo::cargo_bin!())
		.args(sub_command.split(" "))
		.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} {sub_command} {usage}")));
	Ok(())
}

#[rstest]
#[case(&["1.5", "KM", "M"], "1500.000000 m\n")]
#[case(&["-p", "2", "1", "KM2", "MU"], "1499.99 mu\n")]
#[case(&["-k", "angle", "-p", "4", "180", "D", "R"], "3.1416 rad\n")]
#[case(&["-p", "1", "-90", "D", "M"], "-5400.0 ′\n")]
fn convert(#[case] args: &[&str], #[case] expected: &str) {
	geodraw_cmd()
		.arg("convert")
		.args(args)
		.assert()
		.success()
		.stdout(expected.to_string());
}

#[test]
fn convert_mixed_kinds() {
	geodraw_cmd()
		.args(["convert", "1", "KM", "M2"])
		.assert()
		.failure()
		.stderr(str::contains("'KM' and 'M2' are not units of the same kind"));
}

#[test]
fn measure() {
	geodraw_cmd()
		.arg("measure")
		.arg(get_testdata("shapes.geojson"))
		.assert()
		.success()
		.stdout(str::contains(r#""value":"116.391000,39.907000""#))
		.stdout(str::contains(r#""id":"road""#))
		.stdout(str::contains(r#""type":"polygon-line""#))
		.stdout(str::contains(r#""type":"polygon""#));
}

#[test]
fn measure_with_config() -> Result<(), Box<dyn std::error::Error>> {
	let (_dir, config) = get_temp_output("config.yml");
	fs::write(&config, "measure:\n  length_unit: KM\n  area_unit: MU\n  show_line_segments: false\n  show_polygon_line_segments: false\n")?;
	geodraw_cmd()
		.arg("measure")
		.arg("--config")
		.arg(&config)
		.arg(get_testdata("shapes.geojson"))
		.assert()
		.success()
		.stdout(str::contains(r#" km""#))
		.stdout(str::contains(r#" mu""#))
		.stdout(str::contains(r#""center":true"#).not());
	Ok(())
}

#[test]
fn measure_missing_file() {
	geodraw_cmd()
		.args(["measure", "does-not-exist.geojson"])
		.assert()
		.failure()
		.stderr(str::contains("failed to read"));
}

#[test]
fn replay_polygon() {
	geodraw_cmd()
		.arg("replay")
		.arg(get_testdata("replay_polygon.txt"))
		.assert()
		.success()
		.stdout(str::contains(r#""drawn":1"#))
		.stdout(str::contains(
			r#""coordinates":[[[0.0,0.0],[0.001,0.0],[0.001,0.001],[0.0,0.0]]]"#,
		))
		.stdout(str::contains(r#""type":"polygon""#));
}

#[test]
fn replay_line_once() {
	geodraw_cmd()
		.arg("replay")
		.arg("--config")
		.arg(get_testdata("editor.yml"))
		.arg(get_testdata("replay_line.txt"))
		.assert()
		.success()
		.stdout(str::contains(r#""drawn":1"#))
		.stdout(str::contains(r#""coordinates":[[0.0,0.0],[0.01,0.0]]"#))
		.stdout(str::contains("[5.0,5.0]").not());
}

#[test]
fn replay_invalid_script() -> Result<(), Box<dyn std::error::Error>> {
	let (_dir, script) = get_temp_output("script.txt");
	fs::write(&script, "mode line\nclick 1\n")?;
	geodraw_cmd()
		.arg("replay")
		.arg(&script)
		.assert()
		.failure()
		.stderr(str::contains("line 2"));
	Ok(())
}

#[test]
fn measure_rejects_malformed_geometry() -> Result<(), Box<dyn std::error::Error>> {
	let (_dir, input) = get_temp_output("line.geojson");
	fs::write(&input, r#"{"type":"LineString","coordinates":[[0,0]]}"#)?;
	geodraw_cmd()
		.arg("measure")
		.arg(&input)
		.assert()
		.failure()
		.stderr(str::contains("a line needs at least 2 positions"));
	Ok(())
}
