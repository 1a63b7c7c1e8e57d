// Import necessary modules and dependencies
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

// Define the command-line interface using the clap crate
#[derive(Parser, Debug)]
#[command(
	author, // Set the author
	version, // Set the version
	about, // Set a short description
	long_about = None, // Disable long description
	propagate_version = true, // Enable version flag for subcommands
	disable_help_subcommand = true, // Disable help subcommand
)]
struct Cli {
	#[command(subcommand)]
	command: Commands, // Set subcommands

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>, // Set verbosity flag
}

// Define subcommands for the command-line interface
#[derive(Subcommand, Debug)]
enum Commands {
	/// Print measurement labels of a GeoJSON file
	Measure(tools::measure::Subcommand),

	/// Convert a value between units
	Convert(tools::convert::Subcommand),

	/// Replay a scripted drawing session and print the result
	Replay(tools::replay::Subcommand),
}

// Main function for running the command-line interface
fn main() -> Result<()> {
	let cli = Cli::parse();

	// Initialize logger and set log level based on verbosity flag
	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

// Helper function for running subcommands
fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Measure(arguments) => tools::measure::run(arguments),
		Commands::Convert(arguments) => tools::convert::run(arguments),
		Commands::Replay(arguments) => tools::replay::run(arguments),
	}
}

// Unit tests for the command-line interface
#[cfg(test)]
mod tests {
	use crate::{Cli, run};
	use anyhow::Result;
	use clap::Parser;

	// Function for running command-line arguments in tests
	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{cli:?}");
		run(cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["geodraw"]).unwrap_err().to_string();
		assert!(err.starts_with("Measure GeoJSON features, convert between units and replay drawing sessions."));
		assert!(err.contains("\nUsage: geodraw [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["geodraw", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("geodraw "));
	}

	#[test]
	fn measure_subcommand() {
		let output = run_command(vec!["geodraw", "measure"]).unwrap_err().to_string();
		assert!(output.starts_with("Print measurement labels of a GeoJSON file"));
	}

	#[test]
	fn convert_subcommand() {
		let output = run_command(vec!["geodraw", "convert"]).unwrap_err().to_string();
		assert!(output.starts_with("Convert a value between units"));
	}

	#[test]
	fn replay_subcommand() {
		let output = run_command(vec!["geodraw", "replay"]).unwrap_err().to_string();
		assert!(output.starts_with("Replay a scripted drawing session and print the result"));
	}
}
