use super::{load_config, print_json};
use anyhow::{Context, Error, Result, bail, ensure};
use geodraw_editor::{
	DrawManager, DrawMode, DrawOptions, MeasureLayer, SharedStore, SyncStrategy,
	draw::ManualClock,
	ids::SequentialIds,
	memory::MemorySurface,
	surface::{Key, MapEvent, SharedSurface, dispatch},
};
use geodraw_geometry::Coordinates;
use geodraw_measure::annotations_to_json;
use serde_json::json;
use std::{cell::Cell, fs, path::PathBuf, rc::Rc, str::FromStr, time::Duration};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// script with one step per line:
	///   mode point|line|polygon
	///   click X Y, dblclick X Y, move X Y, rightclick X Y
	///   key NAME (e.g. Escape, Backspace)
	///   wait MILLISECONDS
	///   stop, clear
	/// empty lines and lines starting with # are ignored
	#[arg(verbatim_doc_comment)]
	script: PathBuf,

	/// YAML config file with `draw` and `measure` sections
	#[arg(long, short, value_name = "FILE")]
	config: Option<PathBuf>,

	/// pretty-print the output
	#[arg(long, short)]
	pretty: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum Step {
	Mode(DrawMode),
	Event(MapEvent),
	Wait(Duration),
	Stop,
	Clear,
}

fn parse_position(args: &[&str]) -> Result<Coordinates> {
	ensure!(args.len() == 2, "expected 2 coordinates, got {}", args.len());
	let x = args[0].parse::<f64>().with_context(|| format!("invalid x '{}'", args[0]))?;
	let y = args[1].parse::<f64>().with_context(|| format!("invalid y '{}'", args[1]))?;
	Ok(Coordinates::new(x, y))
}

fn single<'a>(args: &[&'a str]) -> Result<&'a str> {
	match args {
		[value] => Ok(value),
		_ => bail!("expected 1 argument, got {}", args.len()),
	}
}

impl FromStr for Step {
	type Err = Error;

	fn from_str(line: &str) -> Result<Self> {
		let words = line.split_whitespace().collect::<Vec<_>>();
		let Some((command, args)) = words.split_first() else {
			bail!("empty step");
		};
		Ok(match command.to_lowercase().as_str() {
			"mode" => Step::Mode(single(args)?.parse()?),
			"click" => Step::Event(MapEvent::Click(parse_position(args)?)),
			"dblclick" => Step::Event(MapEvent::DoubleClick(parse_position(args)?)),
			"move" => Step::Event(MapEvent::MouseMove(parse_position(args)?)),
			"rightclick" => Step::Event(MapEvent::ContextMenu(parse_position(args)?)),
			"key" => Step::Event(MapEvent::KeyDown(Key::parse(single(args)?))),
			"wait" => Step::Wait(Duration::from_millis(
				single(args)?.parse().context("invalid milliseconds")?,
			)),
			"stop" => Step::Stop,
			"clear" => Step::Clear,
			other => bail!("unknown step '{other}'"),
		})
	}
}

fn parse_script(text: &str) -> Result<Vec<Step>> {
	text
		.lines()
		.enumerate()
		.map(|(index, line)| (index, line.trim()))
		.filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
		.map(|(index, line)| {
			line
				.parse::<Step>()
				.with_context(|| format!("line {}: {line:?}", index + 1))
		})
		.collect()
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(arguments.config.as_deref())?;
	let path = &arguments.script;
	let text = fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
	let steps = parse_script(&text).with_context(|| format!("failed to parse {path:?}"))?;

	let surface: SharedSurface = MemorySurface::new().shared();
	let store = SharedStore::new(&surface, "geodraw", SyncStrategy::Incremental)?;
	let clock = Rc::new(ManualClock::default());
	let draw = DrawManager::new(
		&store,
		DrawOptions {
			ids: Rc::new(SequentialIds::new("draw-")),
			clock: clock.clone(),
			..DrawOptions::from(&config.draw)
		},
	)?;
	let measure = MeasureLayer::new(&store, &config.measure, &SequentialIds::new("measure-"))?;

	let drawn = Rc::new(Cell::new(0usize));
	{
		let drawn = drawn.clone();
		draw.set_on_drawed(move |feature| {
			log::info!("drew {} '{}'", feature.geometry.type_name(), feature.id);
			drawn.set(drawn.get() + 1);
		});
	}

	for step in steps {
		log::trace!("replaying {step:?}");
		match step {
			Step::Mode(mode) => draw.start(mode)?,
			Step::Event(event) => {
				dispatch(&surface, &event);
			}
			Step::Wait(duration) => {
				clock.advance(duration);
				draw.tick()?;
			}
			Step::Stop => draw.stop()?,
			Step::Clear => draw.clear()?,
		}
	}
	draw.tick()?;

	let output = json!({
		"drawn": drawn.get(),
		"features": store.fc().to_json(),
		"annotations": annotations_to_json(&measure.annotations()?),
	});
	print_json(&output, arguments.pretty)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::run_command;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case("mode polygon", Step::Mode(DrawMode::Polygon))]
	#[case("click 1 2", Step::Event(MapEvent::Click(Coordinates::new(1.0, 2.0))))]
	#[case("DBLCLICK -1.5 2", Step::Event(MapEvent::DoubleClick(Coordinates::new(-1.5, 2.0))))]
	#[case("move 0 0", Step::Event(MapEvent::MouseMove(Coordinates::new(0.0, 0.0))))]
	#[case("rightclick 3 4", Step::Event(MapEvent::ContextMenu(Coordinates::new(3.0, 4.0))))]
	#[case("key Escape", Step::Event(MapEvent::KeyDown(Key::Escape)))]
	#[case("wait 60", Step::Wait(Duration::from_millis(60)))]
	#[case("stop", Step::Stop)]
	#[case("clear", Step::Clear)]
	fn parse_steps(#[case] line: &str, #[case] step: Step) {
		assert_eq!(line.parse::<Step>().unwrap(), step);
	}

	#[rstest]
	#[case("jump 1 2", "unknown step 'jump'")]
	#[case("click 1", "expected 2 coordinates, got 1")]
	#[case("mode circle", "unknown draw mode 'circle'")]
	#[case("key", "expected 1 argument, got 0")]
	fn parse_errors(#[case] line: &str, #[case] message: &str) {
		assert_eq!(line.parse::<Step>().unwrap_err().to_string(), message);
	}

	#[test]
	fn script_errors_name_the_line() {
		let error = parse_script("# comment\n\nmode line\nclick x 0\n").unwrap_err();
		assert_eq!(format!("{error:#}"), "line 4: \"click x 0\": invalid x 'x': invalid float literal");
	}

	#[test]
	fn replay_script() {
		run_command(vec!["geodraw", "replay", "../testdata/replay_polygon.txt"]).unwrap();
		run_command(vec!["geodraw", "replay", "-c", "../testdata/editor.yml", "../testdata/replay_line.txt"]).unwrap();
	}
}
