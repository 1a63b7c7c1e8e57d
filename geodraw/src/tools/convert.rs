use anyhow::{Result, bail};
use geodraw_measure::units::{Unit, UnitKind, convert};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// value to convert
	#[arg(allow_negative_numbers = true)]
	value: f64,

	/// unit of the value: M, KM (length), M2, KM2, MU (area), D, M, S, R (angle)
	#[arg()]
	from: String,

	/// target unit of the same kind
	#[arg()]
	to: String,

	/// unit kind: length, area or angle.
	/// Guessed from the two units if omitted, trying length, area and angle in that order.
	#[arg(long, short, verbatim_doc_comment)]
	kind: Option<UnitKind>,

	/// number of decimals
	#[arg(long, short, default_value_t = 6)]
	precision: usize,
}

/// Parses both tokens as the given kind, or as the first kind both tokens belong to.
fn resolve_units(from: &str, to: &str, kind: Option<UnitKind>) -> Result<(Unit, Unit)> {
	if let Some(kind) = kind {
		return Ok((Unit::parse(kind, from)?, Unit::parse(kind, to)?));
	}
	for kind in [UnitKind::Length, UnitKind::Area, UnitKind::Angle] {
		if let (Ok(a), Ok(b)) = (Unit::parse(kind, from), Unit::parse(kind, to)) {
			return Ok((a, b));
		}
	}
	bail!("'{from}' and '{to}' are not units of the same kind")
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let (from, to) = resolve_units(&arguments.from, &arguments.to, arguments.kind)?;
	log::debug!("converting {} {:?} into {:?}", arguments.value, from, to);
	let value = convert(arguments.value, from, to)?;
	println!("{value:.prec$} {}", to.description().symbol, prec = arguments.precision);
	Ok(())
}
