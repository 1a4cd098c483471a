/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use anyhow::{bail, Error};
use clap::{Parser, ValueEnum};
use ledr_smart::config::config_file::{Config, Hooks, Predict, Target};
use ledr_smart::gl::entry::Entry;
use ledr_smart::gl::ledger::{print, Ledger};
use ledr_smart::import::detector::DuplicateDetector;
use ledr_smart::import::file_importer::LedgerFileImporter;
use ledr_smart::import::importer::{apply_hooks, Importer, ImporterHook};
use ledr_smart::import::trimmer::OldEntryTrimmer;
use ledr_smart::parsing::filesystem::Filesystem;
use ledr_smart::parsing::parser::Parser as LedgerParser;
use ledr_smart::predict::payees::PredictPayees;
use ledr_smart::predict::postings::PredictPostings;
use ledr_smart::predict::predictor::PredictorOptions;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
	name = "ledr-smart",
	version = "0.1",
	about = "Predicts accounts and payees for imported transactions"
)]
struct Cli {
	// ----------------
	// -- POSITIONAL --
	// ----------------
	/// The command to execute
	command: Directive,

	/// The file to import, for the extract command
	#[arg(required = false)]
	import_file: Option<String>,

	// -----------
	// -- FLAGS --
	// -----------
	/// Specifies the ledger file that holds existing entries
	#[arg(short)]
	file: String,

	/// Train on this ledger file instead of the one given with -f
	#[arg(short, long)]
	training: Option<String>,

	/// Custom config file location
	/// (default: ~/.config/ledr-smart/config.toml)
	#[arg(long)]
	config: Option<String>,

	/// Only learn from transactions touching this account
	#[arg(short, long)]
	account: Option<String>,

	/// Log debug output to stderr
	#[arg(short, long)]
	verbose: bool,
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
enum Directive {
	Extract, // import a file and predict what it is missing
	Fmt,     // format and output the ledger's entries
}

fn main() -> Result<(), Error> {
	let args = Cli::parse();
	init_logging(args.verbose);

	let existing = read_ledger(&args.file)?;

	match args.command {
		Directive::Fmt => print(&existing),
		Directive::Extract => {
			let import_file = match &args.import_file {
				Some(f) => f,
				None => bail!("No import file specified"),
			};

			let config = Filesystem::new().get_config(args.config.as_ref())?;
			let training = match &args.training {
				Some(path) => Some(read_ledger(path)?),
				None => None,
			};

			let importer = build_importer(&args, config, training)?;
			if !importer.identify(import_file) {
				bail!("{} cannot import {}", importer.name(), import_file);
			}

			let entries = importer.extract(import_file, &existing)?;
			print(&entries);
		},
	}

	Ok(())
}

/// RUST_LOG takes priority over -v; otherwise only warnings are shown.
fn init_logging(verbose: bool) {
	let filter = if std::env::var("RUST_LOG").is_ok() {
		EnvFilter::from_default_env()
	} else if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::new("warn")
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_target(false)
				.with_writer(std::io::stderr)
				.compact(),
		)
		.init();
}

fn read_ledger(path: &str) -> Result<Vec<Entry>, Error> {
	let mut ledger = Ledger::new();
	LedgerParser::new().parse(path, &mut ledger)?;
	Ok(ledger.take_entries())
}

/// Assembles the ledger file importer with the hooks the config asks for.
/// Duplicates are marked before old entries are trimmed, and predictions
/// run last so that they see the trimmed set.
fn build_importer(
	args: &Cli,
	config: Config,
	training: Option<Vec<Entry>>,
) -> Result<impl Importer, Error> {
	let mut hooks: Vec<Box<dyn ImporterHook>> = vec![];

	let hook_config = config.hooks.unwrap_or_default();
	add_cleanup_hooks(&mut hooks, &hook_config);

	let mut predict = config.predict.unwrap_or_default();
	if args.account.is_some() {
		predict.account = args.account.clone();
	}
	add_predictors(&mut hooks, &predict, training)?;

	debug!("running {} import hooks", hooks.len());
	Ok(apply_hooks(
		Box::new(LedgerFileImporter::new(predict.account.clone())),
		hooks,
	))
}

fn add_cleanup_hooks(hooks: &mut Vec<Box<dyn ImporterHook>>, config: &Hooks) {
	if config.detect_duplicates.unwrap_or(false) {
		let detector = match config.window_days {
			Some(days) => DuplicateDetector::new(days),
			None => DuplicateDetector::default(),
		};
		hooks.push(Box::new(detector));
	}

	if config.trim_old_entries.unwrap_or(false) {
		hooks.push(Box::new(OldEntryTrimmer::new(
			config.only_trim_duplicates.unwrap_or(true),
		)));
	}
}

fn add_predictors(
	hooks: &mut Vec<Box<dyn ImporterHook>>,
	predict: &Predict,
	training: Option<Vec<Entry>>,
) -> Result<(), Error> {
	if is_enabled(predict.postings.as_ref()) {
		let mut options =
			PredictorOptions::from_config(predict, predict.postings.as_ref())?;
		options.training_data = training.clone();
		hooks.push(Box::new(PredictPostings::new(options)));
	}

	if is_enabled(predict.payees.as_ref()) {
		let mut options =
			PredictorOptions::from_config(predict, predict.payees.as_ref())?;
		options.training_data = training;
		hooks.push(Box::new(PredictPayees::new(options)));
	}

	Ok(())
}

/// A predictor runs unless its section turns it off.
fn is_enabled(target: Option<&Target>) -> bool {
	target.and_then(|t| t.enabled).unwrap_or(true)
}
