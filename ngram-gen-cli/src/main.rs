use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use ngram_gen_core::io::resolve_sources;
use ngram_gen_core::pipeline::{self, DEFAULT_ORDER, TrainOptions};
use ngram_gen_core::store::{SnapshotStore, SqliteStore, TransitionStore};
use ngram_gen_core::{BoundaryPolicy, WeightedSampler};

#[derive(Parser)]
#[command(name = "ngram-gen")]
#[command(version, about = "Learn a character n-gram model from text and generate new text from it")]
struct Cli {
	/// What to do with the model
	#[arg(short, long, value_enum, default_value_t = Mode::Text, env = "NGRAM_MODE")]
	mode: Mode,

	/// Number of runes to generate after the starting n-gram
	#[arg(short, long, default_value_t = 1000, env = "NGRAM_LENGTH")]
	length: usize,

	/// Number of runes per n-gram
	#[arg(short = 'n', long = "ngram", default_value_t = DEFAULT_ORDER, env = "NGRAM_ORDER")]
	order: usize,

	/// Model file
	#[arg(long, default_value = "ngrams.db", env = "NGRAM_DB")]
	db: PathBuf,

	/// Storage backend of the model file
	#[arg(long, value_enum, default_value_t = Backend::Sqlite, env = "NGRAM_STORE")]
	store: Backend,

	/// Chain the end of each source to the start of the next
	#[arg(long, conflicts_with = "parallel")]
	chain_sources: bool,

	/// Ingest sources on several threads
	#[arg(long)]
	parallel: bool,

	/// Worker threads for --parallel (0 = one per CPU)
	#[arg(long, default_value_t = 0, requires = "parallel")]
	workers: usize,

	/// Seed for the sampler
	#[arg(long, env = "NGRAM_SEED")]
	seed: Option<u64>,

	/// Corpus files; read one path per line from stdin when omitted
	sources: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
	/// Ingest the sources into the model
	Read,
	/// Generate text from the model
	Text,
	/// Print every learned transition
	Dump,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
	Sqlite,
	Snapshot,
}

fn open_store(cli: &Cli) -> Result<Box<dyn TransitionStore>> {
	Ok(match cli.store {
		Backend::Sqlite => Box::new(
			SqliteStore::open(&cli.db).with_context(|| format!("opening {}", cli.db.display()))?,
		),
		Backend::Snapshot => Box::new(SnapshotStore::new(&cli.db)),
	})
}

fn read(cli: Cli, store: &mut dyn TransitionStore) -> Result<()> {
	let sources = resolve_sources(cli.sources, io::stdin().lock()).context("reading source list")?;
	let options = TrainOptions {
		order: cli.order,
		policy: if cli.chain_sources { BoundaryPolicy::Chain } else { BoundaryPolicy::Reset },
		workers: cli.parallel.then_some(cli.workers),
	};

	let report = pipeline::train(store, &sources, &options).context("training")?;
	info!(
		"{} sources: {} -> {} n-grams, {} observations, {} rows written",
		report.sources, report.states_loaded, report.states, report.observations, report.written
	);
	Ok(())
}

fn text(cli: &Cli, store: &mut dyn TransitionStore) -> Result<()> {
	let text = match cli.seed {
		Some(seed) => pipeline::generate_text(store, cli.order, cli.length, WeightedSampler::seeded(seed)),
		None => pipeline::generate_text(store, cli.order, cli.length, WeightedSampler::from_entropy()),
	}
	.context("generating text")?;

	let mut stdout = io::stdout().lock();
	writeln!(stdout, "{text}")?;
	Ok(())
}

fn dump(cli: &Cli, store: &mut dyn TransitionStore) -> Result<()> {
	let index = store.load(cli.order).context("loading statistics")?;
	pipeline::dump(&index, io::stdout().lock())?;
	Ok(())
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	let mut store = open_store(&cli)?;

	match cli.mode {
		Mode::Read => read(cli, store.as_mut()),
		Mode::Text => text(&cli, store.as_mut()),
		Mode::Dump => dump(&cli, store.as_mut()),
	}
}
