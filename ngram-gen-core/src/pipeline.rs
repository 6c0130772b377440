use std::io::Write;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::error::Result;
use crate::model::generator::Generator;
use crate::model::index::NgramIndex;
use crate::model::ingest::{BoundaryPolicy, Ingestor, ingest_parallel};
use crate::model::sampler::Sampler;
use crate::store::TransitionStore;

/// Default number of runes per n-gram.
pub const DEFAULT_ORDER: usize = 3;

/// Parameters of a training run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainOptions {
	/// Number of runes per n-gram.
	pub order: usize,

	/// Window behavior between sources (sequential mode only).
	pub policy: BoundaryPolicy,

	/// `Some(n)` ingests on `n` threads (`0` = one per CPU); `None` ingests
	/// sequentially on the calling thread.
	pub workers: Option<usize>,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self { order: DEFAULT_ORDER, policy: BoundaryPolicy::default(), workers: None }
	}
}

/// Summary of a training run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainReport {
	pub sources: usize,
	/// Distinct n-grams in storage before the run.
	pub states_loaded: usize,
	/// Distinct n-grams after the run.
	pub states: usize,
	/// Transitions observed in the new sources.
	pub observations: u64,
	/// Triples written back to storage.
	pub written: usize,
}

/// Loads the model, ingests `sources` into it and saves it back.
///
/// This is the only supported way to grow a stored model: the store's save
/// overwrites weights, so skipping the load would silently discard the
/// stored history of every pair seen again.
///
/// # Errors
/// Any storage or source error aborts the run before anything is saved.
pub fn train<S>(store: &mut S, sources: &[PathBuf], options: &TrainOptions) -> Result<TrainReport>
where
	S: TransitionStore + ?Sized,
{
	let mut index = store.load(options.order)?;
	let states_loaded = index.len();
	let observed_before = index.total_observations();
	info!("loaded {states_loaded} n-grams, reading {} sources", sources.len());

	match options.workers {
		Some(workers) => {
			if options.policy == BoundaryPolicy::Chain {
				warn!("parallel ingestion resets the window at every source boundary");
			}
			let fresh = ingest_parallel(options.order, sources, workers)?;
			index.merge(&fresh)?;
		}
		None => {
			let mut ingestor = Ingestor::new(options.order, options.policy)?;
			debug!("sequential ingestion, {:?} at source boundaries", ingestor.policy());
			for (i, path) in sources.iter().enumerate() {
				debug!("processing source {}/{}: {}", i + 1, sources.len(), path.display());
				ingestor.ingest_file(path, &mut index)?;
			}
		}
	}

	let observations = index.total_observations().saturating_sub(observed_before);
	info!("read {} n-grams, {observations} new observations", index.len());

	let written = store.save(&index)?;
	Ok(TrainReport {
		sources: sources.len(),
		states_loaded,
		states: index.len(),
		observations,
		written,
	})
}

/// Loads the model and generates `length` runes after a random start.
///
/// # Errors
/// Storage errors, or `EmptyModel` if nothing was ever stored.
pub fn generate_text<S, R>(store: &mut S, order: usize, length: usize, sampler: R) -> Result<String>
where
	S: TransitionStore + ?Sized,
	R: Sampler,
{
	let index = store.load(order)?;
	Generator::new(&index, sampler).generate(length)
}

/// Writes every state with its successors, sorted, followed by the state
/// count.
pub fn dump<W: Write>(index: &NgramIndex, mut out: W) -> std::io::Result<()> {
	let mut states: Vec<_> = index.iter().collect();
	states.sort_by(|a, b| a.0.cmp(b.0));

	for (ngram, variants) in states {
		writeln!(out, "{ngram}:")?;
		let mut successors: Vec<_> = variants.iter().collect();
		successors.sort();
		for (next, weight) in successors {
			writeln!(out, "\t{next} -> {weight}")?;
		}
		writeln!(out)?;
	}
	writeln!(out, "{} ngrams collected", index.len())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dump_is_sorted() {
		let index = NgramIndex::from_triples(2, [("ba", "ac", 1), ("ab", "bz", 2), ("ab", "ba", 5)]).unwrap();
		let mut out = Vec::new();
		dump(&index, &mut out).unwrap();
		assert_eq!(
			String::from_utf8(out).unwrap(),
			"ab:\n\tba -> 5\n\tbz -> 2\n\nba:\n\tac -> 1\n\n2 ngrams collected\n"
		);
	}
}
