use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::debug;

use super::index::NgramIndex;
use super::ngram::Ngram;
use crate::error::{Error, Result};
use crate::io::open_source;

/// What happens to the sliding window when one input source ends and the
/// next begins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryPolicy {
	/// Start every source with an empty window: no transition ever spans
	/// two sources.
	#[default]
	Reset,
	/// Keep the window across sources, so the tail of one source is chained
	/// to the head of the next as if they were concatenated.
	Chain,
}

/// Turns a stream of runes into consecutive `(ngram, next)` observations.
///
/// The ingestor keeps the last `order` runes it has seen. Once the window is
/// full, every new rune slides it by one and the pair (previous window,
/// current window) is recorded in the index.
#[derive(Debug)]
pub struct Ingestor {
	order: usize,
	policy: BoundaryPolicy,
	window: VecDeque<char>,
	previous: Option<Ngram>,
}

impl Ingestor {
	/// # Errors
	/// Returns `InvalidOrder` if `order == 0`.
	pub fn new(order: usize, policy: BoundaryPolicy) -> Result<Self> {
		if order == 0 {
			return Err(Error::InvalidOrder(order));
		}
		Ok(Self { order, policy, window: VecDeque::with_capacity(order), previous: None })
	}

	pub fn policy(&self) -> BoundaryPolicy {
		self.policy
	}

	/// Feeds one rune. Returns `true` if a transition was recorded.
	pub fn feed_char(&mut self, rune: char, index: &mut NgramIndex) -> bool {
		if self.window.len() == self.order {
			self.window.pop_front();
		}
		self.window.push_back(rune);
		if self.window.len() < self.order {
			// Still filling the first window
			return false;
		}

		let current = Ngram::from_runes(self.window.make_contiguous());
		let recorded = match self.previous.take() {
			Some(previous) => {
				index.add(previous, current.clone());
				true
			}
			None => false,
		};
		self.previous = Some(current);
		recorded
	}

	/// Feeds every rune of `text`. Returns the number of transitions recorded.
	pub fn feed_str(&mut self, text: &str, index: &mut NgramIndex) -> usize {
		text.chars().filter(|rune| self.feed_char(*rune, index)).count()
	}

	/// Marks the end of the current source, applying the boundary policy.
	pub fn end_source(&mut self) {
		if self.policy == BoundaryPolicy::Reset {
			self.window.clear();
			self.previous = None;
		}
	}

	/// Ingests a whole source and ends it.
	///
	/// Invalid UTF-8 sequences are decoded as U+FFFD, one replacement rune
	/// per invalid sequence.
	pub fn ingest_reader<R: Read>(&mut self, mut reader: R, index: &mut NgramIndex) -> std::io::Result<usize> {
		let mut bytes = Vec::new();
		reader.read_to_end(&mut bytes)?;
		let recorded = self.feed_str(&String::from_utf8_lossy(&bytes), index);
		self.end_source();
		Ok(recorded)
	}

	/// Opens and ingests the file at `path`.
	///
	/// # Errors
	/// Returns `Source` naming `path` if it cannot be opened or read.
	pub fn ingest_file<P: AsRef<Path>>(&mut self, path: P, index: &mut NgramIndex) -> Result<usize> {
		let path = path.as_ref();
		let file = open_source(path)?;
		let recorded = self
			.ingest_reader(file, index)
			.map_err(|source| Error::Source { path: path.to_owned(), source })?;
		debug!("{}: {recorded} transitions", path.display());
		Ok(recorded)
	}
}

/// Ingests `paths` on several threads and merges the partial indexes.
///
/// Each worker owns a private index and ingestor, and the partial indexes
/// are merged into a single accumulator as they arrive. Since merging is
/// commutative, the result is the same as ingesting the sources one after
/// the other with `BoundaryPolicy::Reset`, which this mode always uses.
///
/// `workers == 0` uses one worker per CPU.
///
/// # Errors
/// Fails with the first error reported by a worker; nothing is merged into
/// the caller's model in that case.
pub fn ingest_parallel(order: usize, paths: &[PathBuf], workers: usize) -> Result<NgramIndex> {
	let mut final_index = NgramIndex::new(order)?;
	if paths.is_empty() {
		return Ok(final_index);
	}

	let workers = if workers == 0 { num_cpus::get() } else { workers };
	let chunk_size = paths.len().div_ceil(workers.max(1));

	let (tx, rx) = mpsc::channel();
	let mut handles = Vec::new();
	for chunk in paths.chunks(chunk_size) {
		let tx = tx.clone();
		let chunk: Vec<PathBuf> = chunk.to_vec();

		handles.push(thread::spawn(move || {
			let partial = ingest_chunk(order, &chunk);
			// The receiver outlives every worker
			let _ = tx.send(partial);
		}));
	}
	drop(tx);

	let mut failure = None;
	for partial in rx.iter() {
		match partial {
			Ok(partial) => final_index.merge(&partial)?,
			Err(e) => {
				failure.get_or_insert(e);
			}
		}
	}

	for handle in handles {
		if let Err(panic) = handle.join() {
			std::panic::resume_unwind(panic);
		}
	}

	match failure {
		Some(e) => Err(e),
		None => Ok(final_index),
	}
}

fn ingest_chunk(order: usize, paths: &[PathBuf]) -> Result<NgramIndex> {
	let mut index = NgramIndex::new(order)?;
	let mut ingestor = Ingestor::new(order, BoundaryPolicy::Reset)?;
	for path in paths {
		ingestor.ingest_file(path, &mut index)?;
	}
	Ok(index)
}
