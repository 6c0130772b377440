use log::debug;

use super::index::NgramIndex;
use super::ngram::Ngram;
use super::sampler::Sampler;
use crate::error::{Error, Result};

/// Upper bound on the up-front output reservation; longer walks grow the
/// buffer as they go.
const MAX_RESERVED_RUNES: usize = 64 * 1024;

/// Bytes to reserve for a seed of `seed_len` bytes followed by `length` runes.
fn initial_capacity(seed_len: usize, length: usize) -> usize {
	seed_len.saturating_add(length.min(MAX_RESERVED_RUNES))
}

/// Markov walk over an `NgramIndex`.
///
/// # Responsibilities
/// - Pick a starting n-gram uniformly among the known states
/// - Repeatedly draw a successor and append its last rune to the output
/// - Restart from a random state when the walk reaches an n-gram with no
///   recorded continuation (a dead end)
///
/// The key set is materialized once and sorted, so `Sampler::pick_index`
/// always addresses the same array for a given index.
pub struct Generator<'a, S: Sampler> {
	index: &'a NgramIndex,
	keys: Vec<&'a Ngram>,
	sampler: S,
	dead_ends: usize,
}

impl<'a, S: Sampler> Generator<'a, S> {
	pub fn new(index: &'a NgramIndex, sampler: S) -> Self {
		let mut keys: Vec<&Ngram> = index.keys().collect();
		keys.sort();
		Self { index, keys, sampler, dead_ends: 0 }
	}

	/// Number of dead ends met since the generator was created.
	pub fn dead_ends(&self) -> usize {
		self.dead_ends
	}

	fn random_key(&mut self) -> Result<&'a Ngram> {
		if self.keys.is_empty() {
			return Err(Error::EmptyModel);
		}
		let i = self.sampler.pick_index(self.keys.len());
		Ok(self.keys[i])
	}

	/// Generates text of `length` appended runes after the starting n-gram.
	///
	/// The returned string holds the full starting n-gram followed by exactly
	/// `length` runes. There is no early termination: a walk may cycle
	/// through the same states for as long as it is asked to.
	///
	/// # Errors
	/// - `EmptyModel` if the index has no states
	/// - `EmptyDistribution` / `InconsistentWeights` if the sampler detects a
	///   broken distribution
	pub fn generate(&mut self, length: usize) -> Result<String> {
		let index = self.index;
		let mut current = self.random_key()?;
		let mut text = String::with_capacity(initial_capacity(current.as_str().len(), length));
		text.push_str(current.as_str());

		for _ in 0..length {
			let next = match index.lookup(current.as_str()) {
				Some(variants) => self.sampler.draw(variants)?,
				None => {
					self.dead_ends += 1;
					debug!("dead end at {current:?}, restarting from a random state");
					self.random_key()?
				}
			};
			if let Some(rune) = next.last_rune() {
				text.push(rune);
			}
			current = next;
		}

		Ok(text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::sampler::WeightedSampler;
	use crate::model::variants::NgramVariants;

	/// Always takes the first key and the lexicographically smallest successor.
	struct FirstSampler;

	impl Sampler for FirstSampler {
		fn draw<'v>(&mut self, variants: &'v NgramVariants) -> Result<&'v Ngram> {
			variants
				.iter()
				.map(|(next, _)| next)
				.min()
				.ok_or_else(|| Error::EmptyDistribution(String::new()))
		}

		fn pick_index(&mut self, _len: usize) -> usize {
			0
		}
	}

	fn index(triples: &[(&str, &str, u64)]) -> NgramIndex {
		NgramIndex::from_triples(3, triples.iter().copied()).unwrap()
	}

	#[test]
	fn empty_model_is_an_error() {
		let index = NgramIndex::new(3).unwrap();
		let mut generator = Generator::new(&index, WeightedSampler::from_entropy());
		assert!(matches!(generator.generate(10), Err(Error::EmptyModel)));
	}

	#[test]
	fn deterministic_walk() {
		let index = index(&[
			("abc", "bcd", 1),
			("abc", "bcz", 5),
			("bcd", "cda", 1),
			("cda", "dab", 1),
			("dab", "abc", 1),
		]);
		let mut generator = Generator::new(&index, FirstSampler);
		let text = generator.generate(8).unwrap();
		assert_eq!(text, "abcdabcdabc");
		assert_eq!(text.chars().count(), 3 + 8);
		assert_eq!(generator.dead_ends(), 0);
	}

	#[test]
	fn zero_length_returns_seed() {
		let index = index(&[("abc", "bcd", 1)]);
		let mut generator = Generator::new(&index, FirstSampler);
		assert_eq!(generator.generate(0).unwrap(), "abc");
	}

	#[test]
	fn dead_end_restarts_walk() {
		// "bcd" never appears as a key, so the walk restarts from "abc".
		let index = index(&[("abc", "bcd", 1)]);
		let mut generator = Generator::new(&index, FirstSampler);
		let text = generator.generate(4).unwrap();
		assert_eq!(text, "abcdcdc");
		assert_eq!(generator.dead_ends(), 2);
	}

	#[test]
	fn huge_length_does_not_size_the_buffer() {
		assert_eq!(initial_capacity(3, 10), 13);
		assert_eq!(initial_capacity(3, usize::MAX - 1), 3 + MAX_RESERVED_RUNES);
		assert_eq!(initial_capacity(usize::MAX, usize::MAX), usize::MAX);
	}

	#[test]
	fn long_walk_past_reservation() {
		let index = index(&[("abc", "bcd", 1)]);
		let mut generator = Generator::new(&index, FirstSampler);
		let length = MAX_RESERVED_RUNES * 2 + 1;
		let text = generator.generate(length).unwrap();
		assert_eq!(text.chars().count(), 3 + length);
	}

	#[test]
	fn random_walk_has_requested_length() {
		let index = index(&[("héé", "éél", 2), ("éél", "élo", 1), ("élo", "loh", 1), ("loh", "ohé", 1)]);
		let mut generator = Generator::new(&index, WeightedSampler::seeded(3));
		for length in [0, 1, 17, 250] {
			assert_eq!(generator.generate(length).unwrap().chars().count(), 3 + length);
		}
	}
}
