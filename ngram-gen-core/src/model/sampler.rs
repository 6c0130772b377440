use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

use super::ngram::Ngram;
use super::variants::NgramVariants;
use crate::error::{Error, Result};

/// Source of the random choices made during generation.
///
/// Split out of the generator so that a deterministic implementation can
/// drive a walk in tests.
pub trait Sampler {
	/// Draws one successor from `variants`.
	///
	/// # Errors
	/// Returns an error if `variants` violates its weight invariants; callers
	/// must treat this as fatal.
	fn draw<'v>(&mut self, variants: &'v NgramVariants) -> Result<&'v Ngram>;

	/// Picks a uniform index in `0..len`. `len` is never 0.
	fn pick_index(&mut self, len: usize) -> usize;
}

/// Samples successors proportionally to their observed weight.
pub struct WeightedSampler<R: Rng> {
	rng: R,
}

impl<R: Rng> WeightedSampler<R> {
	pub fn new(rng: R) -> Self {
		Self { rng }
	}
}

impl WeightedSampler<ThreadRng> {
	/// Sampler backed by the thread-local generator.
	pub fn from_entropy() -> Self {
		Self::new(rand::rng())
	}
}

impl WeightedSampler<StdRng> {
	/// Sampler with a fixed seed. Useful for tests; the sequence is only
	/// stable for a given `rand` version.
	pub fn seeded(seed: u64) -> Self {
		Self::new(StdRng::seed_from_u64(seed))
	}
}

impl<R: Rng> Sampler for WeightedSampler<R> {
	/// Draws `r` uniformly in `0..total_weight` and returns the successor whose
	/// cumulative range contains it.
	///
	/// The scan walks the successors once, so the partition of
	/// `0..total_weight` is consistent for the whole draw even though the
	/// enumeration order itself is unspecified.
	fn draw<'v>(&mut self, variants: &'v NgramVariants) -> Result<&'v Ngram> {
		let total = variants.total_weight();
		if total == 0 {
			return Err(Error::EmptyDistribution(describe(variants)));
		}

		let mut r = self.rng.random_range(0..total);
		for (next, weight) in variants.iter() {
			if r < weight {
				return Ok(next);
			}
			r -= weight;
		}

		Err(Error::InconsistentWeights(describe(variants)))
	}

	fn pick_index(&mut self, len: usize) -> usize {
		self.rng.random_range(0..len)
	}
}

/// Names a distribution in errors by one of its successors.
fn describe(variants: &NgramVariants) -> String {
	variants
		.iter()
		.next()
		.map(|(next, _)| format!("-> {next}"))
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ngram(s: &str) -> Ngram {
		Ngram::parse(s).unwrap()
	}

	#[test]
	fn single_successor_is_always_drawn() {
		let mut variants = NgramVariants::default();
		variants.increment(ngram("bcd"));

		let mut sampler = WeightedSampler::seeded(7);
		for _ in 0..100 {
			assert_eq!(sampler.draw(&variants).unwrap().as_str(), "bcd");
		}
	}

	#[test]
	fn draws_follow_weights() {
		let mut variants = NgramVariants::default();
		variants.add_weight(ngram("x"), 3);
		variants.add_weight(ngram("y"), 1);

		let mut sampler = WeightedSampler::seeded(42);
		let trials: u32 = 40_000;
		let mut x: u32 = 0;
		for _ in 0..trials {
			if sampler.draw(&variants).unwrap().as_str() == "x" {
				x += 1;
			}
		}
		let ratio = f64::from(x) / f64::from(trials);
		assert!((ratio - 0.75).abs() < 0.02, "x drawn with ratio {ratio}");
	}

	#[test]
	fn saturated_total_still_draws() {
		let mut variants = NgramVariants::default();
		for s in ["x", "y", "z"] {
			variants.add_weight(ngram(s), i64::MAX as u64);
		}
		assert_eq!(variants.total_weight(), u64::MAX);

		let mut sampler = WeightedSampler::seeded(5);
		for _ in 0..1000 {
			assert!(sampler.draw(&variants).is_ok());
		}
	}

	#[test]
	fn empty_distribution_is_an_error() {
		let variants = NgramVariants::default();
		let mut sampler = WeightedSampler::from_entropy();
		assert!(matches!(sampler.draw(&variants), Err(Error::EmptyDistribution(_))));
	}

	#[test]
	fn pick_index_stays_in_range() {
		let mut sampler = WeightedSampler::seeded(1);
		for len in 1..50 {
			assert!(sampler.pick_index(len) < len);
		}
	}
}
