use std::collections::HashMap;

use super::ngram::Ngram;

/// Observed successors of a single n-gram.
///
/// Conceptually, this is the set of outgoing edges of one node in the Markov
/// chain, each edge weighted by how many times it was observed.
///
/// ## Invariants
/// - `total_weight` is the sum of every weight in `weights`, saturating at
///   `u64::MAX` like each individual weight
/// - Each stored weight is strictly positive
///
/// Both fields are private: the only ways to change them are `increment` and
/// the crate-internal `add_weight`, which update the pair together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NgramVariants {
	/// Successor n-gram to number of observations.
	weights: HashMap<Ngram, u64>,
	total_weight: u64,
}

impl NgramVariants {
	/// Records one more observation of `successor`.
	pub fn increment(&mut self, successor: Ngram) {
		self.add_weight(successor, 1);
	}

	/// Adds `weight` observations of `successor` at once.
	///
	/// A zero weight is ignored so that no successor is ever stored with a
	/// zero count.
	pub(crate) fn add_weight(&mut self, successor: Ngram, weight: u64) {
		if weight == 0 {
			return;
		}
		let stored = self.weights.entry(successor).or_insert(0);
		*stored = stored.saturating_add(weight);
		self.total_weight = self.total_weight.saturating_add(weight);
	}

	/// Sum of all successor weights.
	pub fn total_weight(&self) -> u64 {
		self.total_weight
	}

	/// Weight recorded for `successor`, or 0 if it was never observed.
	pub fn weight(&self, successor: &str) -> u64 {
		self.weights.get(successor).copied().unwrap_or(0)
	}

	/// Number of distinct successors.
	pub fn len(&self) -> usize {
		self.weights.len()
	}

	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	/// Iterates over `(successor, weight)` pairs in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (&Ngram, u64)> {
		self.weights.iter().map(|(ngram, weight)| (ngram, *weight))
	}

	/// Adds every successor weight of `other` into this distribution.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (successor, weight) in other.iter() {
			self.add_weight(successor.clone(), weight);
		}
	}
}
