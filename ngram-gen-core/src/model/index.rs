use std::collections::HashMap;

use super::ngram::Ngram;
use super::variants::NgramVariants;
use crate::error::{Error, Result};

/// The learned transition table of a character-level Markov chain.
///
/// Maps every observed n-gram to the distribution of n-grams that followed
/// it. The index is built empty, optionally filled from storage, grown by
/// ingestion and finally either discarded or saved back. Entries are never
/// removed and weights only grow.
///
/// # Invariants
/// - `order` is always >= 1
/// - Every key and successor built by ingestion has exactly `order` runes;
///   triples loaded from storage are checked against `order`
/// - Every stored `NgramVariants` is non-empty
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NgramIndex {
	/// Number of runes per n-gram
	order: usize,

	entries: HashMap<Ngram, NgramVariants>,
}

impl NgramIndex {
	/// Creates an empty index for n-grams of `order` runes.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `order == 0`.
	pub fn new(order: usize) -> Result<Self> {
		if order == 0 {
			return Err(Error::InvalidOrder(order));
		}
		Ok(Self { order, entries: HashMap::new() })
	}

	/// Composes an index from stored `(ngram, next, weight)` triples.
	///
	/// Equivalent to one `insert_weight` per triple on an empty index.
	pub fn from_triples<I, S>(order: usize, triples: I) -> Result<Self>
	where
		I: IntoIterator<Item = (S, S, u64)>,
		S: AsRef<str>,
	{
		let mut index = Self::new(order)?;
		for (ngram, next, weight) in triples {
			index.insert_weight(ngram.as_ref(), next.as_ref(), weight)?;
		}
		Ok(index)
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Records one observation of `ngram` being followed by `next`.
	///
	/// Creates the state and the successor entry as needed.
	pub fn add(&mut self, ngram: Ngram, next: Ngram) {
		debug_assert_eq!(ngram.rune_count(), self.order);
		debug_assert_eq!(next.rune_count(), self.order);
		self.entries.entry(ngram).or_default().increment(next);
	}

	/// Adds `weight` observations of a stored transition.
	///
	/// # Errors
	/// - `InvalidNgram` if either side is empty
	/// - `OrderMismatch` if either side does not have `order` runes
	pub fn insert_weight(&mut self, ngram: &str, next: &str, weight: u64) -> Result<()> {
		let ngram = self.checked(ngram)?;
		let next = self.checked(next)?;
		if weight == 0 {
			return Ok(());
		}
		self.entries.entry(ngram).or_default().add_weight(next, weight);
		Ok(())
	}

	fn checked(&self, s: &str) -> Result<Ngram> {
		let ngram = Ngram::parse(s)?;
		let found = ngram.rune_count();
		if found != self.order {
			return Err(Error::OrderMismatch { expected: self.order, found });
		}
		Ok(ngram)
	}

	/// Successor distribution of `ngram`, if it was ever observed.
	pub fn lookup(&self, ngram: &str) -> Option<&NgramVariants> {
		self.entries.get(ngram)
	}

	/// Adds every transition weight of `other` into this index.
	///
	/// Merging is additive, so the order in which partial indexes are merged
	/// does not change the result.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the two indexes have different orders.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.order != other.order {
			return Err(Error::OrderMismatch { expected: self.order, found: other.order });
		}

		for (ngram, variants) in &other.entries {
			if let Some(existing) = self.entries.get_mut(ngram) {
				existing.merge(variants);
			} else {
				self.entries.insert(ngram.clone(), variants.clone());
			}
		}

		Ok(())
	}

	/// Number of distinct n-grams with at least one successor.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Number of distinct `(ngram, next)` pairs.
	pub fn transition_count(&self) -> usize {
		self.entries.values().map(NgramVariants::len).sum()
	}

	/// Sum of every transition weight, saturating at `u64::MAX`.
	pub fn total_observations(&self) -> u64 {
		self.entries
			.values()
			.map(NgramVariants::total_weight)
			.fold(0, u64::saturating_add)
	}

	/// Iterates over the known n-grams in unspecified order.
	pub fn keys(&self) -> impl Iterator<Item = &Ngram> {
		self.entries.keys()
	}

	/// Iterates over each state with its successor distribution.
	pub fn iter(&self) -> impl Iterator<Item = (&Ngram, &NgramVariants)> {
		self.entries.iter()
	}

	/// Enumerates every `(ngram, next, weight)` triple in unspecified order.
	pub fn triples(&self) -> impl Iterator<Item = (&Ngram, &Ngram, u64)> {
		self.entries
			.iter()
			.flat_map(|(ngram, variants)| variants.iter().map(move |(next, weight)| (ngram, next, weight)))
	}
}
