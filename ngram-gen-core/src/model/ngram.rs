use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A fixed-length sequence of unicode code points.
///
/// An `Ngram` is a state of the Markov chain. Two n-grams are the same state
/// when they hold the same runes, so equality, ordering and hashing all work
/// on the underlying string value.
///
/// The rune count is not stored: the owning `NgramIndex` knows its order and
/// validates lengths at its boundaries.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Ngram(String);

impl Ngram {
	/// Builds an n-gram from a window of runes.
	pub fn from_runes(runes: &[char]) -> Self {
		Self(runes.iter().collect())
	}

	/// Parses an n-gram read back from storage.
	///
	/// # Errors
	/// Returns `InvalidNgram` if `s` is empty.
	pub fn parse(s: &str) -> Result<Self> {
		if s.is_empty() {
			return Err(Error::InvalidNgram(s.to_owned()));
		}
		Ok(Self(s.to_owned()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Number of runes (not bytes).
	pub fn rune_count(&self) -> usize {
		self.0.chars().count()
	}

	/// The rune a successor contributes to generated text.
	///
	/// Always `Some` for n-grams built through `from_runes` with a
	/// non-empty window or through `parse`.
	pub fn last_rune(&self) -> Option<char> {
		self.0.chars().next_back()
	}
}

impl fmt::Display for Ngram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for Ngram {
	fn borrow(&self) -> &str {
		&self.0
	}
}
