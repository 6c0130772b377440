//! Persistence adapters for the transition table.
//!
//! A store holds `(ngram, next, weight)` triples keyed by the
//! `(ngram, next)` pair. Saving upserts: the stored weight of every pair
//! present in memory is replaced by the in-memory weight, and pairs absent
//! from memory are left untouched. Saving is therefore only cumulative when
//! the in-memory index was loaded from the same store first;
//! `pipeline::train` performs that sequence as one operation.

use crate::error::Result;
use crate::model::index::NgramIndex;

/// SQLite-backed store.
pub mod sqlite;

/// Single-file binary store.
pub mod snapshot;

pub use snapshot::SnapshotStore;
pub use sqlite::SqliteStore;

/// Loads and saves an `NgramIndex`.
pub trait TransitionStore {
	/// Loads every stored transition into a fresh index of `order`.
	///
	/// # Errors
	/// Fails if the store cannot be read or holds n-grams of another order.
	fn load(&mut self, order: usize) -> Result<NgramIndex>;

	/// Upserts every transition of `index`. Returns the number of triples
	/// written.
	fn save(&mut self, index: &NgramIndex) -> Result<usize>;
}
