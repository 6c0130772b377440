use std::path::Path;

use log::info;
use rusqlite::{Connection, params};

use super::TransitionStore;
use crate::error::{Result, StorageContext};
use crate::model::index::NgramIndex;

/// Stores transitions in a single `ngrams` table.
///
/// `(ngram, nextNgram)` is the primary key, so `INSERT OR REPLACE` gives the
/// upsert semantics the save contract needs.
pub struct SqliteStore {
	db: Connection,
}

impl SqliteStore {
	const SCHEMA: &'static str = r"
		CREATE TABLE IF NOT EXISTS ngrams (
			ngram TEXT NOT NULL,
			nextNgram TEXT NOT NULL,
			weight INTEGER NOT NULL,
			PRIMARY KEY (ngram, nextNgram)
		);
	";

	/// Opens or creates the database at `path`.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		let db = Connection::open(path.as_ref()).storage("open")?;
		Self::initialize(db)
	}

	/// Opens a private in-memory database (for testing).
	pub fn open_in_memory() -> Result<Self> {
		let db = Connection::open_in_memory().storage("open")?;
		Self::initialize(db)
	}

	fn initialize(db: Connection) -> Result<Self> {
		db.execute_batch(Self::SCHEMA).storage("create schema")?;
		Ok(Self { db })
	}

	/// Number of stored transitions.
	pub fn row_count(&self) -> Result<u64> {
		self.db
			.query_row("SELECT COUNT(*) FROM ngrams", [], |row| row.get::<_, i64>(0))
			.map(|count| count as u64)
			.storage("count")
	}

	/// Stored weight of one transition, if present.
	pub fn weight(&self, ngram: &str, next: &str) -> Result<Option<u64>> {
		let mut stmt = self
			.db
			.prepare("SELECT weight FROM ngrams WHERE ngram = ?1 AND nextNgram = ?2")
			.storage("prepare weight query")?;
		let mut rows = stmt.query(params![ngram, next]).storage("query weight")?;
		match rows.next().storage("read weight")? {
			Some(row) => Ok(Some(row.get::<_, i64>(0).storage("read weight")?.max(0) as u64)),
			None => Ok(None),
		}
	}
}

impl TransitionStore for SqliteStore {
	fn load(&mut self, order: usize) -> Result<NgramIndex> {
		let mut index = NgramIndex::new(order)?;
		let mut stmt = self
			.db
			.prepare("SELECT ngram, nextNgram, weight FROM ngrams")
			.storage("prepare load")?;
		let rows = stmt
			.query_map([], |row| {
				let ngram: String = row.get(0)?;
				let next: String = row.get(1)?;
				let weight: i64 = row.get(2)?;
				Ok((ngram, next, weight))
			})
			.storage("load")?;

		for row in rows {
			let (ngram, next, weight) = row.storage("load row")?;
			// Negative weights cannot be produced by `save`; treat them as absent.
			index.insert_weight(&ngram, &next, weight.max(0) as u64)?;
		}

		info!("loaded {} n-grams ({} transitions)", index.len(), index.transition_count());
		Ok(index)
	}

	fn save(&mut self, index: &NgramIndex) -> Result<usize> {
		let tx = self.db.transaction().storage("begin")?;
		let mut written = 0;
		{
			let mut stmt = tx
				.prepare("INSERT OR REPLACE INTO ngrams (ngram, nextNgram, weight) VALUES (?1, ?2, ?3)")
				.storage("prepare save")?;
			for (ngram, next, weight) in index.triples() {
				let weight = i64::try_from(weight).unwrap_or(i64::MAX);
				stmt.execute(params![ngram.as_str(), next.as_str(), weight]).storage("save")?;
				written += 1;
			}
		}
		tx.commit().storage("commit")?;

		info!("saved {written} transitions");
		Ok(written)
	}
}
