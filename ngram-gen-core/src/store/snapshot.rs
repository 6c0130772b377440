use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use super::TransitionStore;
use crate::error::{Error, Result, StorageContext};
use crate::model::index::NgramIndex;
use crate::model::ngram::Ngram;

/// On-disk layout of a snapshot.
#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
	triples: Vec<(Ngram, Ngram, u64)>,
}

/// Keeps the transition table in one compact `postcard` file.
///
/// Honors the same upsert contract as `SqliteStore`: saving reads the
/// existing file, replaces the weights of the pairs present in memory and
/// writes everything back. A missing file loads as an empty index.
pub struct SnapshotStore {
	path: PathBuf,
}

impl SnapshotStore {
	pub fn new<P: AsRef<Path>>(path: P) -> Self {
		Self { path: path.as_ref().to_owned() }
	}

	fn read(&self) -> Result<Snapshot> {
		if !self.path.exists() {
			return Ok(Snapshot::default());
		}
		let bytes = fs::read(&self.path).map_err(|source| self.file_error("read", source))?;
		postcard::from_bytes(&bytes).storage("decode")
	}

	/// Writes next to the target first so a failed write never truncates an
	/// existing snapshot.
	fn write(&self, snapshot: &Snapshot) -> Result<()> {
		let bytes = postcard::to_stdvec(snapshot).storage("encode")?;
		let tmp = self.staging_path();
		fs::write(&tmp, bytes).map_err(|source| self.file_error("write", source))?;
		fs::rename(&tmp, &self.path).map_err(|source| self.file_error("rename", source))?;
		Ok(())
	}

	/// `<file name>.tmp` in the same directory, so the rename stays on one
	/// filesystem and never targets a sibling with another extension.
	fn staging_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
		name.push(".tmp");
		self.path.with_file_name(name)
	}

	fn file_error(&self, operation: &'static str, source: std::io::Error) -> Error {
		Error::SnapshotFile { operation, path: self.path.clone(), source }
	}
}

impl TransitionStore for SnapshotStore {
	fn load(&mut self, order: usize) -> Result<NgramIndex> {
		let snapshot = self.read()?;
		let index = NgramIndex::from_triples(
			order,
			snapshot.triples.iter().map(|(ngram, next, weight)| (ngram.as_str(), next.as_str(), *weight)),
		)?;
		info!("loaded {} n-grams from {}", index.len(), self.path.display());
		Ok(index)
	}

	fn save(&mut self, index: &NgramIndex) -> Result<usize> {
		let mut stored: BTreeMap<(Ngram, Ngram), u64> = self
			.read()?
			.triples
			.into_iter()
			.map(|(ngram, next, weight)| ((ngram, next), weight))
			.collect();

		let mut written = 0;
		for (ngram, next, weight) in index.triples() {
			stored.insert((ngram.clone(), next.clone()), weight);
			written += 1;
		}

		let snapshot = Snapshot {
			triples: stored.into_iter().map(|((ngram, next), weight)| (ngram, next, weight)).collect(),
		};
		self.write(&snapshot)?;

		info!("saved {written} transitions to {}", self.path.display());
		Ok(written)
	}
}
