use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the n-gram engine and its persistence adapters.
///
/// Storage and snapshot errors carry the name of the operation that failed so
/// a caller can tell a failed `load` from a failed `commit`.
#[derive(Error, Debug)]
pub enum Error {
	#[error("n-gram order must be >= 1, got {0}")]
	InvalidOrder(usize),

	#[error("n-gram order mismatch: expected {expected}, got {found}")]
	OrderMismatch { expected: usize, found: usize },

	#[error("invalid n-gram: {0:?}")]
	InvalidNgram(String),

	#[error("empty model: no n-grams available for generation")]
	EmptyModel,

	#[error("successor distribution of {0:?} has zero total weight")]
	EmptyDistribution(String),

	#[error("weights of {0:?} do not add up to their cached total")]
	InconsistentWeights(String),

	#[error("reading source {path}: {source}")]
	Source {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("storage {operation}: {source}")]
	Storage {
		operation: &'static str,
		#[source]
		source: rusqlite::Error,
	},

	#[error("snapshot {operation} {path}: {source}")]
	SnapshotFile {
		operation: &'static str,
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("snapshot {operation}: {source}")]
	Snapshot {
		operation: &'static str,
		#[source]
		source: postcard::Error,
	},
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attaches an operation name to fallible storage calls.
pub(crate) trait StorageContext<T> {
	fn storage(self, operation: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, rusqlite::Error> {
	fn storage(self, operation: &'static str) -> Result<T> {
		self.map_err(|source| Error::Storage { operation, source })
	}
}

impl<T> StorageContext<T> for std::result::Result<T, postcard::Error> {
	fn storage(self, operation: &'static str) -> Result<T> {
		self.map_err(|source| Error::Snapshot { operation, source })
	}
}
