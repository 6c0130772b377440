use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ngram_gen_core::model::ingest::ingest_parallel;
use ngram_gen_core::pipeline::{TrainOptions, generate_text, train};
use ngram_gen_core::store::{SnapshotStore, SqliteStore, TransitionStore};
use ngram_gen_core::{BoundaryPolicy, Error, Ingestor, NgramIndex, WeightedSampler};

fn weights(index: &NgramIndex) -> BTreeMap<(String, String), u64> {
	index
		.triples()
		.map(|(ngram, next, weight)| ((ngram.to_string(), next.to_string()), weight))
		.collect()
}

fn write_corpus(dir: &Path, name: &str, text: &str) -> PathBuf {
	let path = dir.join(name);
	fs::write(&path, text).unwrap();
	path
}

#[test]
fn sqlite_round_trip_on_disk() {
	let dir = tempfile::tempdir().unwrap();
	let db = dir.path().join("ngrams.db");

	let mut index = NgramIndex::new(3).unwrap();
	let mut ingestor = Ingestor::new(3, BoundaryPolicy::Reset).unwrap();
	ingestor.feed_str("the cat sat on the mat with the hat", &mut index);

	SqliteStore::open(&db).unwrap().save(&index).unwrap();
	let loaded = SqliteStore::open(&db).unwrap().load(3).unwrap();

	assert_eq!(weights(&loaded), weights(&index));
}

#[test]
fn training_twice_doubles_weights() {
	let dir = tempfile::tempdir().unwrap();
	let corpus = write_corpus(dir.path(), "corpus.txt", "abracadabra, abracadabra!");
	let sources = vec![corpus];
	let mut store = SqliteStore::open(dir.path().join("ngrams.db")).unwrap();
	let options = TrainOptions::default();

	let first = train(&mut store, &sources, &options).unwrap();
	let once = weights(&store.load(3).unwrap());
	assert_eq!(first.states_loaded, 0);

	let second = train(&mut store, &sources, &options).unwrap();
	let twice = weights(&store.load(3).unwrap());
	assert_eq!(second.states_loaded, first.states);
	assert_eq!(second.observations, first.observations);

	assert_eq!(once.len(), twice.len());
	for (pair, weight) in &once {
		assert_eq!(twice[pair], weight * 2, "pair {pair:?}");
	}
}

#[test]
fn snapshot_store_trains_like_sqlite() {
	let dir = tempfile::tempdir().unwrap();
	let sources = vec![
		write_corpus(dir.path(), "a.txt", "hello world"),
		write_corpus(dir.path(), "b.txt", "yellow word"),
	];
	let options = TrainOptions::default();

	let mut sqlite = SqliteStore::open_in_memory().unwrap();
	train(&mut sqlite, &sources, &options).unwrap();
	let mut snapshot = SnapshotStore::new(dir.path().join("model.bin"));
	train(&mut snapshot, &sources, &options).unwrap();

	assert_eq!(weights(&sqlite.load(3).unwrap()), weights(&snapshot.load(3).unwrap()));
}

#[test]
fn parallel_matches_sequential_reset() {
	let dir = tempfile::tempdir().unwrap();
	let sources: Vec<PathBuf> = (0..9)
		.map(|i| write_corpus(dir.path(), &format!("{i}.txt"), &format!("source number {i}, shared tail text")))
		.collect();

	let mut sequential = NgramIndex::new(4).unwrap();
	let mut ingestor = Ingestor::new(4, BoundaryPolicy::Reset).unwrap();
	for path in &sources {
		ingestor.ingest_file(path, &mut sequential).unwrap();
	}

	for workers in [0, 1, 3, 16] {
		let parallel = ingest_parallel(4, &sources, workers).unwrap();
		assert_eq!(weights(&parallel), weights(&sequential), "workers = {workers}");
	}
}

#[test]
fn unreadable_source_aborts_without_saving() {
	let dir = tempfile::tempdir().unwrap();
	let sources = vec![
		write_corpus(dir.path(), "ok.txt", "perfectly readable"),
		dir.path().join("missing.txt"),
	];
	let mut store = SqliteStore::open_in_memory().unwrap();

	let err = train(&mut store, &sources, &TrainOptions::default()).unwrap_err();
	assert!(matches!(err, Error::Source { .. }));
	assert_eq!(store.row_count().unwrap(), 0);

	let options = TrainOptions { workers: Some(2), ..TrainOptions::default() };
	assert!(matches!(train(&mut store, &sources, &options), Err(Error::Source { .. })));
	assert_eq!(store.row_count().unwrap(), 0);
}

#[test]
fn chain_policy_records_boundary_transitions() {
	let dir = tempfile::tempdir().unwrap();
	let sources = vec![write_corpus(dir.path(), "a.txt", "abc"), write_corpus(dir.path(), "b.txt", "d")];

	let mut reset = SqliteStore::open_in_memory().unwrap();
	let report = train(&mut reset, &sources, &TrainOptions::default()).unwrap();
	assert_eq!(report.observations, 0);

	let mut chained = SqliteStore::open_in_memory().unwrap();
	let options = TrainOptions { policy: BoundaryPolicy::Chain, ..TrainOptions::default() };
	train(&mut chained, &sources, &options).unwrap();
	assert_eq!(chained.weight("abc", "bcd").unwrap(), Some(1));
}

#[test]
fn generate_from_store() {
	let dir = tempfile::tempdir().unwrap();
	let sources = vec![write_corpus(dir.path(), "corpus.txt", "to be or not to be, that is the question")];
	let mut store = SqliteStore::open_in_memory().unwrap();
	train(&mut store, &sources, &TrainOptions::default()).unwrap();

	let text = generate_text(&mut store, 3, 200, WeightedSampler::seeded(11)).unwrap();
	assert_eq!(text.chars().count(), 203);
}

#[test]
fn generate_from_empty_store_fails() {
	let mut store = SqliteStore::open_in_memory().unwrap();
	let err = generate_text(&mut store, 3, 10, WeightedSampler::from_entropy()).unwrap_err();
	assert!(matches!(err, Error::EmptyModel));
}
