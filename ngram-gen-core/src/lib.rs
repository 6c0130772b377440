//! Character-level n-gram text generation.
//!
//! This crate learns a Markov chain over overlapping rune n-grams and uses it
//! to generate text:
//! - An additive transition table (`NgramIndex`) built by sliding a window
//!   over corpus sources
//! - Weighted random walks over the table
//! - SQLite and single-file persistence with upsert semantics
//! - A combined load, ingest and save operation for training runs

/// Core n-gram models and generation logic.
pub mod model;

/// Persistence adapters (`SqliteStore`, `SnapshotStore`).
pub mod store;

/// Training and generation entry points built on a store.
pub mod pipeline;

/// Corpus source enumeration.
pub mod io;

mod error;

pub use error::{Error, Result};
pub use model::generator::Generator;
pub use model::index::NgramIndex;
pub use model::ingest::{BoundaryPolicy, Ingestor};
pub use model::ngram::Ngram;
pub use model::sampler::{Sampler, WeightedSampler};
pub use model::variants::NgramVariants;
