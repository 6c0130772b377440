//! The n-gram statistics engine.
//!
//! - Rune sequences used as Markov states (`Ngram`)
//! - Successor distributions and the transition table (`NgramVariants`, `NgramIndex`)
//! - Sliding-window ingestion of corpus sources (`Ingestor`)
//! - Weighted sampling (`Sampler`) and the Markov walk (`Generator`)

/// Fixed-length rune sequence identifying a state.
pub mod ngram;

/// Successor distribution of one state, with its cached total weight.
pub mod variants;

/// Mapping from every known n-gram to its successors.
///
/// Supports additive merging of partial indexes.
pub mod index;

/// Sliding-window ingestion of rune streams, sequential or parallel.
pub mod ingest;

/// Weighted random choice of successors.
pub mod sampler;

/// Text generation by Markov walk.
pub mod generator;
