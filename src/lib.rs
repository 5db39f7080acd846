//! Universal PCR primer pair design over a reference corpus (edition 2024).
//!
//! Stages:
//! - Occurrence reduction: mapper output → frequency cutoff → one
//!   [`SuccinctPositionIndex`] per sequence (rank/select over start positions)
//! - Single-kmer chemistry: Tm, CG content, self-dimers, repeats; failing
//!   length variants are cleared from each [`KmerCode`]'s length mask
//! - Pairing: windowed rank/select queries per sequence, cross-dimer and ΔTm
//!   checks, corpus-wide aggregation into [`KmerPair`]s
//!
//! Diagnostics go through an injected [`Observer`]; see [`TracingObserver`].
//! Occurrence discovery is external; [`ExactMapper`] is a small in-memory
//! stand-in.

pub mod chemistry;
pub mod config;
pub mod encode;
mod error;
mod filter;
mod index;
mod mapper;
pub mod observe;
mod occurrence;
mod pairing;
mod pipeline;
mod radix;
mod reducer;
pub mod succinct;

pub use config::{FrequencyCutoff, MeltMethod, PrimerConfig};
pub use encode::{Kmer, KmerCode, KmerCodec};
pub use error::{PrimerError, Result};
pub use filter::{filter_code, filter_single};
pub use index::SuccinctPositionIndex;
pub use mapper::ExactMapper;
pub use observe::{CountingObserver, NullObserver, Observer, Stage, TracingObserver};
pub use occurrence::{Corpus, KmerKey, Location, OccurrenceTable, SequenceSet};
pub use pairing::{KmerPair, PairLocation, PairingEngine};
pub use pipeline::{Design, design_primers};
pub use reducer::{Reduced, SeqIdMap, reduce_occurrences, surviving_keys};
