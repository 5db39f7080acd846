//! End-to-end primer pair design over one occurrence table.

use std::time::Instant;

use crate::chemistry::Chemistry;
use crate::config::PrimerConfig;
use crate::error::{PrimerError, Result};
use crate::filter::filter_single;
use crate::index::SuccinctPositionIndex;
use crate::observe::{Observer, Stage};
use crate::occurrence::{Corpus, OccurrenceTable};
use crate::pairing::{KmerPair, PairingEngine};
use crate::reducer::{SeqIdMap, reduce_occurrences};

/// Result of [`design_primers`].
#[derive(Clone, Debug, Default)]
pub struct Design {
    /// Pairs sorted by `(fwd, rev)`.
    pub pairs: Vec<KmerPair>,
    /// Filtered per-sequence indexes, dense order.
    pub indexes: Vec<SuccinctPositionIndex>,
    pub seq_map: SeqIdMap,
    /// Absolute k-mer frequency cutoff that was applied.
    pub cutoff: usize,
}

impl Design {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Reduce, filter, pair and apply the pair frequency cutoff.
///
/// A table with no key above the k-mer cutoff yields an empty design and a
/// warning; every other error is returned.
pub fn design_primers<C: Corpus + ?Sized>(
    table: &OccurrenceTable,
    corpus: &C,
    cfg: &PrimerConfig,
    observer: &dyn Observer,
) -> Result<Design> {
    cfg.validate()?;
    let codec = cfg.codec()?;

    let reduced = match reduce_occurrences(table, corpus, cfg, observer) {
        Ok(r) => r,
        Err(PrimerError::EmptyInput { cutoff }) => {
            observer.warn(&format!(
                "no k-mer occurs at least {cutoff} times; nothing to pair"
            ));
            return Ok(Design {
                cutoff,
                ..Design::default()
            });
        }
        Err(e) => return Err(e),
    };

    let started = Instant::now();
    let chem = Chemistry::new(cfg);
    let indexes = filter_single(reduced.indexes, &codec, &chem, observer)?;
    observer.timing(Stage::ChemistryFiltered, started.elapsed());

    let started = Instant::now();
    let engine = PairingEngine::new(cfg)?;
    let mut pairs = engine.pair_all(&indexes, observer)?;
    observer.timing(Stage::Paired, started.elapsed());

    let started = Instant::now();
    let min_sequences = cfg.pair_frequency().resolve(corpus.num_sequences());
    pairs.retain(|p| p.sequence_count() >= min_sequences);
    observer.stage(Stage::PairCutoff, pairs.len());
    observer.timing(Stage::PairCutoff, started.elapsed());

    Ok(Design {
        pairs,
        indexes,
        seq_map: reduced.seq_map,
        cutoff: reduced.cutoff,
    })
}
