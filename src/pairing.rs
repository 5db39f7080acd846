//! Pairing engine: windowed rank/select enumeration of forward/reverse k-mer
//! pairs, merged across the corpus into [`KmerPair`] entries.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::chemistry::Chemistry;
use crate::config::PrimerConfig;
use crate::encode::{Kmer, KmerCodec};
use crate::error::{PrimerError, Result};
use crate::index::SuccinctPositionIndex;
use crate::observe::{Observer, Stage};

/// One amplicon occurrence: both primer starts on one reference sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairLocation {
    pub sequence_id: u32,
    pub min_pos: u32,
    pub max_pos: u32,
}

/// A primer pair candidate with every place it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct KmerPair {
    pub fwd: Kmer,
    pub rev: Kmer,
    /// `|Tm(fwd) - Tm(rev)|` under the configured melting method.
    pub delta_tm: f64,
    pub occurrences: Vec<PairLocation>,
}

impl KmerPair {
    /// Number of distinct sequences carrying the pair. Assumes sorted occurrences.
    pub fn sequence_count(&self) -> usize {
        let mut n = 0;
        let mut last = None;
        for o in &self.occurrences {
            if last != Some(o.sequence_id) {
                n += 1;
                last = Some(o.sequence_id);
            }
        }
        n
    }

    fn absorb(&mut self, other: KmerPair) {
        self.occurrences.extend(other.occurrences);
    }
}

struct Variant {
    len: usize,
    kmer: Kmer,
    bases: Vec<u8>,
}

/// Pair enumeration bound to one configuration.
#[derive(Clone, Copy, Debug)]
pub struct PairingEngine {
    codec: KmerCodec,
    chem: Chemistry,
    min_offset: usize,
    max_offset: usize,
}

impl PairingEngine {
    pub fn new(cfg: &PrimerConfig) -> Result<Self> {
        Ok(PairingEngine {
            codec: cfg.codec()?,
            chem: Chemistry::new(cfg),
            min_offset: cfg.min_offset(),
            max_offset: cfg.max_offset(),
        })
    }

    fn variants(&self, idx: &SuccinctPositionIndex) -> Result<Vec<Vec<Variant>>> {
        idx.codes()
            .iter()
            .map(|&code| {
                self.codec
                    .live_lengths(code)
                    .map(|len| {
                        let kmer = self.codec.variant(code, len)?;
                        Ok(Variant {
                            len,
                            bases: kmer.bases(),
                            kmer,
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    /// Pairs within one sequence, in forward-position order. Consecutive
    /// emissions of the same `(fwd, rev)` share one entry.
    pub fn pair_sequence(&self, idx: &SuccinctPositionIndex) -> Result<Vec<KmerPair>> {
        let vars = self.variants(idx)?;
        let bound = idx.len();
        let broken = || PrimerError::InconsistentIndex {
            codes: idx.codes().len(),
            ones: idx.ones(),
        };
        let mut out: Vec<KmerPair> = Vec::new();

        for r in 1..=idx.ones() {
            let p = idx.select(r).ok_or_else(broken)?;
            for fwd in &vars[r - 1] {
                let fwd_end = p + fwd.len;
                let start = fwd_end.saturating_add(self.min_offset);
                let end = fwd_end.saturating_add(self.max_offset).min(bound);
                if start >= end {
                    continue;
                }
                for r2 in idx.rank(start) + 1..=idx.rank(end) {
                    let p2 = idx.select(r2).ok_or_else(broken)?;
                    for rev in &vars[r2 - 1] {
                        if rev.kmer == fwd.kmer {
                            continue;
                        }
                        let Some(delta_tm) = self.chem.pair_ok(&fwd.bases, &rev.bases) else {
                            continue;
                        };
                        let loc = PairLocation {
                            sequence_id: idx.sequence_id(),
                            min_pos: p.min(p2) as u32,
                            max_pos: p.max(p2) as u32,
                        };
                        match out.last_mut() {
                            Some(last) if last.fwd == fwd.kmer && last.rev == rev.kmer => {
                                last.occurrences.push(loc)
                            }
                            _ => out.push(KmerPair {
                                fwd: fwd.kmer,
                                rev: rev.kmer,
                                delta_tm,
                                occurrences: vec![loc],
                            }),
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Pair every index in parallel and merge identical `(fwd, rev)` entries.
    /// Output is sorted by `(fwd, rev)`; occurrences are sorted within a pair.
    pub fn pair_all(
        &self,
        indexes: &[SuccinctPositionIndex],
        observer: &dyn Observer,
    ) -> Result<Vec<KmerPair>> {
        let merged = indexes
            .par_iter()
            .try_fold(AHashMap::new, |mut acc, idx| {
                for pair in self.pair_sequence(idx)? {
                    merge_pair(&mut acc, pair);
                }
                Ok::<_, PrimerError>(acc)
            })
            .try_reduce(AHashMap::new, |mut a, b| {
                for (_, pair) in b {
                    merge_pair(&mut a, pair);
                }
                Ok(a)
            })?;

        let mut pairs: Vec<KmerPair> = merged.into_values().collect();
        for pair in &mut pairs {
            pair.occurrences.sort_unstable();
            pair.occurrences.dedup();
        }
        pairs.sort_unstable_by(|a, b| (a.fwd, a.rev).cmp(&(b.fwd, b.rev)));
        observer.stage(Stage::Paired, pairs.len());
        Ok(pairs)
    }
}

fn merge_pair(acc: &mut AHashMap<(Kmer, Kmer), KmerPair>, pair: KmerPair) {
    match acc.get_mut(&(pair.fwd, pair.rev)) {
        Some(existing) => existing.absorb(pair),
        None => {
            acc.insert((pair.fwd, pair.rev), pair);
        }
    }
}
