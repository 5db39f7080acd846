//! Occurrence reducer: frequency cutoff, symmetry skip, sequence-id compaction
//! and two-pass construction of the per-sequence position indexes.
//!
//! Pass 1 walks the surviving keys once to find every sequence's largest
//! position, so each bit vector is allocated at its final length before any bit
//! is set. Pass 2 encodes the keys in parallel (rayon), radix-sorts the
//! `(sequence << 32 | position, code)` entries and materializes one index per
//! sequence, again in parallel.

use std::collections::BTreeMap;
use std::iter;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::PrimerConfig;
use crate::encode::{KmerCode, KmerCodec};
use crate::error::{PrimerError, Result};
use crate::index::SuccinctPositionIndex;
use crate::observe::{Observer, Stage};
use crate::occurrence::{Corpus, KmerKey, Location, OccurrenceTable};
use crate::radix::radix_sort_pairs_u64;

/// Stable sort-and-rank remapping of sparse sequence identifiers to `0..n`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeqIdMap {
    original: Vec<u32>,
}

impl SeqIdMap {
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut original: Vec<u32> = ids.into_iter().collect();
        original.sort_unstable();
        original.dedup();
        SeqIdMap { original }
    }

    /// Dense identifier for an original one.
    #[inline]
    pub fn dense(&self, seq_id: u32) -> Option<usize> {
        self.original.binary_search(&seq_id).ok()
    }

    /// Original identifier for a dense one.
    #[inline]
    pub fn original(&self, dense: usize) -> Option<u32> {
        self.original.get(dense).copied()
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Output of [`reduce_occurrences`].
#[derive(Clone, Debug)]
pub struct Reduced {
    /// One index per sequence that carries at least one occurrence, in dense order.
    pub indexes: Vec<SuccinctPositionIndex>,
    pub seq_map: SeqIdMap,
    /// Absolute frequency cutoff that was applied.
    pub cutoff: usize,
    /// Keys that passed the cutoff and the symmetry skip.
    pub keys: usize,
}

/// The mapper's lists are symmetric: a key is redundant whenever its first
/// reported occurrence sorts strictly before the key itself.
#[inline]
fn seen_before(key: &KmerKey, occ: &[Location]) -> bool {
    occ.first().is_some_and(|first| *first < key.location())
}

/// Keys with at least `cutoff` occurrences, one per symmetric equivalence class.
pub fn surviving_keys(
    table: &OccurrenceTable,
    cutoff: usize,
) -> impl Iterator<Item = (&KmerKey, &[Location])> {
    table
        .iter()
        .filter(move |(_, occ)| occ.len() >= cutoff)
        .filter(|(key, occ)| !seen_before(key, occ))
}

fn encode_key<C: Corpus + ?Sized>(
    corpus: &C,
    codec: &KmerCodec,
    key: &KmerKey,
) -> Result<KmerCode> {
    let len = key.len as usize;
    let bases = corpus
        .slice(key.seq_id, key.pos, len)
        .ok_or(PrimerError::MissingSequence {
            seq_id: key.seq_id,
            pos: key.pos,
            len,
        })?;
    codec.encode(bases, len)
}

/// Build the per-sequence indexes from raw mapper output.
///
/// Fails with `EmptyInput` if no key reaches the cutoff. Keys whose k-mer
/// cannot be encoded are reported to `observer` and skipped.
pub fn reduce_occurrences<C: Corpus + ?Sized>(
    table: &OccurrenceTable,
    corpus: &C,
    cfg: &PrimerConfig,
    observer: &dyn Observer,
) -> Result<Reduced> {
    let codec = cfg.codec()?;
    let started = Instant::now();
    let cutoff = cfg.kmer_frequency().resolve(corpus.num_sequences());

    let survivors: Vec<(&KmerKey, &[Location])> = surviving_keys(table, cutoff).collect();
    observer.stage(Stage::FrequencyCutoff, survivors.len());
    observer.timing(Stage::FrequencyCutoff, started.elapsed());
    let started = Instant::now();
    if survivors.is_empty() {
        return Err(PrimerError::EmptyInput { cutoff });
    }

    // Pass 1: length bounds and the largest position per sequence.
    let mut max_pos: BTreeMap<u32, u32> = BTreeMap::new();
    for (key, occ) in &survivors {
        let len = key.len as usize;
        if len < codec.min_len() || len > codec.max_len() {
            return Err(PrimerError::LengthOutOfRange {
                len,
                min: codec.min_len(),
                max: codec.max_len(),
            });
        }
        for loc in iter::once(key.location()).chain(occ.iter().copied()) {
            let slot = max_pos.entry(loc.seq_id).or_insert(loc.pos);
            *slot = (*slot).max(loc.pos);
        }
    }
    let seq_map = SeqIdMap::from_ids(max_pos.keys().copied());
    // BTreeMap iteration order matches the dense order.
    let bit_lens: Vec<usize> = max_pos.values().map(|&p| p as usize + 1).collect();

    // Pass 2: encode and emit one entry per occurrence.
    let shards: Vec<Vec<(u64, KmerCode)>> = survivors
        .par_iter()
        .map(|&(key, occ)| -> Result<Vec<(u64, KmerCode)>> {
            let code = match encode_key(corpus, &codec, key) {
                Ok(c) => c,
                Err(e) if e.is_isolated() => {
                    observer.dropped(key, &e);
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e),
            };
            let mut out = Vec::with_capacity(occ.len() + 1);
            for loc in iter::once(key.location()).chain(occ.iter().copied()) {
                let dense = seq_map
                    .dense(loc.seq_id)
                    .ok_or(PrimerError::IndexOutOfBounds {
                        seq_id: loc.seq_id,
                        pos: loc.pos,
                        len: 0,
                    })?;
                if loc.pos as usize >= bit_lens[dense] {
                    return Err(PrimerError::IndexOutOfBounds {
                        seq_id: loc.seq_id,
                        pos: loc.pos,
                        len: bit_lens[dense],
                    });
                }
                out.push((((dense as u64) << 32) | loc.pos as u64, code));
            }
            Ok(out)
        })
        .collect::<Result<Vec<_>>>()?;

    let total: usize = shards.iter().map(Vec::len).sum();
    let mut keys: Vec<u64> = Vec::with_capacity(total);
    let mut vals: Vec<KmerCode> = Vec::with_capacity(total);
    for shard in shards {
        for (k, c) in shard {
            keys.push(k);
            vals.push(c);
        }
    }
    radix_sort_pairs_u64(&mut keys, &mut vals);

    let mut per_seq: Vec<Vec<(u32, KmerCode)>> = vec![Vec::new(); seq_map.len()];
    for (&k, c) in keys.iter().zip(vals) {
        per_seq[(k >> 32) as usize].push((k as u32, c));
    }

    let indexes = per_seq
        .into_par_iter()
        .enumerate()
        .map(|(dense, entries)| {
            let seq_id = seq_map.original(dense).unwrap_or(dense as u32);
            SuccinctPositionIndex::from_entries(seq_id, bit_lens[dense], entries)
        })
        .collect::<Result<Vec<_>>>()?;
    observer.timing(Stage::IndexBuilt, started.elapsed());
    observer.stage(
        Stage::IndexBuilt,
        indexes.iter().map(SuccinctPositionIndex::ones).sum(),
    );

    Ok(Reduced {
        indexes,
        seq_map,
        cutoff,
        keys: survivors.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrequencyCutoff;
    use crate::observe::{CountingObserver, NullObserver};
    use crate::occurrence::SequenceSet;

    fn cfg() -> PrimerConfig {
        PrimerConfig::default()
            .primer_lengths(4, 6)
            .kmer_cutoff(FrequencyCutoff::Count(2))
    }

    fn loc(s: u32, p: u32) -> Location {
        Location::new(s, p)
    }

    #[test]
    fn symmetric_entries_processed_once() {
        let corpus: Vec<Vec<u8>> = vec![b"ACGTTTTTACGT".to_vec()];
        let table: OccurrenceTable = [
            (KmerKey::new(0, 0, 4), vec![loc(0, 0), loc(0, 8)]),
            (KmerKey::new(0, 8, 4), vec![loc(0, 0), loc(0, 8)]),
        ]
        .into_iter()
        .collect();
        assert_eq!(surviving_keys(&table, 2).count(), 1);

        let r = reduce_occurrences(&table, &corpus, &cfg(), &NullObserver).unwrap();
        assert_eq!(r.keys, 1);
        assert_eq!(r.indexes.len(), 1);
        let idx = &r.indexes[0];
        assert_eq!(idx.len(), 9);
        assert_eq!(idx.iter().map(|(p, _)| p).collect::<Vec<_>>(), vec![0, 8]);
        assert_eq!(idx.code(1), idx.code(2));
    }

    #[test]
    fn sparse_sequence_ids_are_compacted() {
        let mut set = SequenceSet::new();
        set.push(17, "x", b"GGGACGTA".to_vec());
        set.push(3, "y", b"ACGTA".to_vec());
        let table: OccurrenceTable = [(KmerKey::new(3, 0, 5), vec![loc(3, 0), loc(17, 3)])]
            .into_iter()
            .collect();
        let r = reduce_occurrences(&table, &set, &cfg(), &NullObserver).unwrap();
        assert_eq!(r.seq_map.dense(3), Some(0));
        assert_eq!(r.seq_map.dense(17), Some(1));
        assert_eq!(r.indexes[0].sequence_id(), 3);
        assert_eq!(r.indexes[1].sequence_id(), 17);
        assert_eq!(r.indexes[1].len(), 4);
        assert_eq!(r.indexes[1].select(1), Some(3));
    }

    #[test]
    fn lengths_at_one_position_share_a_code() {
        let corpus: Vec<Vec<u8>> = vec![b"ACGTAC".to_vec(), b"ACGTAC".to_vec()];
        let both = vec![loc(0, 0), loc(1, 0)];
        let table: OccurrenceTable = [
            (KmerKey::new(0, 0, 4), both.clone()),
            (KmerKey::new(0, 0, 6), both.clone()),
            (KmerKey::new(1, 0, 4), both.clone()),
            (KmerKey::new(1, 0, 6), both),
        ]
        .into_iter()
        .collect();
        let r = reduce_occurrences(&table, &corpus, &cfg(), &NullObserver).unwrap();
        let codec = cfg().codec().unwrap();
        for idx in &r.indexes {
            assert_eq!(idx.ones(), 1);
            let code = idx.code(1).unwrap();
            assert_eq!(codec.live_lengths(code).collect::<Vec<_>>(), vec![4, 6]);
        }
    }

    #[test]
    fn nothing_above_cutoff_is_empty_input() {
        let corpus: Vec<Vec<u8>> = vec![b"ACGT".to_vec()];
        let table: OccurrenceTable = [(KmerKey::new(0, 0, 4), vec![loc(0, 0)])]
            .into_iter()
            .collect();
        let err = reduce_occurrences(&table, &corpus, &cfg(), &NullObserver).unwrap_err();
        assert_eq!(err, PrimerError::EmptyInput { cutoff: 2 });
    }

    #[test]
    fn invalid_symbols_are_dropped_not_fatal() {
        let corpus: Vec<Vec<u8>> = vec![b"ACNTACGT".to_vec(), b"ACNTACGT".to_vec()];
        let table: OccurrenceTable = [
            (KmerKey::new(0, 0, 4), vec![loc(0, 0), loc(1, 0)]),
            (KmerKey::new(0, 4, 4), vec![loc(0, 4), loc(1, 4)]),
        ]
        .into_iter()
        .collect();
        let obs = CountingObserver::new();
        let r = reduce_occurrences(&table, &corpus, &cfg(), &obs).unwrap();
        assert_eq!(obs.dropped_count(), 1);
        assert_eq!(r.indexes[0].iter().map(|(p, _)| p).collect::<Vec<_>>(), vec![4]);
        assert_eq!(obs.survivors(Stage::IndexBuilt), 2);
    }

    #[test]
    fn key_length_outside_range_is_fatal() {
        let corpus: Vec<Vec<u8>> = vec![b"ACGTACGTAC".to_vec()];
        let table: OccurrenceTable = [(KmerKey::new(0, 0, 9), vec![loc(0, 0), loc(0, 1)])]
            .into_iter()
            .collect();
        assert!(matches!(
            reduce_occurrences(&table, &corpus, &cfg(), &NullObserver),
            Err(PrimerError::LengthOutOfRange { len: 9, .. })
        ));
    }
}
