//! In-memory exact-match occurrence source.
//!
//! Produces the same shape of table an external full-text index would: every
//! key lists all locations of its k-mer, sorted, itself included. Meant for
//! tests and small corpora; a k-mer occurring `n` times costs `n²` locations.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::config::PrimerConfig;
use crate::encode::Kmer;
use crate::occurrence::{KmerKey, Location, OccurrenceTable};

#[derive(Clone, Copy, Debug)]
pub struct ExactMapper {
    min_len: usize,
    max_len: usize,
    min_count: usize,
}

impl ExactMapper {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        ExactMapper {
            min_len,
            max_len,
            min_count: 1,
        }
    }

    /// Mapper over the configured primer length range.
    pub fn for_config(cfg: &PrimerConfig) -> Self {
        Self::new(cfg.min_len(), cfg.max_len())
    }

    /// Skip k-mers occurring fewer than `n` times overall.
    pub fn min_count(mut self, n: usize) -> Self {
        self.min_count = n.max(1);
        self
    }

    /// Windows containing a non-ACGT base are not reported.
    pub fn map<'a>(&self, seqs: impl IntoIterator<Item = (u32, &'a [u8])>) -> OccurrenceTable {
        let seqs: Vec<(u32, &[u8])> = seqs.into_iter().collect();
        let per_len: Vec<Vec<(KmerKey, Vec<Location>)>> = (self.min_len..=self.max_len)
            .into_par_iter()
            .map(|len| self.map_length(&seqs, len))
            .collect();
        per_len.into_iter().flatten().collect()
    }

    fn map_length(&self, seqs: &[(u32, &[u8])], len: usize) -> Vec<(KmerKey, Vec<Location>)> {
        let mut groups: AHashMap<Kmer, Vec<Location>> = AHashMap::new();
        for &(seq_id, s) in seqs {
            if len == 0 || s.len() < len {
                continue;
            }
            for (pos, window) in s.windows(len).enumerate() {
                if let Ok(kmer) = Kmer::from_bases(window) {
                    groups
                        .entry(kmer)
                        .or_default()
                        .push(Location::new(seq_id, pos as u32));
                }
            }
        }

        let mut out = Vec::new();
        for (_, mut locs) in groups {
            if locs.len() < self.min_count {
                continue;
            }
            locs.sort_unstable();
            for l in &locs {
                out.push((KmerKey::new(l.seq_id, l.pos, len as u16), locs.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_symmetric_and_sorted() {
        let a = b"ACGTACGT".to_vec();
        let b = b"TTACGTNN".to_vec();
        let table = ExactMapper::new(4, 4).map([(0u32, a.as_slice()), (1, b.as_slice())]);
        let acgt = vec![Location::new(0, 0), Location::new(0, 4), Location::new(1, 2)];
        for l in &acgt {
            assert_eq!(table.get(&KmerKey::new(l.seq_id, l.pos, 4)), Some(acgt.as_slice()));
        }
        // GTNN contains N.
        assert!(table.get(&KmerKey::new(1, 4, 4)).is_none());
    }

    #[test]
    fn case_does_not_split_groups() {
        let a = b"acgt".to_vec();
        let b = b"ACGT".to_vec();
        let table = ExactMapper::new(4, 4).map([(0u32, a.as_slice()), (1, b.as_slice())]);
        assert_eq!(table.get(&KmerKey::new(0, 0, 4)).map(<[_]>::len), Some(2));
    }

    #[test]
    fn min_count_filters_singletons() {
        let a = b"AACCGGTT".to_vec();
        let table = ExactMapper::new(3, 5).min_count(2).map([(0u32, a.as_slice())]);
        assert!(table.is_empty());
    }
}
