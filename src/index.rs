//! SuccinctPositionIndex: per-sequence position bit vector with rank/select and
//! the rank-aligned list of k-mer codes.

use crate::encode::KmerCode;
use crate::error::{PrimerError, Result};
use crate::succinct::{BitVector, RankSelect};

/// Surviving k-mer start positions of one reference sequence.
///
/// `codes[r - 1]` belongs to the `r`-th set bit of `positions`. Immutable once
/// built; deletions go through [`SuccinctPositionIndex::rebuild_index`].
#[derive(Clone, Debug)]
pub struct SuccinctPositionIndex {
    sequence_id: u32,
    positions: RankSelect,
    codes: Vec<KmerCode>,
}

impl SuccinctPositionIndex {
    /// Assemble an index from a bit vector and codes already in rank order.
    pub fn from_parts(
        sequence_id: u32,
        positions: BitVector,
        codes: Vec<KmerCode>,
    ) -> Result<Self> {
        let positions = RankSelect::build(positions);
        let idx = SuccinctPositionIndex {
            sequence_id,
            positions,
            codes,
        };
        idx.check()?;
        Ok(idx)
    }

    /// Build from `(position, code)` entries in any order. Repeated positions
    /// are merged with [`KmerCode::merge`]. `len` is the bit-vector length.
    pub fn from_entries(
        sequence_id: u32,
        len: usize,
        mut entries: Vec<(u32, KmerCode)>,
    ) -> Result<Self> {
        entries.sort_by_key(|e| e.0);
        let mut bits = BitVector::new(len);
        let mut codes: Vec<KmerCode> = Vec::with_capacity(entries.len());
        let mut last: Option<u32> = None;
        for (pos, code) in entries {
            if last == Some(pos) {
                if let Some(prev) = codes.last_mut() {
                    *prev = prev
                        .merge(code)
                        .ok_or(PrimerError::InconsistentOccurrence {
                            seq_id: sequence_id,
                            pos,
                        })?;
                }
                continue;
            }
            if !bits.set(pos as usize) {
                return Err(PrimerError::IndexOutOfBounds {
                    seq_id: sequence_id,
                    pos,
                    len,
                });
            }
            codes.push(code);
            last = Some(pos);
        }
        Self::from_parts(sequence_id, bits, codes)
    }

    /// `len(codes) == popcount(positions)`, and no dead code is stored.
    pub fn check(&self) -> Result<()> {
        if self.codes.len() != self.positions.ones() {
            return Err(PrimerError::InconsistentIndex {
                codes: self.codes.len(),
                ones: self.positions.ones(),
            });
        }
        if let Some(i) = self.codes.iter().position(KmerCode::is_dead) {
            return Err(PrimerError::DeadCode {
                seq_id: self.sequence_id,
                rank: i + 1,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn sequence_id(&self) -> u32 {
        self.sequence_id
    }

    /// Bit-vector length (max observed position + 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if no k-mer start is recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Number of recorded start positions.
    #[inline]
    pub fn ones(&self) -> usize {
        self.positions.ones()
    }

    #[inline]
    pub fn rank(&self, pos: usize) -> usize {
        self.positions.rank(pos)
    }

    #[inline]
    pub fn select(&self, r: usize) -> Option<usize> {
        self.positions.select(r)
    }

    /// Code of the `r`-th set bit (1-indexed).
    #[inline]
    pub fn code(&self, r: usize) -> Option<KmerCode> {
        r.checked_sub(1).and_then(|i| self.codes.get(i).copied())
    }

    pub fn codes(&self) -> &[KmerCode] {
        &self.codes
    }

    pub fn positions(&self) -> &BitVector {
        self.positions.bits()
    }

    /// `(position, code)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, KmerCode)> + '_ {
        self.positions.bits().ones().zip(self.codes.iter().copied())
    }

    /// Replace the codes with an updated, rank-aligned batch, drop every dead
    /// code, clear its position bit and rebuild rank/select once.
    pub fn rebuild_index(self, updated: Vec<KmerCode>) -> Result<Self> {
        if updated.len() != self.codes.len() {
            return Err(PrimerError::InconsistentIndex {
                codes: updated.len(),
                ones: self.positions.ones(),
            });
        }
        let sequence_id = self.sequence_id;
        let mut bits = self.positions.into_bits();
        let dead: Vec<usize> = bits
            .ones()
            .zip(updated.iter())
            .filter(|(_, c)| c.is_dead())
            .map(|(p, _)| p)
            .collect();
        for p in dead {
            bits.clear(p);
        }
        let codes: Vec<KmerCode> = updated.into_iter().filter(|c| !c.is_dead()).collect();
        Self::from_parts(sequence_id, bits, codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::KmerCodec;

    fn codec() -> KmerCodec {
        KmerCodec::new(4, 6).unwrap()
    }

    #[test]
    fn entries_land_in_rank_order() {
        let c = codec();
        let a = c.encode(b"AAAA", 4).unwrap();
        let b = c.encode(b"ACCC", 4).unwrap();
        let idx =
            SuccinctPositionIndex::from_entries(0, 81, vec![(80, b), (2, a), (75, a), (5, b)])
                .unwrap();
        assert_eq!(idx.ones(), 4);
        assert_eq!(idx.code(1), Some(a));
        assert_eq!(idx.code(2), Some(b));
        assert_eq!(idx.code(3), Some(a));
        assert_eq!(idx.select(4), Some(80));
        assert_eq!(idx.code(0), None);
    }

    #[test]
    fn out_of_bounds_position_is_fatal() {
        let c = codec();
        let a = c.encode(b"AAAA", 4).unwrap();
        let err = SuccinctPositionIndex::from_entries(3, 10, vec![(10, a)]).unwrap_err();
        assert_eq!(
            err,
            PrimerError::IndexOutOfBounds {
                seq_id: 3,
                pos: 10,
                len: 10
            }
        );
    }

    #[test]
    fn duplicate_positions_merge_lengths() {
        let c = codec();
        let four = c.encode(b"ACGT", 4).unwrap();
        let six = c.encode(b"ACGTAA", 6).unwrap();
        let idx = SuccinctPositionIndex::from_entries(0, 5, vec![(1, four), (1, six)]).unwrap();
        assert_eq!(idx.ones(), 1);
        let code = idx.code(1).unwrap();
        assert_eq!(c.live_lengths(code).collect::<Vec<_>>(), vec![4, 6]);
    }

    #[test]
    fn mismatching_codes_at_one_position_are_rejected() {
        let c = codec();
        let x = c.encode(b"ACGT", 4).unwrap();
        let y = c.encode(b"TTTTAA", 6).unwrap();
        assert!(matches!(
            SuccinctPositionIndex::from_entries(0, 5, vec![(1, x), (1, y)]),
            Err(PrimerError::InconsistentOccurrence { .. })
        ));
    }

    #[test]
    fn rebuild_drops_dead_codes() {
        let c = codec();
        let a = c.encode(b"AAAA", 4).unwrap();
        let b = c.encode(b"ACCC", 4).unwrap();
        let idx = SuccinctPositionIndex::from_entries(0, 81, vec![(2, a), (5, b), (75, a), (80, b)])
            .unwrap();
        let updated: Vec<KmerCode> = idx
            .codes()
            .iter()
            .map(|&k| if k == b { k.with_mask(0) } else { k })
            .collect();
        let idx = idx.rebuild_index(updated).unwrap();
        assert_eq!(idx.ones(), 2);
        assert_eq!(idx.iter().map(|(p, _)| p).collect::<Vec<_>>(), vec![2, 75]);
        assert_eq!(idx.len(), 81);
        assert!(idx.check().is_ok());
    }

    #[test]
    fn stored_dead_code_fails_check() {
        let c = codec();
        let a = c.encode(b"AAAA", 4).unwrap();
        let mut bits = BitVector::new(10);
        bits.set(2);
        bits.set(6);
        let err = SuccinctPositionIndex::from_parts(5, bits, vec![a, a.with_mask(0)]).unwrap_err();
        assert_eq!(err, PrimerError::DeadCode { seq_id: 5, rank: 2 });
    }

    #[test]
    fn rebuild_rejects_misaligned_batch() {
        let c = codec();
        let a = c.encode(b"AAAA", 4).unwrap();
        let idx = SuccinctPositionIndex::from_entries(0, 10, vec![(2, a)]).unwrap();
        assert!(idx.rebuild_index(vec![]).is_err());
    }
}
