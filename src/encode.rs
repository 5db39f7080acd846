//! K-mer encoding: 2-bit mapping, sentinel-prefixed payloads, per-length liveness masks.
//!
//! Conventions
//! - Bases pack as A=00, C=01, G=10, T=11, first base in the most significant pair.
//! - Every payload carries exactly one sentinel `1` bit directly above its base bits,
//!   so the encoded length is `(63 - leading_zeros) / 2`.
//! - Bit `i` of a [`KmerCode`]'s `length_mask` marks the length `min_len + i` prefix as live.

use std::fmt;

use crate::error::{PrimerError, Result};

/// Longest k-mer a 64-bit payload can hold next to its sentinel.
pub const MAX_ENCODED_LEN: usize = 31;

/// Width of the length-mask field; bounds `max_len - min_len + 1`.
pub const LENGTH_MASK_BITS: usize = 16;

/// 256-entry LUT: ASCII → 2-bit (A=0, C=1, G=2, T=3), 0xFF for anything else.
pub static MAP_LUT: [u8; 256] = {
    const X: u8 = 0xFF;
    let mut t = [X; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'c' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'g' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t
};

const DECODE: [u8; 4] = *b"ACGT";

/// 2-bit encoding via LUT. `None` if ambiguous.
#[inline]
pub fn map_base(b: u8) -> Option<u8> {
    let v = MAP_LUT[b as usize];
    if v <= 3 { Some(v) } else { None }
}

#[inline]
fn sentinel_len(bits: u64) -> usize {
    debug_assert!(bits != 0, "payload without sentinel");
    ((63 - bits.leading_zeros()) / 2) as usize
}

/// One exact k-mer: a single live length variant of a [`KmerCode`].
///
/// Equality is sequence identity, so dead variants sharing a payload never
/// take part in comparisons.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kmer(u64);

impl Kmer {
    /// Encode `bases` as an exact k-mer (1..=31 bases).
    pub fn from_bases(bases: &[u8]) -> Result<Self> {
        if bases.is_empty() || bases.len() > MAX_ENCODED_LEN {
            return Err(PrimerError::LengthOutOfRange {
                len: bases.len(),
                min: 1,
                max: MAX_ENCODED_LEN,
            });
        }
        let mut bits: u64 = 1;
        for (offset, &b) in bases.iter().enumerate() {
            let v = map_base(b).ok_or(PrimerError::InvalidSymbol { symbol: b, offset })?;
            bits = (bits << 2) | v as u64;
        }
        Ok(Kmer(bits))
    }

    /// Number of bases.
    #[inline]
    pub fn len(&self) -> usize {
        sentinel_len(self.0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 1
    }

    /// Raw sentinel-prefixed bits.
    #[inline]
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Uppercase ASCII bases, 5' first.
    pub fn bases(&self) -> Vec<u8> {
        let n = self.len();
        (0..n)
            .map(|i| DECODE[((self.0 >> (2 * (n - 1 - i))) & 0b11) as usize])
            .collect()
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bases();
        // DECODE only yields ASCII.
        f.write_str(std::str::from_utf8(&b).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kmer({self})")
    }
}

/// Packed k-mer of the longest candidate length at one start position, plus
/// one liveness bit per candidate length.
///
/// A code whose `length_mask` is zero is dead and gets pruned by
/// [`crate::SuccinctPositionIndex::rebuild_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KmerCode {
    payload: u64,
    length_mask: u16,
}

impl KmerCode {
    #[inline]
    pub fn payload(&self) -> u64 {
        self.payload
    }

    #[inline]
    pub fn length_mask(&self) -> u16 {
        self.length_mask
    }

    /// Number of bases packed in the payload.
    #[inline]
    pub fn encoded_length(&self) -> usize {
        sentinel_len(self.payload)
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.length_mask == 0
    }

    /// Same payload with a replacement mask.
    #[inline]
    pub fn with_mask(self, length_mask: u16) -> Self {
        KmerCode {
            payload: self.payload,
            length_mask,
        }
    }

    /// Combine two codes recorded at the same start position.
    ///
    /// Keeps the longer payload and ORs the masks. `None` if the shorter
    /// payload is not a prefix of the longer one.
    pub fn merge(self, other: KmerCode) -> Option<KmerCode> {
        let (long, short) = if self.encoded_length() >= other.encoded_length() {
            (self, other)
        } else {
            (other, self)
        };
        let excess = long.encoded_length() - short.encoded_length();
        if long.payload >> (2 * excess) != short.payload {
            return None;
        }
        Some(KmerCode {
            payload: long.payload,
            length_mask: long.length_mask | short.length_mask,
        })
    }
}

/// Encoder/decoder bound to a `[min_len, max_len]` candidate length range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KmerCodec {
    min_len: usize,
    max_len: usize,
}

impl KmerCodec {
    /// Codec for lengths `min_len..=max_len`; the range must fit the mask width
    /// and the payload.
    pub fn new(min_len: usize, max_len: usize) -> Result<Self> {
        if min_len == 0
            || min_len > max_len
            || max_len > MAX_ENCODED_LEN
            || max_len - min_len + 1 > LENGTH_MASK_BITS
        {
            return Err(PrimerError::InvalidConfig(format!(
                "primer length range [{min_len}, {max_len}] must satisfy \
                 1 <= min <= max <= {MAX_ENCODED_LEN} and span at most {LENGTH_MASK_BITS} lengths"
            )));
        }
        Ok(KmerCodec { min_len, max_len })
    }

    #[inline]
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    fn bit_for(&self, len: usize) -> Result<u16> {
        if len < self.min_len || len > self.max_len {
            return Err(PrimerError::LengthOutOfRange {
                len,
                min: self.min_len,
                max: self.max_len,
            });
        }
        Ok(1u16 << (len - self.min_len))
    }

    /// Pack the first `len` bases with a single live length bit.
    ///
    /// Fails with `LengthOutOfRange` if `len` is outside the codec's range or
    /// `bases` is shorter than `len`, and with `InvalidSymbol` on a non-ACGT base.
    pub fn encode(&self, bases: &[u8], len: usize) -> Result<KmerCode> {
        let bit = self.bit_for(len)?;
        if bases.len() < len {
            return Err(PrimerError::LengthOutOfRange {
                len: bases.len(),
                min: len,
                max: self.max_len,
            });
        }
        let kmer = Kmer::from_bases(&bases[..len])?;
        Ok(KmerCode {
            payload: kmer.0,
            length_mask: bit,
        })
    }

    /// Exact k-mer for the live length variant `len`.
    pub fn variant(&self, code: KmerCode, len: usize) -> Result<Kmer> {
        let bit = self.bit_for(len)?;
        let enc = code.encoded_length();
        if code.length_mask & bit == 0 || len > enc {
            return Err(PrimerError::DeadVariant { len });
        }
        Ok(Kmer(code.payload >> (2 * (enc - len))))
    }

    /// Decoded bases of the live length variant `len`.
    pub fn decode(&self, code: KmerCode, len: usize) -> Result<Vec<u8>> {
        Ok(self.variant(code, len)?.bases())
    }

    #[inline]
    pub fn encoded_length(&self, code: KmerCode) -> usize {
        code.encoded_length()
    }

    #[inline]
    pub fn is_live(&self, code: KmerCode, len: usize) -> bool {
        self.bit_for(len)
            .map(|bit| code.length_mask & bit != 0)
            .unwrap_or(false)
    }

    /// Live lengths of `code`, ascending.
    pub fn live_lengths(&self, code: KmerCode) -> impl Iterator<Item = usize> {
        let min = self.min_len;
        let mask = code.length_mask;
        (0..=(self.max_len - self.min_len))
            .filter(move |i| (mask >> i) & 1 == 1)
            .map(move |i| min + i)
    }

    /// Clear the liveness bit of `len`; other variants stay untouched.
    pub fn clear_length(&self, code: &mut KmerCode, len: usize) -> Result<()> {
        let bit = self.bit_for(len)?;
        code.length_mask &= !bit;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_marks_encoded_length() {
        let codec = KmerCodec::new(4, 8).unwrap();
        let code = codec.encode(b"ACGTAC", 6).unwrap();
        assert_eq!(code.encoded_length(), 6);
        assert_eq!(code.payload(), 0b1_00_01_10_11_00_01);
        assert_eq!(code.length_mask(), 1 << 2);
    }

    #[test]
    fn lowercase_is_normalized() {
        let codec = KmerCodec::new(4, 8).unwrap();
        let code = codec.encode(b"acgt", 4).unwrap();
        assert_eq!(codec.decode(code, 4).unwrap(), b"ACGT");
    }

    #[test]
    fn rejects_ambiguous_and_out_of_range() {
        let codec = KmerCodec::new(4, 8).unwrap();
        assert_eq!(
            codec.encode(b"ACNT", 4),
            Err(PrimerError::InvalidSymbol {
                symbol: b'N',
                offset: 2
            })
        );
        assert!(matches!(
            codec.encode(b"ACGTACGTA", 9),
            Err(PrimerError::LengthOutOfRange { len: 9, .. })
        ));
        assert!(matches!(
            codec.encode(b"ACG", 4),
            Err(PrimerError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn merged_prefixes_decode_independently() {
        let codec = KmerCodec::new(4, 8).unwrap();
        let long = codec.encode(b"ACGTTGCA", 8).unwrap();
        let short = codec.encode(b"ACGTTG", 6).unwrap();
        let mut both = long.merge(short).unwrap();
        assert_eq!(codec.live_lengths(both).collect::<Vec<_>>(), vec![6, 8]);
        assert_eq!(codec.decode(both, 6).unwrap(), b"ACGTTG");

        codec.clear_length(&mut both, 8).unwrap();
        assert_eq!(
            codec.decode(both, 8),
            Err(PrimerError::DeadVariant { len: 8 })
        );
        assert_eq!(codec.decode(both, 6).unwrap(), b"ACGTTG");

        codec.clear_length(&mut both, 6).unwrap();
        assert!(both.is_dead());
    }

    #[test]
    fn merge_rejects_non_prefix() {
        let codec = KmerCodec::new(4, 8).unwrap();
        let a = codec.encode(b"ACGTTGCA", 8).unwrap();
        let b = codec.encode(b"TTTTT", 5).unwrap();
        assert!(a.merge(b).is_none());
    }

    #[test]
    fn codec_range_must_fit_mask() {
        assert!(KmerCodec::new(10, 25).is_ok());
        assert!(KmerCodec::new(10, 26).is_err());
        assert!(KmerCodec::new(20, 32).is_err());
        assert!(KmerCodec::new(0, 4).is_err());
    }

    #[test]
    fn variant_equality_is_sequence_identity() {
        let codec = KmerCodec::new(4, 8).unwrap();
        let a = codec.encode(b"ACGTA", 5).unwrap();
        let b = codec
            .encode(b"ACGTAGG", 7)
            .unwrap()
            .merge(codec.encode(b"ACGTA", 5).unwrap())
            .unwrap();
        assert_eq!(codec.variant(a, 5).unwrap(), codec.variant(b, 5).unwrap());
        assert_ne!(a, b);
        assert_eq!(codec.variant(a, 5).unwrap().to_string(), "ACGTA");
    }
}
