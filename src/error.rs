//! Error taxonomy shared by the codec, reducer, filters and pairing engine.

use thiserror::Error;

/// Errors returned by the primer design core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrimerError {
    /// Non-ACGT base met while encoding. Isolated: the occurrence is skipped.
    #[error("invalid symbol {:?} at offset {offset}", char::from(*symbol))]
    InvalidSymbol { symbol: u8, offset: usize },

    /// Requested k-mer length falls outside the configured `[min, max]` bounds.
    #[error("length {len} outside configured range [{min}, {max}]")]
    LengthOutOfRange { len: usize, min: usize, max: usize },

    /// Decode requested for a cleared length-mask bit.
    #[error("length variant {len} is not live in this k-mer code")]
    DeadVariant { len: usize },

    /// No key survived the frequency cutoff.
    #[error("no k-mer reached the frequency cutoff of {cutoff} occurrences")]
    EmptyInput { cutoff: usize },

    /// A position exceeded the precomputed bit-vector length of its sequence.
    #[error("position {pos} out of bounds for sequence {seq_id} (length {len})")]
    IndexOutOfBounds { seq_id: u32, pos: u32, len: usize },

    /// `codes.len()` disagrees with the popcount of the position bit vector.
    #[error("index holds {codes} codes for {ones} set positions")]
    InconsistentIndex { codes: usize, ones: usize },

    /// An index stores a code with no live length left.
    #[error("dead k-mer code stored at rank {rank} of sequence {seq_id}")]
    DeadCode { seq_id: u32, rank: usize },

    /// Two codes stored at one position are not prefixes of each other.
    #[error("conflicting k-mers recorded at sequence {seq_id}, position {pos}")]
    InconsistentOccurrence { seq_id: u32, pos: u32 },

    /// The corpus has no slice for the requested `(sequence, position, length)`.
    #[error("corpus has no slice for sequence {seq_id} at {pos}+{len}")]
    MissingSequence { seq_id: u32, pos: u32, len: usize },

    /// Configuration rejected by [`crate::PrimerConfig::validate`].
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PrimerError {
    /// Errors confined to a single occurrence; the caller drops it and moves on.
    #[inline]
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            PrimerError::InvalidSymbol { .. } | PrimerError::MissingSequence { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PrimerError>;
