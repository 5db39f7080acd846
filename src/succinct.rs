//! Bit vector with rank/select support.
//!
//! Rank uses a cumulative popcount per 64-bit word (constant time). Select keeps
//! the word index of every `SELECT_STRIDE`-th set bit, like a two-level sampling
//! table: a query jumps to its sample, binary-searches the rank directory up to
//! the next sample, then picks the bit inside one word.

/// Distance (in set bits) between select samples.
pub const SELECT_STRIDE: usize = 256;

/// Fixed-length plain bit vector. Never grows after construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
}

impl BitVector {
    /// All-zero vector of `len` bits.
    pub fn new(len: usize) -> Self {
        BitVector {
            words: vec![0u64; len.div_ceil(64)],
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        i < self.len && (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Set bit `i`. Returns `false` (and changes nothing) if `i >= len`.
    #[inline]
    pub fn set(&mut self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        self.words[i / 64] |= 1u64 << (i % 64);
        true
    }

    /// Clear bit `i`. Returns `false` if `i >= len`.
    #[inline]
    pub fn clear(&mut self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        self.words[i / 64] &= !(1u64 << (i % 64));
        true
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Positions of set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let mut rest = w;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let b = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(wi * 64 + b)
            })
        })
    }
}

/// Immutable bit vector with its rank directory and select samples.
///
/// Mutation goes through [`RankSelect::into_bits`] and a fresh [`RankSelect::build`].
#[derive(Clone, Debug)]
pub struct RankSelect {
    bits: BitVector,
    // cum[w] = number of ones in words[0..w]; one trailing entry.
    cum: Vec<u64>,
    samples: Vec<u32>,
    ones: usize,
}

impl RankSelect {
    pub fn build(bits: BitVector) -> Self {
        let mut cum = Vec::with_capacity(bits.words.len() + 1);
        let mut samples = Vec::new();
        let mut total = 0u64;
        let mut next_sample = 1u64;
        for (wi, &w) in bits.words.iter().enumerate() {
            cum.push(total);
            total += w.count_ones() as u64;
            while next_sample <= total {
                samples.push(wi as u32);
                next_sample += SELECT_STRIDE as u64;
            }
        }
        cum.push(total);
        RankSelect {
            bits,
            cum,
            samples,
            ones: total as usize,
        }
    }

    #[inline]
    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    pub fn into_bits(self) -> BitVector {
        self.bits
    }

    /// Bit length.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.len == 0
    }

    /// Total number of set bits.
    #[inline]
    pub fn ones(&self) -> usize {
        self.ones
    }

    /// Number of set bits in `[0, pos)`; `pos` beyond the end counts everything.
    #[inline]
    pub fn rank(&self, pos: usize) -> usize {
        if pos >= self.bits.len {
            return self.ones;
        }
        let (w, b) = (pos / 64, pos % 64);
        let below = if b == 0 {
            0
        } else {
            (self.bits.words[w] & ((1u64 << b) - 1)).count_ones() as u64
        };
        (self.cum[w] + below) as usize
    }

    /// Position of the `r`-th set bit (1-indexed). `None` for `r == 0` or `r > ones`.
    pub fn select(&self, r: usize) -> Option<usize> {
        if r == 0 || r > self.ones {
            return None;
        }
        let idx = (r - 1) / SELECT_STRIDE;
        let lo = self.samples[idx] as usize;
        let hi = self
            .samples
            .get(idx + 1)
            .map(|&w| w as usize + 1)
            .unwrap_or(self.bits.words.len());
        let target = r as u64;
        let w = lo + self.cum[lo + 1..=hi].partition_point(|&c| c < target);
        let mut word = self.bits.words[w];
        for _ in 0..(target - self.cum[w] - 1) {
            word &= word - 1;
        }
        Some(w * 64 + word.trailing_zeros() as usize)
    }
}
