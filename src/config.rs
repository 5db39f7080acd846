//! Primer design configuration (consumed, not owned, by the core).

use crate::encode::KmerCodec;
use crate::error::{PrimerError, Result};

/// Melting temperature model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeltMethod {
    /// 2·(A+T) + 4·(C+G), °C.
    Wallace,
    /// 100.5 + 41·CG/len − 820/len + 16.6·log10(Na); `na` in mol/L.
    SaltAdjusted { na: f64 },
}

/// Minimum number of occurrences a k-mer (or pair) needs to be kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrequencyCutoff {
    /// Absolute occurrence count.
    Count(usize),
    /// Percentage of corpus sequences, rounded up.
    Percent(f64),
}

impl FrequencyCutoff {
    /// Absolute cutoff for a corpus of `num_sequences` (never below 1).
    pub fn resolve(&self, num_sequences: usize) -> usize {
        match *self {
            FrequencyCutoff::Count(n) => n.max(1),
            FrequencyCutoff::Percent(p) => {
                let c = (p.max(0.0) * num_sequences as f64 / 100.0).ceil() as usize;
                c.max(1)
            }
        }
    }
}

/// Primer and amplicon constraints.
#[derive(Clone, Debug)]
pub struct PrimerConfig {
    min_len: usize,
    max_len: usize,
    min_offset: usize,
    max_offset: usize,
    min_tm: f64,
    max_tm: f64,
    melt_method: MeltMethod,
    max_delta_tm: f64,
    min_cg: f64,
    max_cg: f64,
    cg_clamp: bool,
    kmer_cutoff: FrequencyCutoff,
    pair_cutoff: FrequencyCutoff,
    dimer_threshold: f64,
    dimer_min_overlap: usize,
}

impl Default for PrimerConfig {
    fn default() -> Self {
        Self {
            min_len: 16,
            max_len: 25,
            min_offset: 60,
            max_offset: 150,
            min_tm: 52.0,
            max_tm: 58.0,
            melt_method: MeltMethod::Wallace,
            max_delta_tm: 5.0,
            min_cg: 0.4,
            max_cg: 0.6,
            cg_clamp: false,
            kmer_cutoff: FrequencyCutoff::Percent(20.0),
            pair_cutoff: FrequencyCutoff::Count(1),
            dimer_threshold: -10.0,
            dimer_min_overlap: 2,
        }
    }
}

impl PrimerConfig {
    /// Inclusive primer length range (recommended 18..=22).
    pub fn primer_lengths(mut self, min: usize, max: usize) -> Self {
        self.min_len = min;
        self.max_len = max;
        self
    }
    /// Amplicon window: admissible gap between forward end and reverse start,
    /// `[min, max)`.
    pub fn amplicon_window(mut self, min: usize, max: usize) -> Self {
        self.min_offset = min;
        self.max_offset = max;
        self
    }
    /// Inclusive melting temperature bounds (°C).
    pub fn melting_range(mut self, min: f64, max: f64) -> Self {
        self.min_tm = min;
        self.max_tm = max;
        self
    }
    pub fn melt_method(mut self, m: MeltMethod) -> Self {
        self.melt_method = m;
        self
    }
    /// Maximal |ΔTm| between paired primers. Above ~5 K amplification may fail.
    pub fn max_delta_tm(mut self, d: f64) -> Self {
        self.max_delta_tm = d;
        self
    }
    /// Inclusive relative CG content bounds.
    pub fn cg_content(mut self, min: f64, max: f64) -> Self {
        self.min_cg = min;
        self.max_cg = max;
        self
    }
    /// Require the 3' CG clamp on both primers of a pair (default: off).
    pub fn cg_clamp(mut self, yes: bool) -> Self {
        self.cg_clamp = yes;
        self
    }
    pub fn kmer_cutoff(mut self, c: FrequencyCutoff) -> Self {
        self.kmer_cutoff = c;
        self
    }
    /// Minimum number of distinct sequences a pair must occur in.
    pub fn pair_cutoff(mut self, c: FrequencyCutoff) -> Self {
        self.pair_cutoff = c;
        self
    }
    /// Dimer energy cutoff; more negative is more stable (worse).
    pub fn dimer_threshold(mut self, dg: f64) -> Self {
        self.dimer_threshold = dg;
        self
    }
    /// Minimal overlap scored by the sliding dimer alignment.
    pub fn dimer_min_overlap(mut self, n: usize) -> Self {
        self.dimer_min_overlap = n.max(1);
        self
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }
    pub fn max_len(&self) -> usize {
        self.max_len
    }
    pub fn min_offset(&self) -> usize {
        self.min_offset
    }
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }
    pub fn tm_range(&self) -> (f64, f64) {
        (self.min_tm, self.max_tm)
    }
    pub fn method(&self) -> MeltMethod {
        self.melt_method
    }
    pub fn delta_tm_limit(&self) -> f64 {
        self.max_delta_tm
    }
    pub fn cg_range(&self) -> (f64, f64) {
        (self.min_cg, self.max_cg)
    }
    pub fn cg_clamp_enabled(&self) -> bool {
        self.cg_clamp
    }
    pub fn kmer_frequency(&self) -> FrequencyCutoff {
        self.kmer_cutoff
    }
    pub fn pair_frequency(&self) -> FrequencyCutoff {
        self.pair_cutoff
    }
    pub fn dimer_energy_threshold(&self) -> f64 {
        self.dimer_threshold
    }
    pub fn dimer_overlap(&self) -> usize {
        self.dimer_min_overlap
    }

    /// Codec for the configured length range.
    pub fn codec(&self) -> Result<KmerCodec> {
        KmerCodec::new(self.min_len, self.max_len)
    }

    /// Reject inconsistent settings before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.codec()?;
        if self.min_offset >= self.max_offset {
            return Err(PrimerError::InvalidConfig(format!(
                "amplicon window [{}, {}) is empty",
                self.min_offset, self.max_offset
            )));
        }
        if !(self.min_tm <= self.max_tm) {
            return Err(PrimerError::InvalidConfig(format!(
                "melting range [{}, {}] is empty",
                self.min_tm, self.max_tm
            )));
        }
        if !(0.0..=1.0).contains(&self.min_cg)
            || !(0.0..=1.0).contains(&self.max_cg)
            || self.min_cg > self.max_cg
        {
            return Err(PrimerError::InvalidConfig(format!(
                "CG content bounds [{}, {}] must be ordered fractions",
                self.min_cg, self.max_cg
            )));
        }
        if let MeltMethod::SaltAdjusted { na } = self.melt_method {
            if !(na > 0.0) {
                return Err(PrimerError::InvalidConfig(format!(
                    "Na+ concentration must be positive, got {na}"
                )));
            }
        }
        if !(self.max_delta_tm >= 0.0) {
            return Err(PrimerError::InvalidConfig("max ΔTm must be >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PrimerConfig::default().validate().is_ok());
    }

    #[test]
    fn percent_cutoff_rounds_up() {
        assert_eq!(FrequencyCutoff::Percent(20.0).resolve(11), 3);
        assert_eq!(FrequencyCutoff::Percent(20.0).resolve(10), 2);
        assert_eq!(FrequencyCutoff::Percent(0.0).resolve(10), 1);
        assert_eq!(FrequencyCutoff::Count(0).resolve(10), 1);
    }

    #[test]
    fn rejects_bad_settings() {
        let c = PrimerConfig::default().primer_lengths(10, 30);
        assert!(c.validate().is_err());
        let c = PrimerConfig::default().amplicon_window(100, 100);
        assert!(c.validate().is_err());
        let c = PrimerConfig::default().cg_content(0.7, 0.3);
        assert!(c.validate().is_err());
        let c = PrimerConfig::default().melt_method(MeltMethod::SaltAdjusted { na: 0.0 });
        assert!(c.validate().is_err());
    }
}
