//! Chemistry predicates and scorers over decoded k-mer bases.
//!
//! All functions take plain ASCII bases (case-insensitive). Anything outside
//! `ACGT` counts toward the length but never toward CG or base pairing.

use crate::config::{MeltMethod, PrimerConfig};
use crate::encode::map_base;

/// Bases inspected by the CG clamp check.
pub const CLAMP_WINDOW: usize = 5;
/// At most this many C/G among the clamp window.
pub const CLAMP_MAX_CG: usize = 3;
/// Longest tolerated homopolymer run and dinucleotide repeat count.
pub const MAX_RUN: usize = 4;

#[inline]
fn is_cg(b: u8) -> bool {
    matches!(map_base(b), Some(1 | 2))
}

#[inline]
fn is_at(b: u8) -> bool {
    matches!(map_base(b), Some(0 | 3))
}

fn cg_count(bases: &[u8]) -> usize {
    bases.iter().filter(|&&b| is_cg(b)).count()
}

/// 2·(A+T) + 4·(C+G).
pub fn wallace_tm(bases: &[u8]) -> f64 {
    let at = bases.iter().filter(|&&b| is_at(b)).count();
    (2 * at + 4 * cg_count(bases)) as f64
}

/// 100.5 + 41·CG/len − 820/len + 16.6·log10(Na).
pub fn salt_adjusted_tm(bases: &[u8], na: f64) -> f64 {
    if bases.is_empty() {
        return f64::NAN;
    }
    let len = bases.len() as f64;
    100.5 + 41.0 * cg_count(bases) as f64 / len - 820.0 / len + 16.6 * na.log10()
}

pub fn melting_temperature(bases: &[u8], method: MeltMethod) -> f64 {
    match method {
        MeltMethod::Wallace => wallace_tm(bases),
        MeltMethod::SaltAdjusted { na } => salt_adjusted_tm(bases, na),
    }
}

/// CG count over length; 0 for an empty slice.
pub fn cg_fraction(bases: &[u8]) -> f64 {
    if bases.is_empty() {
        return 0.0;
    }
    cg_count(bases) as f64 / bases.len() as f64
}

/// `min <= CG/len <= max`, inclusive at both ends.
pub fn cg_content_in_range(bases: &[u8], min: f64, max: f64) -> bool {
    if bases.is_empty() {
        return false;
    }
    let f = cg_fraction(bases);
    f >= min && f <= max
}

/// Strand orientation of a primer relative to the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    /// 3′ end at the first bases.
    Plus,
    /// 3′ end at the last bases.
    Minus,
}

/// At most [`CLAMP_MAX_CG`] of the [`CLAMP_WINDOW`] terminal bases are C/G.
pub fn cg_clamp_ok(bases: &[u8], sense: Sense) -> bool {
    let w = CLAMP_WINDOW.min(bases.len());
    let end = match sense {
        Sense::Plus => &bases[..w],
        Sense::Minus => &bases[bases.len() - w..],
    };
    cg_count(end) <= CLAMP_MAX_CG
}

fn longest_homopolymer(bases: &[u8]) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev = None;
    for b in bases.iter().map(|b| b.to_ascii_uppercase()) {
        run = if prev == Some(b) { run + 1 } else { 1 };
        prev = Some(b);
        best = best.max(run);
    }
    best
}

/// Longest stretch of a repeated two-base unit `XY` with `X != Y`, in units.
fn longest_dinucleotide_repeat(bases: &[u8]) -> usize {
    let up: Vec<u8> = bases.iter().map(|b| b.to_ascii_uppercase()).collect();
    let mut best = 0;
    for phase in 0..2 {
        let mut units = 0;
        let mut prev: Option<&[u8]> = None;
        for unit in up[phase..].chunks_exact(2) {
            if unit[0] == unit[1] {
                units = 0;
                prev = None;
                continue;
            }
            units = if prev == Some(unit) { units + 1 } else { 1 };
            prev = Some(unit);
            best = best.max(units);
        }
    }
    best
}

/// No homopolymer run and no dinucleotide repeat longer than [`MAX_RUN`].
/// Sequences of [`MAX_RUN`] bases or fewer always pass.
pub fn repeats_runs_ok(bases: &[u8]) -> bool {
    if bases.len() <= MAX_RUN {
        return true;
    }
    longest_homopolymer(bases) <= MAX_RUN && longest_dinucleotide_repeat(bases) <= MAX_RUN
}

#[inline]
fn pair_weight(x: u8, y: u8) -> f64 {
    match (map_base(x), map_base(y)) {
        (Some(0), Some(3)) | (Some(3), Some(0)) => 1.0,
        (Some(1), Some(2)) | (Some(2), Some(1)) => 2.0,
        _ => 0.0,
    }
}

fn overlap_energy(x: &[u8], y: &[u8]) -> f64 {
    -x.iter().zip(y).map(|(&a, &b)| pair_weight(a, b)).sum::<f64>()
}

/// Most negative `-(2·CG + AT)` over every relative offset of `a` and `b`
/// whose overlap spans at least `min_overlap` bases. Zero if none qualifies.
pub fn pairing_energy(a: &[u8], b: &[u8], min_overlap: usize) -> f64 {
    let min_overlap = min_overlap.max(1);
    let mut best = 0.0f64;
    for s in 0..a.len() {
        if (a.len() - s).min(b.len()) < min_overlap {
            break;
        }
        best = best.min(overlap_energy(&a[s..], b));
    }
    for s in 1..b.len() {
        if (b.len() - s).min(a.len()) < min_overlap {
            break;
        }
        best = best.min(overlap_energy(a, &b[s..]));
    }
    best
}

pub fn self_dimerization_ok(bases: &[u8], threshold: f64, min_overlap: usize) -> bool {
    pairing_energy(bases, bases, min_overlap) >= threshold
}

pub fn cross_dimerization_ok(a: &[u8], b: &[u8], threshold: f64, min_overlap: usize) -> bool {
    pairing_energy(a, b, min_overlap) >= threshold
}

/// Chemistry bounds lifted out of a [`PrimerConfig`].
#[derive(Clone, Copy, Debug)]
pub struct Chemistry {
    method: MeltMethod,
    tm: (f64, f64),
    cg: (f64, f64),
    max_delta_tm: f64,
    clamp: bool,
    threshold: f64,
    min_overlap: usize,
}

impl Chemistry {
    pub fn new(cfg: &PrimerConfig) -> Self {
        Chemistry {
            method: cfg.method(),
            tm: cfg.tm_range(),
            cg: cfg.cg_range(),
            max_delta_tm: cfg.delta_tm_limit(),
            clamp: cfg.cg_clamp_enabled(),
            threshold: cfg.dimer_energy_threshold(),
            min_overlap: cfg.dimer_overlap(),
        }
    }

    #[inline]
    pub fn tm(&self, bases: &[u8]) -> f64 {
        melting_temperature(bases, self.method)
    }

    /// Single-primer checks: Tm, CG content, self-dimerization, repeats.
    pub fn variant_ok(&self, bases: &[u8]) -> bool {
        let tm = self.tm(bases);
        tm >= self.tm.0
            && tm <= self.tm.1
            && cg_content_in_range(bases, self.cg.0, self.cg.1)
            && self_dimerization_ok(bases, self.threshold, self.min_overlap)
            && repeats_runs_ok(bases)
    }

    /// Pair checks; `Some(|ΔTm|)` if `fwd`/`rev` may form a primer pair.
    pub fn pair_ok(&self, fwd: &[u8], rev: &[u8]) -> Option<f64> {
        if !cross_dimerization_ok(fwd, rev, self.threshold, self.min_overlap) {
            return None;
        }
        let delta = (self.tm(fwd) - self.tm(rev)).abs();
        if delta > self.max_delta_tm {
            return None;
        }
        if self.clamp && !(cg_clamp_ok(fwd, Sense::Minus) && cg_clamp_ok(rev, Sense::Plus)) {
            return None;
        }
        Some(delta)
    }
}
