//! Injected observability collaborator.
//!
//! The core never logs through process-wide state: every stage receives an
//! `&dyn Observer` and reports stage totals, dropped occurrences and warnings to it.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::PrimerError;
use crate::occurrence::KmerKey;

/// Pipeline stage names reported to [`Observer::stage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Keys meeting the frequency cutoff (after the symmetry skip).
    FrequencyCutoff,
    /// Start positions recorded over all sequence indexes.
    IndexBuilt,
    /// Start positions left after single-kmer chemistry filtering.
    ChemistryFiltered,
    /// Distinct k-mer pairs found by the pairing engine.
    Paired,
    /// Pairs left after the pair frequency cutoff.
    PairCutoff,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FrequencyCutoff => "frequency_cutoff",
            Stage::IndexBuilt => "index_built",
            Stage::ChemistryFiltered => "chemistry_filtered",
            Stage::Paired => "paired",
            Stage::PairCutoff => "pair_cutoff",
        }
    }
}

/// Receiver for pipeline diagnostics. Must tolerate calls from worker threads.
pub trait Observer: Sync {
    /// A stage finished with `survivors` items.
    fn stage(&self, _stage: Stage, _survivors: usize) {}

    /// Wall-clock time spent in `stage`.
    fn timing(&self, _stage: Stage, _elapsed: Duration) {}

    /// One occurrence key was dropped because of an isolated error.
    fn dropped(&self, _key: &KmerKey, _err: &PrimerError) {}

    /// Recoverable condition worth surfacing (e.g. empty input).
    fn warn(&self, _message: &str) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn stage(&self, stage: Stage, survivors: usize) {
        tracing::info!(stage = stage.as_str(), survivors, "stage complete");
    }

    fn timing(&self, stage: Stage, elapsed: Duration) {
        tracing::info!(
            stage = stage.as_str(),
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "stage timing"
        );
    }

    fn dropped(&self, key: &KmerKey, err: &PrimerError) {
        tracing::debug!(
            seq_id = key.seq_id,
            pos = key.pos,
            len = key.len,
            error = %err,
            "occurrence dropped"
        );
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Counts events; handy for assertions and end-of-run summaries.
#[derive(Debug, Default)]
pub struct CountingObserver {
    dropped: AtomicUsize,
    warnings: AtomicUsize,
    last: [AtomicUsize; 5],
    // Nanoseconds + 1; zero means never reported.
    nanos: [AtomicU64; 5],
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Last survivor count reported for `stage`.
    pub fn survivors(&self, stage: Stage) -> usize {
        self.last[stage as usize].load(Ordering::Relaxed)
    }

    /// Last duration reported for `stage`, if any.
    pub fn elapsed(&self, stage: Stage) -> Option<Duration> {
        match self.nanos[stage as usize].load(Ordering::Relaxed) {
            0 => None,
            n => Some(Duration::from_nanos(n - 1)),
        }
    }
}

impl Observer for CountingObserver {
    fn stage(&self, stage: Stage, survivors: usize) {
        self.last[stage as usize].store(survivors, Ordering::Relaxed);
    }

    fn timing(&self, stage: Stage, elapsed: Duration) {
        let n = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX - 1);
        self.nanos[stage as usize].store(n.saturating_add(1), Ordering::Relaxed);
    }

    fn dropped(&self, _key: &KmerKey, _err: &PrimerError) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn warn(&self, _message: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }
}
