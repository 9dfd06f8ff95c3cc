//! Annotation progress reporting

use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of one annotation record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted,
    Skipped,
}

/// Observer notified once per annotation record
pub trait ProgressSink: Send + Sync {
    fn record(&self, outcome: RecordOutcome);
}

/// Counts accepted and skipped annotations; shareable across workers
#[derive(Debug, Default)]
pub struct ProgressCounter {
    accepted: AtomicUsize,
    skipped: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ProgressCounter {
    fn record(&self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Accepted => self.accepted.fetch_add(1, Ordering::Relaxed),
            RecordOutcome::Skipped => self.skipped.fetch_add(1, Ordering::Relaxed),
        };
    }
}
