//! Pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the generator, the workers and the consumer
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    jobs_generated: AtomicU64,
    attempts: AtomicU64,
    solved: AtomicU64,
    discarded: AtomicU64,
    materialized: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_job(&self) {
        self.jobs_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attempt(&self, solved: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if solved {
            self.solved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_materialized(&self) {
        self.materialized.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            jobs_generated: self.jobs_generated.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            solved: self.solved.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            materialized: self.materialized.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Jobs the generator enqueued
    pub jobs_generated: u64,
    /// Bounded searches the workers ran
    pub attempts: u64,
    /// Attempts that ended solved and were published
    pub solved: u64,
    /// Attempts that were dropped (budget exhausted, impossible, cancelled)
    pub discarded: u64,
    /// Results drained into the cache
    pub materialized: u64,
}
