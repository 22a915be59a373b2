//! Per-key cumulative execution telemetry.
//!
//! Each model/script value owns one [`StatsBlock`]. Counters are atomics so
//! a RUN completing on a worker thread can record its outcome without
//! touching the keyspace lock, and RESETSTAT can zero everything without
//! replacing the owning value.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Cumulative run telemetry for one model or script key.
///
/// `samples` is adapter-reported metadata: backends that have no meaningful
/// notion of sample count hold it at -1 permanently.
#[derive(Debug)]
pub struct StatsBlock {
    duration_us: AtomicU64,
    samples: AtomicI64,
    calls: AtomicU64,
    errors: AtomicU64,
    samples_defined: bool,
}

impl StatsBlock {
    /// Stats for a backend that reports sample counts.
    pub fn new() -> Self {
        StatsBlock {
            duration_us: AtomicU64::new(0),
            samples: AtomicI64::new(0),
            calls: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            samples_defined: true,
        }
    }

    /// Stats for a backend where sample counts are undefined (-1).
    pub fn without_samples() -> Self {
        StatsBlock {
            duration_us: AtomicU64::new(0),
            samples: AtomicI64::new(-1),
            calls: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            samples_defined: false,
        }
    }

    /// Record a successful run: calls++, duration and samples accumulate.
    pub fn record_success(&self, duration_us: u64, samples: i64) {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.duration_us.fetch_add(duration_us, Ordering::AcqRel);
        if self.samples_defined {
            self.samples.fetch_add(samples, Ordering::AcqRel);
        }
    }

    /// Record a failed run: calls++ and errors++, nothing else moves.
    ///
    /// Also used when input binding fails before the adapter is invoked.
    pub fn record_failure(&self) {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.errors.fetch_add(1, Ordering::AcqRel);
    }

    /// Zero all counters, leaving the owning value untouched.
    pub fn reset(&self) {
        self.duration_us.store(0, Ordering::Release);
        self.calls.store(0, Ordering::Release);
        self.errors.store(0, Ordering::Release);
        let base = if self.samples_defined { 0 } else { -1 };
        self.samples.store(base, Ordering::Release);
    }

    /// Consistent point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            duration_us: self.duration_us.load(Ordering::Acquire),
            samples: self.samples.load(Ordering::Acquire),
            calls: self.calls.load(Ordering::Acquire),
            errors: self.errors.load(Ordering::Acquire),
        }
    }
}

impl Default for StatsBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of a [`StatsBlock`], as reported by INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Cumulative run duration in microseconds.
    pub duration_us: u64,
    /// Cumulative sample count, or -1 when undefined for the backend.
    pub samples: i64,
    /// Total RUN invocations, successful or not.
    pub calls: u64,
    /// Failed RUN invocations.
    pub errors: u64,
}
