//! Global atomic counters for arena activity.
//!
//! Counters are bumped silently at the call site. Call [`Metrics::flush`]
//! to emit the current values as one `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    candidates_generated: AtomicU64,
    generation_failures: AtomicU64,
    evaluations_run: AtomicU64,
    evaluation_timeouts: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            candidates_generated: AtomicU64::new(0),
            generation_failures: AtomicU64::new(0),
            evaluations_run: AtomicU64::new(0),
            evaluation_timeouts: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
        }
    }

    pub fn inc_candidates_generated(&self) {
        self.candidates_generated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "candidates_generated", "counter incremented");
    }

    pub fn inc_generation_failures(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "generation_failures", "counter incremented");
    }

    pub fn inc_evaluations(&self) {
        self.evaluations_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "evaluations_run", "counter incremented");
    }

    pub fn inc_evaluation_timeouts(&self) {
        self.evaluation_timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "evaluation_timeouts", "counter incremented");
    }

    pub fn inc_runs_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_completed", "counter incremented");
    }

    pub fn inc_runs_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_failed", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call at natural boundaries such as the end of a run.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            candidates_generated = self.candidates_generated(),
            generation_failures = self.generation_failures(),
            evaluations_run = self.evaluations_run(),
            evaluation_timeouts = self.evaluation_timeouts(),
            runs_completed = self.runs_completed(),
            runs_failed = self.runs_failed(),
        );
    }

    pub fn candidates_generated(&self) -> u64 {
        self.candidates_generated.load(Ordering::Relaxed)
    }

    pub fn generation_failures(&self) -> u64 {
        self.generation_failures.load(Ordering::Relaxed)
    }

    pub fn evaluations_run(&self) -> u64 {
        self.evaluations_run.load(Ordering::Relaxed)
    }

    pub fn evaluation_timeouts(&self) -> u64 {
        self.evaluation_timeouts.load(Ordering::Relaxed)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.candidates_generated.store(0, Ordering::Relaxed);
        self.generation_failures.store(0, Ordering::Relaxed);
        self.evaluations_run.store(0, Ordering::Relaxed);
        self.evaluation_timeouts.store(0, Ordering::Relaxed);
        self.runs_completed.store(0, Ordering::Relaxed);
        self.runs_failed.store(0, Ordering::Relaxed);
    }
}
