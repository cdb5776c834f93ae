//! Structured lifecycle events for arena runs.
//!
//! Every event carries `event` and `run_id` fields so log pipelines can
//! reconstruct a run's timeline from `info!` lines alone.

use tracing::info;

use crate::domain::run::RunStatus;

/// Span tagged with `run_id`, for instrumenting a run's driver future.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("arena.run", run_id = %run_id)
}

pub fn emit_run_created(run_id: &str, max_rounds: u32, generators: usize) {
    info!(
        event = "run.created",
        run_id = %run_id,
        max_rounds = max_rounds,
        generators = generators,
    );
}

pub fn emit_run_transition(run_id: &str, from: RunStatus, to: RunStatus, round: u32) {
    info!(
        event = "run.transition",
        run_id = %run_id,
        from = %from,
        to = %to,
        round = round,
    );
}

/// Emit event: a round finished evaluation.
pub fn emit_round_completed(
    run_id: &str,
    round: u32,
    candidates: usize,
    generation_failures: usize,
    best_score: Option<u8>,
    corpus_size: usize,
) {
    info!(
        event = "round.completed",
        run_id = %run_id,
        round = round,
        candidates = candidates,
        generation_failures = generation_failures,
        best_score = best_score,
        corpus_size = corpus_size,
    );
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, rounds: usize, score: u8) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        rounds = rounds,
        score = score,
    );
}

/// Emit event: the run was driven to `failed` (warning level).
pub fn emit_run_failed(run_id: &str, during: RunStatus, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "run.failed", run_id = %run_id, during = %during, error = %error);
}
