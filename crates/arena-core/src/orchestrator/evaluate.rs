//! Per-round evaluation fan-out through the isolated executor.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::cancel::CancelSignal;
use crate::domain::candidate::{Candidate, CandidateOutcome};
use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::evaluation::EvaluationResult;
use crate::sandbox::{ExecutionRequest, IsolatedExecutor, SandboxError};

/// Evaluate every candidate against the same frozen corpus.
///
/// Calls run concurrently; the executor bounds how many actually execute.
/// Outcomes come back in candidate order. Per-candidate failures become
/// results; cancellation and an unusable executor abort the round.
pub(crate) async fn evaluate_all(
    executor: Arc<dyn IsolatedExecutor>,
    candidates: Vec<Candidate>,
    corpus: Arc<Corpus>,
    cancel: &CancelSignal,
) -> ArenaResult<Vec<CandidateOutcome>> {
    let mut set = JoinSet::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let executor = Arc::clone(&executor);
        let request = ExecutionRequest {
            candidate_id: candidate.id().to_string(),
            pattern: candidate.pattern().to_string(),
            corpus: Arc::clone(&corpus),
        };
        let signal = cancel.clone();
        set.spawn(async move { (index, executor.execute(request, signal).await) });
    }

    let mut results: Vec<Option<EvaluationResult>> = vec![None; candidates.len()];
    loop {
        let joined = tokio::select! {
            joined = set.join_next() => joined,
            _ = cancel.cancelled() => {
                set.abort_all();
                return Err(ArenaError::Cancelled);
            }
        };
        let Some(joined) = joined else { break };
        let (index, outcome) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                set.abort_all();
                return Err(ArenaError::Internal(format!("evaluation task failed: {}", e)));
            }
        };
        let result = match outcome {
            Ok(result) => result,
            Err(SandboxError::Cancelled) => {
                set.abort_all();
                return Err(ArenaError::Cancelled);
            }
            Err(SandboxError::Timeout { limit_ms, .. }) => {
                EvaluationResult::timed_out_unfinished(&corpus, limit_ms)
            }
            Err(SandboxError::Crashed(reason)) => EvaluationResult::worker_failed(
                &corpus,
                format!("Evaluation worker crashed: {}", reason),
            ),
            Err(other) => {
                set.abort_all();
                return Err(ArenaError::Internal(other.to_string()));
            }
        };
        results[index] = Some(result);
    }

    candidates
        .into_iter()
        .zip(results)
        .map(|(candidate, result)| {
            let result = result.ok_or_else(|| {
                ArenaError::Internal(format!("no evaluation recorded for {}", candidate.id()))
            })?;
            Ok(CandidateOutcome { candidate, result })
        })
        .collect()
}
