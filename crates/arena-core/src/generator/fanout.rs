//! Concurrent fan-out to every registered generator, fan-in by index.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use super::{CandidateGenerator, GenerationRequest};
use crate::cancel::CancelSignal;
use crate::domain::candidate::{Candidate, GenerationFailure, GeneratorId};
use crate::domain::error::{ArenaError, ArenaResult};
use crate::metrics::METRICS;

/// Bounds applied to one round's fan-out.
#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Maximum generator calls in flight at once.
    pub max_concurrent: usize,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            timeout: Duration::from_secs(60),
        }
    }
}

/// What one round's fan-out produced.
///
/// Both lists are in generator registration order.
#[derive(Debug, Clone, Default)]
pub struct FanOutOutcome {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<GenerationFailure>,
}

impl FanOutOutcome {
    /// Per-generator result, for updating draft slots.
    pub fn slot_results(&self) -> Vec<(GeneratorId, Result<String, String>)> {
        let ok = self
            .candidates
            .iter()
            .map(|c| (c.generator().clone(), Ok(c.pattern().to_string())));
        let failed = self
            .failures
            .iter()
            .map(|f| (f.generator.clone(), Err(f.reason.clone())));
        ok.chain(failed).collect()
    }
}

/// Invoke every generator once for `round`.
///
/// Individual failures (error, timeout, panic, empty pattern) are collected,
/// never propagated. Returns `Err(Cancelled)` if `cancel` fires, after
/// aborting every in-flight call.
#[instrument(skip_all, fields(round = round, generators = generators.len()))]
pub async fn fan_out(
    generators: &[Arc<dyn CandidateGenerator>],
    request: Arc<GenerationRequest>,
    round: u32,
    config: &FanOutConfig,
    cancel: &CancelSignal,
) -> ArenaResult<FanOutOutcome> {
    let sem = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let mut set = JoinSet::new();

    for (index, generator) in generators.iter().enumerate() {
        let generator = Arc::clone(generator);
        let request = Arc::clone(&request);
        let sem = Arc::clone(&sem);
        let timeout = config.timeout;

        set.spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let call = AssertUnwindSafe(generator.generate(&request)).catch_unwind();
            let outcome = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(Ok(resp))) if resp.pattern.is_empty() => {
                    Err("generator returned an empty pattern".to_string())
                }
                Ok(Ok(Ok(resp))) => Ok(resp.pattern),
                Ok(Ok(Err(e))) => Err(e.to_string()),
                Ok(Err(_panic)) => Err("generator panicked".to_string()),
                Err(_elapsed) => Err(format!(
                    "generator timed out after {}ms",
                    timeout.as_millis()
                )),
            };
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<Result<String, String>>> = vec![None; generators.len()];
    loop {
        tokio::select! {
            joined = set.join_next() => match joined {
                Some(Ok((index, outcome))) => slots[index] = Some(outcome),
                Some(Err(e)) => warn!(error = %e, "generator task did not complete"),
                None => break,
            },
            _ = cancel.cancelled() => {
                set.abort_all();
                debug!("fan-out cancelled");
                return Err(ArenaError::Cancelled);
            }
        }
    }

    let mut outcome = FanOutOutcome::default();
    for (index, (generator, slot)) in generators.iter().zip(slots).enumerate() {
        let id = GeneratorId::new(index, generator.name());
        match slot {
            Some(Ok(pattern)) => {
                METRICS.inc_candidates_generated();
                outcome.candidates.push(Candidate::new(pattern, id, round));
            }
            Some(Err(reason)) => {
                METRICS.inc_generation_failures();
                warn!(generator = %id, reason = %reason, "generator excluded this round");
                outcome.failures.push(GenerationFailure {
                    generator: id,
                    reason,
                });
            }
            None => {
                METRICS.inc_generation_failures();
                outcome.failures.push(GenerationFailure {
                    generator: id,
                    reason: "generator task did not complete".to_string(),
                });
            }
        }
    }

    Ok(outcome)
}
