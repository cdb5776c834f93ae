//! Execution controls: wall-clock limit, bounded concurrency, cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::error::{SandboxError, SandboxResult};
use crate::cancel::CancelSignal;
use crate::domain::corpus::Corpus;
use crate::domain::evaluation::{EvaluationResult, FailureKind};
use crate::harness::{self, EvalBudget, HarnessLimits};
use crate::metrics::METRICS;

/// Slack given to the worker past its own deadline before the executor
/// stops waiting for it.
const JOIN_GRACE: Duration = Duration::from_millis(50);

/// Trips the worker's abort flag when the call scope ends, including when
/// the calling future is dropped mid-flight.
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Configuration for isolated pattern evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Maximum wall-clock time for one evaluation (milliseconds).
    pub timeout_ms: u64,
    /// Maximum number of evaluations running at once.
    pub max_concurrent: usize,
    /// Longest pattern accepted, in bytes.
    pub max_pattern_len: usize,
    /// Upper bound on compiled program size.
    pub size_limit_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let limits = HarnessLimits::default();
        Self {
            timeout_ms: 5_000,
            max_concurrent: 2,
            max_pattern_len: limits.max_pattern_len,
            size_limit_bytes: limits.size_limit_bytes,
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> SandboxResult<()> {
        if self.timeout_ms == 0 {
            return Err(SandboxError::InvalidConfig(
                "timeout_ms must be positive".into(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(SandboxError::InvalidConfig(
                "max_concurrent must be at least 1".into(),
            ));
        }
        if self.max_pattern_len == 0 || self.size_limit_bytes == 0 {
            return Err(SandboxError::InvalidConfig(
                "pattern limits must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn limits(&self) -> HarnessLimits {
        HarnessLimits {
            max_pattern_len: self.max_pattern_len,
            size_limit_bytes: self.size_limit_bytes,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// One pattern to evaluate against one frozen corpus.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub candidate_id: String,
    pub pattern: String,
    pub corpus: Arc<Corpus>,
}

/// Runs the evaluation harness in isolation from the orchestrator.
///
/// Implementations must bound wall-clock time, honor `cancel`, and release
/// every resource they acquired on all exit paths.
#[async_trait]
pub trait IsolatedExecutor: Send + Sync {
    /// Evaluate, returning a timeout-kind result when the limit is hit.
    ///
    /// Errors: `Cancelled` when `cancel` fires first, `Crashed` when the
    /// worker dies without producing a result.
    async fn execute(
        &self,
        request: ExecutionRequest,
        cancel: CancelSignal,
    ) -> SandboxResult<EvaluationResult>;
}

/// Signature of the function a worker runs.
pub type EvaluatorFn =
    Arc<dyn Fn(&str, &Corpus, &HarnessLimits, &EvalBudget) -> EvaluationResult + Send + Sync>;

/// In-process executor backed by tokio's blocking pool.
///
/// A semaphore bounds concurrent workers; each worker gets a deadline and an
/// abort flag that the harness polls between cases.
pub struct LocalSandbox {
    config: SandboxConfig,
    slots: Arc<Semaphore>,
    evaluator: EvaluatorFn,
}

impl LocalSandbox {
    pub fn new(config: SandboxConfig) -> SandboxResult<Self> {
        Self::with_evaluator(config, Arc::new(harness::evaluate_with))
    }

    /// Build with a custom worker function (used to simulate stuck or
    /// crashing workers).
    pub fn with_evaluator(config: SandboxConfig, evaluator: EvaluatorFn) -> SandboxResult<Self> {
        config.validate()?;
        Ok(Self {
            slots: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
            evaluator,
        })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Worker slots not currently leased.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

#[async_trait]
impl IsolatedExecutor for LocalSandbox {
    async fn execute(
        &self,
        request: ExecutionRequest,
        cancel: CancelSignal,
    ) -> SandboxResult<EvaluationResult> {
        // The permit moves into the worker and is released only when the
        // worker returns. The abort guard lives in this scope, so every exit
        // below, including the future being dropped, stops the worker at its
        // next case boundary.
        let permit = tokio::select! {
            permit = self.slots.clone().acquire_owned() => {
                permit.map_err(|_| SandboxError::Closed)?
            }
            _ = cancel.cancelled() => return Err(SandboxError::Cancelled),
        };

        let limit = self.config.timeout();
        let abort = Arc::new(AtomicBool::new(false));
        let budget = EvalBudget::new(limit, abort.clone());
        let _abort_guard = AbortOnDrop(abort);
        let limits = self.config.limits();
        let evaluator = self.evaluator.clone();
        let corpus = request.corpus.clone();
        let pattern = request.pattern.clone();
        let started = Instant::now();

        let mut worker = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            evaluator(&pattern, &corpus, &limits, &budget)
        });

        METRICS.inc_evaluations();
        let joined = tokio::select! {
            joined = tokio::time::timeout(limit + JOIN_GRACE, &mut worker) => joined,
            _ = cancel.cancelled() => {
                tracing::debug!(candidate = %request.candidate_id, "evaluation cancelled");
                return Err(SandboxError::Cancelled);
            }
        };

        match joined {
            Ok(Ok(result)) => {
                if result.failure_kind == FailureKind::Timeout {
                    METRICS.inc_evaluation_timeouts();
                }
                Ok(result)
            }
            Ok(Err(join_err)) => {
                tracing::warn!(
                    candidate = %request.candidate_id,
                    error = %join_err,
                    "evaluation worker crashed"
                );
                Err(SandboxError::Crashed(join_err.to_string()))
            }
            Err(_elapsed) => {
                METRICS.inc_evaluation_timeouts();
                tracing::warn!(
                    candidate = %request.candidate_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    limit_ms = self.config.timeout_ms,
                    "evaluation worker did not finish in time"
                );
                Ok(EvaluationResult::timed_out_unfinished(
                    &request.corpus,
                    self.config.timeout_ms,
                ))
            }
        }
    }
}
