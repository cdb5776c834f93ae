//! Round orchestrator: drives a run through its status machine.
//!
//! ```text
//! pending -> generatingCorpus            baseline challenge
//!   -> generatingCandidates              fan-out to every generator
//!   -> evaluating                        every candidate vs. the frozen corpus
//!   -> challenging -> generatingCandidates   (next round)
//!   -> finalizing -> completed           best across all rounds
//! any unrecoverable error or cancellation -> failed
//! ```
//!
//! The orchestrator is the only writer of a run. It keeps the working copy
//! locally and writes one complete snapshot to the store per transition.

mod evaluate;
mod handle;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::cancel::{cancel_pair, CancelSignal};
use crate::challenger::{enforce_growth, ChallengeRequest, CorpusChallenger};
use crate::config::ArenaConfig;
use crate::domain::candidate::GeneratorId;
use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::round::{Round, RoundDraft};
use crate::domain::run::{ArenaRun, RunId, RunStatus};
use crate::generator::{fan_out, CandidateGenerator, GenerationRequest};
use crate::metrics::METRICS;
use crate::obs;
use crate::reporter::build_report;
use crate::sandbox::IsolatedExecutor;
use crate::store::ArenaStore;

pub use handle::RunHandle;

pub struct Orchestrator {
    config: ArenaConfig,
    generators: Vec<Arc<dyn CandidateGenerator>>,
    challenger: Arc<dyn CorpusChallenger>,
    executor: Arc<dyn IsolatedExecutor>,
    store: Arc<dyn ArenaStore>,
}

impl Orchestrator {
    pub fn new(
        config: ArenaConfig,
        challenger: Arc<dyn CorpusChallenger>,
        executor: Arc<dyn IsolatedExecutor>,
        store: Arc<dyn ArenaStore>,
    ) -> ArenaResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            generators: Vec::new(),
            challenger,
            executor,
            store,
        })
    }

    /// Register a generator. Registration order is the final tie-breaker
    /// when ranking candidates.
    pub fn with_generator(mut self, generator: Arc<dyn CandidateGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ArenaStore> {
        &self.store
    }

    pub fn generator_ids(&self) -> Vec<GeneratorId> {
        self.generators
            .iter()
            .enumerate()
            .map(|(i, g)| GeneratorId::new(i, g.name()))
            .collect()
    }

    /// Register a new `pending` run with the configured round bound.
    pub async fn create_run(&self, problem: &str) -> ArenaResult<RunId> {
        let run_id = self.store.create(problem, self.config.max_rounds).await?;
        obs::emit_run_created(
            run_id.as_str(),
            self.config.max_rounds,
            self.generators.len(),
        );
        Ok(run_id)
    }

    /// Drive `run_id` on a background task.
    pub fn start(self: &Arc<Self>, run_id: RunId) -> RunHandle {
        self.start_with_exit(run_id, std::future::ready(()))
    }

    /// Like [`Orchestrator::start`], awaiting `on_exit` on the driver task
    /// once the run has stopped, whatever its outcome.
    pub(crate) fn start_with_exit<F>(self: &Arc<Self>, run_id: RunId, on_exit: F) -> RunHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel, signal) = cancel_pair();
        let this = Arc::clone(self);
        let id = run_id.clone();
        let span = obs::run_span(run_id.as_str());
        let join = tokio::spawn(
            async move {
                let outcome = this.run(&id, signal).await;
                on_exit.await;
                outcome
            }
            .instrument(span),
        );
        RunHandle::new(run_id, cancel, join)
    }

    /// Drive a `pending` run to a terminal status and return its final
    /// snapshot.
    ///
    /// Run-level failures are recorded on the run (status `failed`) and the
    /// snapshot is still returned. `Err` means the run could not be driven
    /// at all: unknown id, not `pending`, or a store write failed.
    pub async fn run(&self, run_id: &RunId, cancel: CancelSignal) -> ArenaResult<Arc<ArenaRun>> {
        let started = Instant::now();
        let mut run = (*self.store.get(run_id).await?).clone();
        if run.status != RunStatus::Pending {
            return Err(ArenaError::InvalidInput(format!(
                "run {} is already {}",
                run_id, run.status
            )));
        }

        match self.drive(&mut run, &cancel).await {
            Ok(()) => {
                METRICS.inc_runs_completed();
                let score = run.report.as_ref().map(|r| r.score).unwrap_or_default();
                obs::emit_run_finished(
                    run_id.as_str(),
                    started.elapsed().as_millis() as u64,
                    run.rounds().len(),
                    score,
                );
            }
            Err(err) => {
                obs::emit_run_failed(run_id.as_str(), run.status, &err);
                run.fail(&err)?;
                self.store.put(run).await?;
                METRICS.inc_runs_failed();
            }
        }
        METRICS.flush();

        Ok(self.store.get(run_id).await?)
    }

    async fn drive(&self, run: &mut ArenaRun, cancel: &CancelSignal) -> ArenaResult<()> {
        if self.generators.is_empty() {
            return Err(ArenaError::InvalidConfig(
                "no candidate generators registered".into(),
            ));
        }

        self.transition(run, RunStatus::GeneratingCorpus, cancel)
            .await?;
        let mut corpus = self
            .challenge(
                &ChallengeRequest::baseline(run.problem.clone()),
                &Corpus::empty(),
                cancel,
            )
            .await?;
        if corpus.is_empty() {
            return Err(ArenaError::Corpus(
                "challenger produced an empty baseline corpus".into(),
            ));
        }

        loop {
            let number = run.current_round;
            let digest = corpus.digest()?;
            run.draft = Some(RoundDraft::new(
                number,
                corpus.clone(),
                digest.clone(),
                &self.generator_ids(),
            ));
            self.transition(run, RunStatus::GeneratingCandidates, cancel)
                .await?;

            let request = Arc::new(GenerationRequest {
                problem_statement: run.problem.clone(),
                corpus: corpus.clone(),
                prior_feedback: run.rounds().last().map(prior_feedback),
            });
            let fanned = fan_out(
                &self.generators,
                request,
                number,
                &self.config.fan_out(),
                cancel,
            )
            .await?;
            if let Some(draft) = run.draft.as_mut() {
                draft.record_generation(&fanned.slot_results());
            }
            if fanned.candidates.is_empty() {
                return Err(ArenaError::GenerationExhausted {
                    round: number,
                    attempted: self.generators.len(),
                });
            }

            self.transition(run, RunStatus::Evaluating, cancel).await?;
            let frozen = Arc::new(corpus.clone());
            let outcomes = evaluate::evaluate_all(
                Arc::clone(&self.executor),
                fanned.candidates,
                Arc::clone(&frozen),
                cancel,
            )
            .await?;

            let round = Round::new(number, corpus.clone(), digest, outcomes, fanned.failures);
            obs::emit_round_completed(
                run.run_id.as_str(),
                number,
                round.outcomes.len(),
                round.generation_failures.len(),
                round.best_score(),
                round.corpus.len(),
            );
            let solved = round.best_score() == Some(100);
            run.push_round(round)?;

            if solved || run.is_last_round() {
                self.transition(run, RunStatus::Finalizing, cancel).await?;
                run.report = Some(build_report(run)?);
                self.transition(run, RunStatus::Completed, cancel).await?;
                return Ok(());
            }

            self.transition(run, RunStatus::Challenging, cancel).await?;
            let request = ChallengeRequest {
                problem_statement: run.problem.clone(),
                corpus: corpus.clone(),
                round_results: run
                    .rounds()
                    .last()
                    .map(|r| r.outcomes.clone())
                    .unwrap_or_default(),
            };
            corpus = self.challenge(&request, &corpus, cancel).await?;
            run.current_round += 1;
        }
    }

    /// Advance the local copy and persist it as one snapshot.
    async fn transition(
        &self,
        run: &mut ArenaRun,
        next: RunStatus,
        cancel: &CancelSignal,
    ) -> ArenaResult<()> {
        if cancel.is_cancelled() {
            return Err(ArenaError::Cancelled);
        }
        let from = run.status;
        run.advance(next)?;
        self.store.put(run.clone()).await?;
        obs::emit_run_transition(run.run_id.as_str(), from, next, run.current_round);
        Ok(())
    }

    async fn challenge(
        &self,
        request: &ChallengeRequest,
        previous: &Corpus,
        cancel: &CancelSignal,
    ) -> ArenaResult<Corpus> {
        let limit = self.config.challenger_timeout();
        let next = tokio::select! {
            res = tokio::time::timeout(limit, self.challenger.challenge(request)) => match res {
                Ok(res) => res.map_err(|e| match e {
                    ArenaError::Corpus(_) | ArenaError::Cancelled => e,
                    other => ArenaError::Corpus(other.to_string()),
                })?,
                Err(_) => {
                    return Err(ArenaError::Corpus(format!(
                        "challenger did not answer within {}ms",
                        self.config.challenger_timeout_ms
                    )))
                }
            },
            _ = cancel.cancelled() => return Err(ArenaError::Cancelled),
        };
        enforce_growth(previous, next)
    }
}

/// Previous round's results, as handed to generators.
fn prior_feedback(round: &Round) -> serde_json::Value {
    let results: Vec<serde_json::Value> = round
        .ranked()
        .into_iter()
        .map(|o| {
            serde_json::json!({
                "pattern": o.candidate.pattern(),
                "generator": o.candidate.generator().name,
                "score": o.result.score,
                "falsePositives": o.result.false_positives,
                "falseNegatives": o.result.false_negatives,
                "failureKind": o.result.failure_kind,
            })
        })
        .collect();
    serde_json::json!({
        "round": round.number,
        "bestScore": round.best_score(),
        "results": results,
    })
}
