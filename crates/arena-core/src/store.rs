//! Arena state store: keyed snapshots of every run.
//!
//! The orchestrator writes one complete snapshot per transition; readers get
//! a shared, immutable `Arc<ArenaRun>` and so never see a half-written
//! round. Runs are independent entries with no shared state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::error::ArenaError;
use crate::domain::run::{ArenaRun, RunId};

/// Errors produced by the state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("run {run_id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        run_id: String,
        from: String,
        to: String,
    },

    #[error("run {run_id}: round history is append-only ({detail})")]
    AppendOnlyViolation { run_id: String, detail: String },

    #[error("invalid run: {0}")]
    InvalidRun(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for ArenaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RunNotFound(id) => ArenaError::NotFound(id),
            StoreError::InvalidRun(msg) => ArenaError::InvalidInput(msg),
            other => ArenaError::Store(other.to_string()),
        }
    }
}

/// Keyed snapshot store for arena runs.
#[async_trait]
pub trait ArenaStore: Send + Sync {
    /// Register a new `pending` run and return its id.
    async fn create(&self, problem: &str, max_rounds: u32) -> StoreResult<RunId>;

    /// Latest complete snapshot of a run.
    async fn get(&self, run_id: &RunId) -> StoreResult<Arc<ArenaRun>>;

    /// Replace a run's snapshot.
    ///
    /// Rejects unknown runs, writes after a terminal status, status edges
    /// outside the run state machine, and any change to already-recorded
    /// rounds.
    async fn put(&self, run: ArenaRun) -> StoreResult<()>;

    /// Ids of every known run, oldest first.
    async fn list(&self) -> StoreResult<Vec<RunId>>;
}

/// In-memory store backed by a `HashMap<run_id, Arc<ArenaRun>>`.
#[derive(Debug, Default)]
pub struct MemoryArenaStore {
    runs: RwLock<HashMap<String, Arc<ArenaRun>>>,
}

impl MemoryArenaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_write(prev: &ArenaRun, next: &ArenaRun) -> StoreResult<()> {
    let run_id = next.run_id.to_string();

    let status_changed = prev.status != next.status || prev.status.is_terminal();
    if status_changed && !prev.status.can_transition_to(next.status) {
        return Err(StoreError::InvalidTransition {
            run_id,
            from: prev.status.to_string(),
            to: next.status.to_string(),
        });
    }

    let (old, new) = (prev.rounds(), next.rounds());
    if new.len() < old.len() {
        return Err(StoreError::AppendOnlyViolation {
            run_id,
            detail: format!("{} round(s) recorded, snapshot has {}", old.len(), new.len()),
        });
    }
    if let Some(i) = old.iter().zip(new).position(|(a, b)| a != b) {
        return Err(StoreError::AppendOnlyViolation {
            run_id,
            detail: format!("round {} was modified", i),
        });
    }
    Ok(())
}

#[async_trait]
impl ArenaStore for MemoryArenaStore {
    async fn create(&self, problem: &str, max_rounds: u32) -> StoreResult<RunId> {
        let run = ArenaRun::new(RunId::new(), problem, max_rounds)
            .map_err(|e| StoreError::InvalidRun(e.to_string()))?;
        let run_id = run.run_id.clone();
        self.runs
            .write()
            .await
            .insert(run_id.to_string(), Arc::new(run));
        Ok(run_id)
    }

    async fn get(&self, run_id: &RunId) -> StoreResult<Arc<ArenaRun>> {
        self.runs
            .read()
            .await
            .get(run_id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))
    }

    async fn put(&self, run: ArenaRun) -> StoreResult<()> {
        let mut runs = self.runs.write().await;
        let prev = runs
            .get(run.run_id.as_str())
            .ok_or_else(|| StoreError::RunNotFound(run.run_id.to_string()))?;
        check_write(prev, &run)?;
        runs.insert(run.run_id.to_string(), Arc::new(run));
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<RunId>> {
        let runs = self.runs.read().await;
        let mut all: Vec<&Arc<ArenaRun>> = runs.values().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.run_id.as_str().cmp(b.run_id.as_str()))
        });
        Ok(all.into_iter().map(|r| r.run_id.clone()).collect())
    }
}
