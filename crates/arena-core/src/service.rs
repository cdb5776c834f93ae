//! Status query boundary: create, inspect, cancel and await runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::run::RunId;
use crate::orchestrator::{Orchestrator, RunHandle};
use crate::status::{CreateRunResponse, RunStatusView};

type ActiveRuns = Arc<Mutex<HashMap<String, RunHandle>>>;

/// Front door for callers that only speak run ids.
///
/// `create_run` registers a run and starts driving it immediately; every
/// read goes through the store and therefore sees a complete snapshot.
/// A run's handle is dropped from the active set as soon as its driver
/// stops, so finished runs are only reachable through the store.
pub struct ArenaService {
    orchestrator: Arc<Orchestrator>,
    active: ActiveRuns,
}

impl ArenaService {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn create_run(&self, problem: &str) -> ArenaResult<CreateRunResponse> {
        let run_id = self.orchestrator.create_run(problem).await?;
        let key = run_id.to_string();

        // Held across start and insert: the driver's removal waits on this
        // lock, so it cannot run before the handle is registered.
        let mut active = self.active.lock().await;
        let registry = Arc::clone(&self.active);
        let exit_key = key.clone();
        let handle = self
            .orchestrator
            .start_with_exit(run_id.clone(), async move {
                registry.lock().await.remove(&exit_key);
            });
        active.insert(key.clone(), handle);

        Ok(CreateRunResponse { run_id: key })
    }

    /// Current snapshot view. `NotFound` for unknown ids.
    pub async fn get_run(&self, run_id: &str) -> ArenaResult<RunStatusView> {
        let run = self.orchestrator.store().get(&RunId::from(run_id)).await?;
        RunStatusView::from_run(&run)
    }

    /// Request cancellation. A no-op for runs that already finished.
    pub async fn cancel_run(&self, run_id: &str) -> ArenaResult<()> {
        if let Some(handle) = self.active.lock().await.get(run_id) {
            tracing::info!(run_id = %run_id, "cancellation requested");
            handle.cancel();
            return Ok(());
        }
        self.orchestrator.store().get(&RunId::from(run_id)).await?;
        Ok(())
    }

    /// Wait for a run to finish and return its final view.
    pub async fn wait(&self, run_id: &str) -> ArenaResult<RunStatusView> {
        let handle = self.active.lock().await.remove(run_id);
        match handle {
            Some(handle) => {
                let run = handle.wait().await?;
                RunStatusView::from_run(&run)
            }
            None => {
                let view = self.get_run(run_id).await?;
                if view.is_generating {
                    return Err(ArenaError::InvalidInput(format!(
                        "run {} is not driven by this service",
                        run_id
                    )));
                }
                Ok(view)
            }
        }
    }

    /// Number of runs whose driver is still registered.
    pub async fn active_runs(&self) -> usize {
        self.active.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::ArenaConfig;
    use crate::domain::corpus::Corpus;
    use crate::domain::run::RunStatus;
    use crate::fakes::{ScriptedChallenger, ScriptedGenerator};
    use crate::sandbox::{LocalSandbox, SandboxConfig};
    use crate::store::MemoryArenaStore;

    fn service() -> ArenaService {
        let challenger = Arc::new(ScriptedChallenger::new(vec![
            Corpus::new(["a"], ["b"]).unwrap(),
        ]));
        let sandbox = Arc::new(LocalSandbox::new(SandboxConfig::default()).unwrap());
        let orch = Orchestrator::new(
            ArenaConfig::default(),
            challenger,
            sandbox,
            Arc::new(MemoryArenaStore::new()),
        )
        .unwrap()
        .with_generator(Arc::new(ScriptedGenerator::new("exact", ["a"])));
        ArenaService::new(Arc::new(orch))
    }

    #[tokio::test]
    async fn test_finished_runs_leave_the_active_set() {
        let svc = service();
        let mut ids = Vec::new();
        for i in 0..20 {
            ids.push(svc.create_run(&format!("problem {i}")).await.unwrap().run_id);
        }

        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let mut terminal = 0;
                for id in &ids {
                    if !svc.get_run(id).await.unwrap().is_generating {
                        terminal += 1;
                    }
                }
                if terminal == ids.len() && svc.active_runs().await == 0 {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("every run should finish and deregister");

        for id in &ids {
            assert_eq!(svc.get_run(id).await.unwrap().status, RunStatus::Completed);
        }
    }

    #[tokio::test]
    async fn test_wait_after_deregistration_returns_final_view() {
        let svc = service();
        let created = svc.create_run("single letter a").await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while svc.active_runs().await != 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let view = svc.wait(&created.run_id).await.unwrap();
        assert_eq!(view.status, RunStatus::Completed);
        svc.cancel_run(&created.run_id).await.unwrap();
    }
}
