use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::cancel::CancelHandle;
use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::run::{ArenaRun, RunId};

/// A run being driven on a background task.
pub struct RunHandle {
    run_id: RunId,
    cancel: CancelHandle,
    join: JoinHandle<ArenaResult<Arc<ArenaRun>>>,
}

impl RunHandle {
    pub(crate) fn new(
        run_id: RunId,
        cancel: CancelHandle,
        join: JoinHandle<ArenaResult<Arc<ArenaRun>>>,
    ) -> Self {
        Self {
            run_id,
            cancel,
            join,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Request cancellation. The run ends in `failed` with a cancellation
    /// cause unless it already reached a terminal status.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to reach a terminal status.
    pub async fn wait(self) -> ArenaResult<Arc<ArenaRun>> {
        self.join
            .await
            .map_err(|e| ArenaError::Internal(format!("run task failed: {}", e)))?
    }
}
