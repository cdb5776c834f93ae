//! Arena runs and their monotonic status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::round::{Round, RoundDraft};
use crate::reporter::FinalReport;

/// Unique identifier for an arena run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random RunId.
    pub fn new() -> Self {
        RunId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        RunId(s.to_string())
    }
}

/// Status of a run.
///
/// ```text
/// pending -> generatingCorpus -> generatingCandidates -> evaluating
///   evaluating -> challenging -> generatingCandidates   (next round)
///   evaluating -> finalizing -> completed
/// any non-terminal -> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Pending,
    GeneratingCorpus,
    GeneratingCandidates,
    Evaluating,
    Challenging,
    Finalizing,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether `self -> next` is an allowed edge.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;
        match (self, next) {
            (s, Failed) => !s.is_terminal(),
            (Pending, GeneratingCorpus)
            | (GeneratingCorpus, GeneratingCandidates)
            | (GeneratingCandidates, Evaluating)
            | (Evaluating, Challenging)
            | (Evaluating, Finalizing)
            | (Challenging, GeneratingCandidates)
            | (Finalizing, Completed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::GeneratingCorpus => "generatingCorpus",
            Self::GeneratingCandidates => "generatingCandidates",
            Self::Evaluating => "evaluating",
            Self::Challenging => "challenging",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Classification of what drove a run to `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCause {
    GenerationExhausted,
    Corpus,
    Cancelled,
    NoUsableCandidate,
    Internal,
}

impl FailureCause {
    pub fn from_error(err: &ArenaError) -> Self {
        match err {
            ArenaError::GenerationExhausted { .. } | ArenaError::Generation { .. } => {
                FailureCause::GenerationExhausted
            }
            ArenaError::Corpus(_) => FailureCause::Corpus,
            ArenaError::Cancelled => FailureCause::Cancelled,
            ArenaError::NoUsableCandidate { .. } => FailureCause::NoUsableCandidate,
            _ => FailureCause::Internal,
        }
    }
}

/// Recorded reason for a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub cause: FailureCause,
    pub message: String,
    /// Status the run was in when the failure occurred.
    pub during: RunStatus,
}

/// One end-to-end execution of the refinement loop.
///
/// Owned and mutated exclusively by the orchestrator; the store only ever
/// holds complete snapshots of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaRun {
    pub run_id: RunId,
    pub problem: String,
    pub status: RunStatus,
    pub max_rounds: u32,
    pub current_round: u32,
    rounds: Vec<Round>,
    pub draft: Option<RoundDraft>,
    pub failure: Option<RunFailure>,
    pub report: Option<FinalReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ArenaRun {
    /// Create a new pending run.
    pub fn new(run_id: RunId, problem: impl Into<String>, max_rounds: u32) -> ArenaResult<Self> {
        let problem = problem.into();
        if problem.trim().is_empty() {
            return Err(ArenaError::InvalidInput(
                "problem statement must not be empty".to_string(),
            ));
        }
        if max_rounds == 0 {
            return Err(ArenaError::InvalidInput(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            run_id,
            problem,
            status: RunStatus::Pending,
            max_rounds,
            current_round: 0,
            rounds: Vec::new(),
            draft: None,
            failure: None,
            report: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        })
    }

    /// Completed rounds, oldest first.
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Move to `next`, rejecting any edge not in the status machine.
    pub fn advance(&mut self, next: RunStatus) -> ArenaResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ArenaError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        if next.is_terminal() {
            self.finished_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Append a completed round and clear the draft it came from.
    pub fn push_round(&mut self, round: Round) -> ArenaResult<()> {
        let expected = self.rounds.len() as u32;
        if round.number != expected {
            return Err(ArenaError::InvalidInput(format!(
                "round {} appended out of order (expected {})",
                round.number, expected
            )));
        }
        self.rounds.push(round);
        self.draft = None;
        Ok(())
    }

    /// Drive the run to `failed`, keeping the round history intact.
    pub fn fail(&mut self, err: &ArenaError) -> ArenaResult<()> {
        let during = self.status;
        self.advance(RunStatus::Failed)?;
        self.failure = Some(RunFailure {
            cause: FailureCause::from_error(err),
            message: err.to_string(),
            during,
        });
        Ok(())
    }

    /// Whether this is the last round the run may execute.
    pub fn is_last_round(&self) -> bool {
        self.current_round + 1 >= self.max_rounds
    }
}
