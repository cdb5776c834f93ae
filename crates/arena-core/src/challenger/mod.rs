//! Corpus challengers: grow the labeled corpus between rounds.
//!
//! The first call of a run receives an empty corpus and no results and
//! produces the baseline. Later calls see every candidate outcome of the
//! round just finished and are expected to add cases targeting its
//! mismatches. Whatever comes back passes through [`enforce_growth`].

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::candidate::CandidateOutcome;
use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};

pub use http::HttpChallenger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub problem_statement: String,
    pub corpus: Corpus,
    /// Empty for the baseline call.
    pub round_results: Vec<CandidateOutcome>,
}

impl ChallengeRequest {
    /// The round-0 request: problem statement only.
    pub fn baseline(problem_statement: impl Into<String>) -> Self {
        Self {
            problem_statement: problem_statement.into(),
            corpus: Corpus::empty(),
            round_results: Vec::new(),
        }
    }
}

#[async_trait]
pub trait CorpusChallenger: Send + Sync {
    /// Return the next corpus. Errors are fatal to the run.
    async fn challenge(&self, request: &ChallengeRequest) -> ArenaResult<Corpus>;
}

/// Validate a challenger's output against the corpus it replaces.
///
/// Duplicates are dropped, overlap between `valid` and `invalid` is a
/// `Corpus` error, and so is a total size below `previous`. Individual
/// prior cases may be absent (subsumed) as long as the total does not
/// shrink.
pub fn enforce_growth(previous: &Corpus, next: Corpus) -> ArenaResult<Corpus> {
    let next = next.normalize()?;
    if next.len() < previous.len() {
        return Err(ArenaError::Corpus(format!(
            "challenger shrank the corpus from {} to {} case(s)",
            previous.len(),
            next.len()
        )));
    }

    let dropped = previous.dropped_from(&next);
    if !dropped.is_empty() {
        warn!(
            dropped = dropped.len(),
            previous = previous.len(),
            next = next.len(),
            "challenger replaced prior cases"
        );
    }
    Ok(next)
}
