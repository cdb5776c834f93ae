//! Domain-level error taxonomy for the arena.

/// Arena domain errors.
///
/// `Compile` and `Timeout` are local to one candidate and are normally folded
/// into an [`EvaluationResult`](crate::domain::EvaluationResult) rather than
/// propagated. `Generation` excludes a single generator for one round.
/// `Corpus`, `Cancelled` and `GenerationExhausted` are fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("pattern failed to compile: {0}")]
    Compile(String),

    #[error("generator '{generator}' failed: {reason}")]
    Generation { generator: String, reason: String },

    #[error("all {attempted} generator(s) failed in round {round}")]
    GenerationExhausted { round: u32, attempted: usize },

    #[error("corpus error: {0}")]
    Corpus(String),

    #[error("arena run not found: {0}")]
    NotFound(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("no candidate produced a usable pattern across {rounds} round(s)")]
    NoUsableCandidate { rounds: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArenaError {
    /// Whether this error aborts the whole run rather than a single candidate.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ArenaError::Compile(_) | ArenaError::Generation { .. }
        )
    }
}

/// Result type for arena domain operations.
pub type ArenaResult<T> = std::result::Result<T, ArenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_error_display() {
        let err = ArenaError::Generation {
            generator: "gen-a".to_string(),
            reason: "upstream 503".to_string(),
        };
        assert!(err.to_string().contains("gen-a"));
        assert!(err.to_string().contains("upstream 503"));

        let err = ArenaError::NotFound("run-123".to_string());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_candidate_local_errors_are_not_fatal() {
        assert!(!ArenaError::Compile("unbalanced".into()).is_fatal());
        assert!(!ArenaError::Generation {
            generator: "g".into(),
            reason: "r".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_round_level_errors_are_fatal() {
        assert!(ArenaError::Corpus("shrunk".into()).is_fatal());
        assert!(ArenaError::Cancelled.is_fatal());
        assert!(ArenaError::GenerationExhausted {
            round: 0,
            attempted: 3
        }
        .is_fatal());
    }
}
