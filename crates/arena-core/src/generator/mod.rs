//! Candidate generators: the opaque capability that proposes patterns.
//!
//! The orchestrator only sees the [`CandidateGenerator`] trait. Every
//! strategy, remote model, or persona is one implementation of it, and all
//! implementations are interchangeable.

pub mod fanout;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::corpus::Corpus;
use crate::domain::error::ArenaResult;

pub use fanout::{fan_out, FanOutConfig, FanOutOutcome};
pub use http::HttpGenerator;

/// Immutable input for one generator call, built fresh every round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub problem_statement: String,
    pub corpus: Corpus,
    /// Results of the previous round, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub pattern: String,
}

/// Produces one candidate pattern per invocation.
///
/// May be slow or unreliable; callers bound each call with a timeout and
/// treat any error as excluding this generator for the current round only.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// Stable display name, used in candidate ids and logs.
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> ArenaResult<GenerationResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let req = GenerationRequest {
            problem_statement: "digits".into(),
            corpus: Corpus::new(["1"], ["a"]).unwrap(),
            prior_feedback: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["problemStatement"], "digits");
        assert_eq!(json["corpus"]["valid"][0], "1");
        assert!(json.get("priorFeedback").is_none());
    }
}
