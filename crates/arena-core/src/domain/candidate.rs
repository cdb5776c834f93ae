//! Candidate patterns and their per-round outcomes.

use serde::{Deserialize, Serialize};

use crate::domain::evaluation::EvaluationResult;

/// Identity of a registered generator.
///
/// `index` is the registration order and is the last tie-breaker when ranking
/// candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorId {
    pub index: usize,
    pub name: String,
}

impl GeneratorId {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.index)
    }
}

/// One pattern proposal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    id: String,
    pattern: String,
    generator: GeneratorId,
    round: u32,
}

impl Candidate {
    pub fn new(pattern: impl Into<String>, generator: GeneratorId, round: u32) -> Self {
        Self {
            id: candidate_id(round, &generator),
            pattern: pattern.into(),
            generator,
            round,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn generator(&self) -> &GeneratorId {
        &self.generator
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Pattern length in characters (used for tie-breaking).
    pub fn pattern_len(&self) -> usize {
        self.pattern.chars().count()
    }
}

/// Stable id for the candidate slot of `generator` in `round`.
pub fn candidate_id(round: u32, generator: &GeneratorId) -> String {
    format!("r{}-g{}-{}", round, generator.index, generator.name)
}

/// A candidate together with its evaluation against the round's corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOutcome {
    pub candidate: Candidate,
    pub result: EvaluationResult,
}

/// A generator that produced nothing usable this round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub generator: GeneratorId,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_id_encodes_round_and_generator() {
        let c = Candidate::new("^a$", GeneratorId::new(2, "strict"), 3);
        assert_eq!(c.id(), "r3-g2-strict");
        assert_eq!(c.round(), 3);
        assert_eq!(c.generator().index, 2);
    }

    #[test]
    fn test_pattern_len_counts_chars() {
        let c = Candidate::new("é+", GeneratorId::new(0, "g"), 0);
        assert_eq!(c.pattern_len(), 2);
    }
}
