//! Completed rounds (append-only history) and the in-progress round draft.

use serde::{Deserialize, Serialize};

use crate::domain::candidate::{candidate_id, CandidateOutcome, GenerationFailure, GeneratorId};
use crate::domain::corpus::Corpus;
use crate::domain::digest::ContentDigest;
use crate::domain::selection::{best_usable, rank};

/// One finished cycle of generation, evaluation and selection.
///
/// Every outcome was scored against `corpus`, whose digest is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub corpus: Corpus,
    pub corpus_digest: ContentDigest,
    pub outcomes: Vec<CandidateOutcome>,
    pub generation_failures: Vec<GenerationFailure>,
    /// Index into `outcomes` of the selected candidate, `None` if no
    /// candidate produced a usable evaluation.
    pub best: Option<usize>,
}

impl Round {
    pub fn new(
        number: u32,
        corpus: Corpus,
        corpus_digest: ContentDigest,
        outcomes: Vec<CandidateOutcome>,
        generation_failures: Vec<GenerationFailure>,
    ) -> Self {
        let best = best_usable(&outcomes);
        Self {
            number,
            corpus,
            corpus_digest,
            outcomes,
            generation_failures,
            best,
        }
    }

    pub fn best_outcome(&self) -> Option<&CandidateOutcome> {
        self.best.and_then(|i| self.outcomes.get(i))
    }

    pub fn best_score(&self) -> Option<u8> {
        self.best_outcome().map(|o| o.result.score)
    }

    /// Outcomes in rank order.
    pub fn ranked(&self) -> Vec<&CandidateOutcome> {
        rank(&self.outcomes)
            .into_iter()
            .map(|i| &self.outcomes[i])
            .collect()
    }
}

/// Lifecycle of a candidate slot as seen by status readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateStatus {
    Pending,
    Evaluating,
    Completed,
    Failed,
}

/// A generator's slot in the round currently underway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSlot {
    pub id: String,
    pub generator: GeneratorId,
    pub status: CandidateStatus,
    pub pattern: Option<String>,
    pub error: Option<String>,
}

/// The round currently underway: its frozen corpus and slot statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDraft {
    pub number: u32,
    pub corpus: Corpus,
    pub corpus_digest: ContentDigest,
    pub slots: Vec<DraftSlot>,
}

impl RoundDraft {
    /// A fresh draft with one pending slot per generator.
    pub fn new(
        number: u32,
        corpus: Corpus,
        corpus_digest: ContentDigest,
        generators: &[GeneratorId],
    ) -> Self {
        let slots = generators
            .iter()
            .map(|g| DraftSlot {
                id: candidate_id(number, g),
                generator: g.clone(),
                status: CandidateStatus::Pending,
                pattern: None,
                error: None,
            })
            .collect();
        Self {
            number,
            corpus,
            corpus_digest,
            slots,
        }
    }

    /// Record the fan-out result: successful slots move to `Evaluating`,
    /// failed ones to `Failed`.
    pub fn record_generation(
        &mut self,
        outcomes: &[(GeneratorId, Result<String, String>)],
    ) {
        for (generator, outcome) in outcomes {
            if let Some(slot) = self.slots.iter_mut().find(|s| &s.generator == generator) {
                match outcome {
                    Ok(pattern) => {
                        slot.status = CandidateStatus::Evaluating;
                        slot.pattern = Some(pattern.clone());
                    }
                    Err(reason) => {
                        slot.status = CandidateStatus::Failed;
                        slot.error = Some(reason.clone());
                    }
                }
            }
        }
    }
}
