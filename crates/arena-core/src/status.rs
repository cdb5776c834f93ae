//! Read-side view of a run for the status query boundary.
//!
//! Derived deterministically from one stored snapshot, so repeated reads
//! between transitions serialize to identical bytes.

use serde::{Deserialize, Serialize};

use crate::domain::candidate::GeneratorId;
use crate::domain::corpus::Corpus;
use crate::domain::digest::ContentDigest;
use crate::domain::error::ArenaResult;
use crate::domain::evaluation::{EvaluationResult, FailureKind};
use crate::domain::round::{CandidateStatus, Round, RoundDraft};
use crate::domain::run::{ArenaRun, RunFailure, RunStatus};
use crate::reporter::FinalReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunResponse {
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    pub id: String,
    pub generator: String,
    pub status: CandidateStatus,
    pub pattern: Option<String>,
    pub score: Option<u8>,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
    pub failure_kind: Option<FailureKind>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub number: u32,
    pub test_cases: Corpus,
    pub corpus_digest: ContentDigest,
    /// False while the round is still underway.
    pub completed: bool,
    pub candidates: Vec<CandidateView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusView {
    pub run_id: String,
    pub problem: String,
    pub status: RunStatus,
    pub is_generating: bool,
    pub current_round: u32,
    pub max_rounds: u32,
    /// Completed rounds followed by the round underway, if any.
    pub rounds: Vec<RoundView>,
    pub show_results: bool,
    pub failure: Option<RunFailure>,
    pub report: Option<FinalReport>,
    pub snapshot_digest: ContentDigest,
}

impl RunStatusView {
    pub fn from_run(run: &ArenaRun) -> ArenaResult<Self> {
        let mut rounds: Vec<RoundView> = run.rounds().iter().map(completed_round).collect();
        if let Some(draft) = &run.draft {
            rounds.push(draft_round(draft));
        }
        Ok(Self {
            run_id: run.run_id.to_string(),
            problem: run.problem.clone(),
            status: run.status,
            is_generating: !run.status.is_terminal(),
            current_round: run.current_round,
            max_rounds: run.max_rounds,
            rounds,
            show_results: run.status == RunStatus::Completed,
            failure: run.failure.clone(),
            report: run.report.clone(),
            snapshot_digest: ContentDigest::of(run)?,
        })
    }
}

fn scored(id: &str, generator: &GeneratorId, pattern: &str, r: &EvaluationResult) -> CandidateView {
    CandidateView {
        id: id.to_string(),
        generator: generator.to_string(),
        status: CandidateStatus::Completed,
        pattern: Some(pattern.to_string()),
        score: Some(r.score),
        false_positives: r.false_positives.clone(),
        false_negatives: r.false_negatives.clone(),
        failure_kind: Some(r.failure_kind),
        error: None,
    }
}

fn completed_round(round: &Round) -> RoundView {
    let mut candidates: Vec<(usize, CandidateView)> = round
        .outcomes
        .iter()
        .map(|o| {
            let c = &o.candidate;
            (
                c.generator().index,
                scored(c.id(), c.generator(), c.pattern(), &o.result),
            )
        })
        .collect();
    candidates.extend(round.generation_failures.iter().map(|f| {
        (
            f.generator.index,
            CandidateView {
                id: crate::domain::candidate::candidate_id(round.number, &f.generator),
                generator: f.generator.to_string(),
                status: CandidateStatus::Failed,
                pattern: None,
                score: None,
                false_positives: Vec::new(),
                false_negatives: Vec::new(),
                failure_kind: None,
                error: Some(f.reason.clone()),
            },
        )
    }));
    candidates.sort_by_key(|(index, _)| *index);

    RoundView {
        number: round.number,
        test_cases: round.corpus.clone(),
        corpus_digest: round.corpus_digest.clone(),
        completed: true,
        candidates: candidates.into_iter().map(|(_, v)| v).collect(),
    }
}

fn draft_round(draft: &RoundDraft) -> RoundView {
    RoundView {
        number: draft.number,
        test_cases: draft.corpus.clone(),
        corpus_digest: draft.corpus_digest.clone(),
        completed: false,
        candidates: draft
            .slots
            .iter()
            .map(|slot| CandidateView {
                id: slot.id.clone(),
                generator: slot.generator.to_string(),
                status: slot.status,
                pattern: slot.pattern.clone(),
                score: None,
                false_positives: Vec::new(),
                false_negatives: Vec::new(),
                failure_kind: None,
                error: slot.error.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Candidate, CandidateOutcome, GenerationFailure};
    use crate::domain::run::RunId;

    #[test]
    fn test_view_merges_outcomes_and_failures_by_generator() {
        let mut run = ArenaRun::new(RunId::from("r"), "single a", 2).unwrap();
        let corpus = Corpus::new(["a"], ["b"]).unwrap();
        let digest = corpus.digest().unwrap();
        let g0 = GeneratorId::new(0, "zero");
        let g1 = GeneratorId::new(1, "one");
        let round = Round::new(
            0,
            corpus,
            digest,
            vec![CandidateOutcome {
                candidate: Candidate::new("a", g1, 0),
                result: EvaluationResult::scored(2, 2, vec![], vec![], vec![]),
            }],
            vec![GenerationFailure {
                generator: g0,
                reason: "offline".into(),
            }],
        );
        run.push_round(round).unwrap();

        let view = RunStatusView::from_run(&run).unwrap();
        let candidates = &view.rounds[0].candidates;
        assert_eq!(candidates[0].status, CandidateStatus::Failed);
        assert_eq!(candidates[0].error.as_deref(), Some("offline"));
        assert_eq!(candidates[1].score, Some(100));
        assert!(view.is_generating);
        assert!(!view.show_results);
    }

    #[test]
    fn test_view_includes_draft_round() {
        let mut run = ArenaRun::new(RunId::from("r"), "single a", 2).unwrap();
        let corpus = Corpus::new(["a"], ["b"]).unwrap();
        let digest = corpus.digest().unwrap();
        run.draft = Some(RoundDraft::new(
            0,
            corpus,
            digest,
            &[GeneratorId::new(0, "zero")],
        ));
        let view = RunStatusView::from_run(&run).unwrap();
        assert_eq!(view.rounds.len(), 1);
        assert!(!view.rounds[0].completed);
        assert_eq!(view.rounds[0].candidates[0].status, CandidateStatus::Pending);
    }

    #[test]
    fn test_view_serializes_deterministically() {
        let run = ArenaRun::new(RunId::from("r"), "single a", 2).unwrap();
        let a = serde_json::to_vec(&RunStatusView::from_run(&run).unwrap()).unwrap();
        let b = serde_json::to_vec(&RunStatusView::from_run(&run).unwrap()).unwrap();
        assert_eq!(a, b);
        let json: serde_json::Value = serde_json::from_slice(&a).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["isGenerating"], true);
        assert_eq!(json["showResults"], false);
    }
}
