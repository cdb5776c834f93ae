//! Deterministic candidate ranking.
//!
//! Order: score descending, then shorter pattern, then earlier generator
//! registration, then earlier round. The last key makes the order total
//! across rounds (within a round it never applies).

use std::cmp::Ordering;

use crate::domain::candidate::CandidateOutcome;

/// Total order used everywhere a "best" candidate is chosen.
pub fn compare_outcomes(a: &CandidateOutcome, b: &CandidateOutcome) -> Ordering {
    b.result
        .score
        .cmp(&a.result.score)
        .then_with(|| a.candidate.pattern_len().cmp(&b.candidate.pattern_len()))
        .then_with(|| {
            a.candidate
                .generator()
                .index
                .cmp(&b.candidate.generator().index)
        })
        .then_with(|| a.candidate.round().cmp(&b.candidate.round()))
}

/// Indices of `outcomes` in rank order (best first).
pub fn rank(outcomes: &[CandidateOutcome]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..outcomes.len()).collect();
    idx.sort_by(|&a, &b| compare_outcomes(&outcomes[a], &outcomes[b]));
    idx
}

/// Index of the best usable outcome, skipping compile errors and timeouts.
pub fn best_usable(outcomes: &[CandidateOutcome]) -> Option<usize> {
    rank(outcomes)
        .into_iter()
        .find(|&i| outcomes[i].result.is_usable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Candidate, GeneratorId};
    use crate::domain::evaluation::{EvaluationResult, FailureKind};

    fn outcome(pattern: &str, gen: usize, round: u32, score: u8) -> CandidateOutcome {
        CandidateOutcome {
            candidate: Candidate::new(pattern, GeneratorId::new(gen, format!("g{gen}")), round),
            result: EvaluationResult {
                score,
                false_positives: vec![],
                false_negatives: vec![],
                failure_kind: FailureKind::None,
                passed: score == 100,
                failures: vec![],
            },
        }
    }

    #[test]
    fn test_higher_score_wins() {
        let outcomes = vec![outcome("^a$", 0, 0, 50), outcome("^a+$", 1, 0, 90)];
        assert_eq!(rank(&outcomes), vec![1, 0]);
    }

    #[test]
    fn test_tie_broken_by_shorter_pattern() {
        let outcomes = vec![outcome("^aa*$", 0, 0, 80), outcome("^a+$", 1, 0, 80)];
        assert_eq!(best_usable(&outcomes), Some(1));
    }

    #[test]
    fn test_tie_broken_by_registration_order() {
        let outcomes = vec![outcome("^b$", 1, 0, 80), outcome("^a$", 0, 0, 80)];
        assert_eq!(best_usable(&outcomes), Some(1));
    }

    #[test]
    fn test_tie_across_rounds_prefers_earlier_round() {
        let a = outcome("^a$", 0, 2, 100);
        let b = outcome("^b$", 0, 1, 100);
        assert_eq!(compare_outcomes(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_best_usable_skips_compile_errors() {
        let mut broken = outcome("(", 0, 0, 0);
        broken.result = EvaluationResult::compile_error("unclosed group");
        let outcomes = vec![broken, outcome("^a$", 1, 0, 0)];
        assert_eq!(best_usable(&outcomes), Some(1));

        let mut only_broken = outcome("(", 0, 0, 0);
        only_broken.result = EvaluationResult::compile_error("unclosed group");
        assert_eq!(best_usable(&[only_broken]), None);
    }
}
