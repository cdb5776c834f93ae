//! Final report assembly and report artifacts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::candidate::CandidateOutcome;
use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::run::ArenaRun;
use crate::domain::selection::compare_outcomes;

/// Mismatches listed by name in the feedback string before truncating.
const FEEDBACK_SAMPLE: usize = 5;

/// Externally visible outcome of a completed run.
///
/// `score` and the mismatch lists are the winning candidate's recorded
/// evaluation, taken against the corpus of the round that produced it.
/// `final_test_suite` is the corpus of the last round played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub final_regex: String,
    pub score: u8,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
    pub feedback: String,
    pub final_test_suite: Corpus,
    pub candidate_id: String,
    pub generator: String,
    pub round: u32,
    pub rounds_played: usize,
}

/// Pick the best candidate across every round and build the report.
///
/// Only each round's selected (usable) candidate competes. Errors with
/// `NoUsableCandidate` when no round selected one.
pub fn build_report(run: &ArenaRun) -> ArenaResult<FinalReport> {
    let rounds = run.rounds();
    let best: &CandidateOutcome = rounds
        .iter()
        .filter_map(|r| r.best_outcome())
        .min_by(|a, b| compare_outcomes(a, b))
        .ok_or(ArenaError::NoUsableCandidate {
            rounds: rounds.len(),
        })?;

    let final_test_suite = rounds
        .last()
        .map(|r| r.corpus.clone())
        .unwrap_or_default();

    Ok(FinalReport {
        final_regex: best.candidate.pattern().to_string(),
        score: best.result.score,
        false_positives: best.result.false_positives.clone(),
        false_negatives: best.result.false_negatives.clone(),
        feedback: feedback_for(best),
        final_test_suite,
        candidate_id: best.candidate.id().to_string(),
        generator: best.candidate.generator().to_string(),
        round: best.candidate.round(),
        rounds_played: rounds.len(),
    })
}

fn feedback_for(best: &CandidateOutcome) -> String {
    let result = &best.result;
    let pattern = best.candidate.pattern();
    let round = best.candidate.round();

    if result.passed {
        return format!(
            "Pattern `{}` from round {} passes every test case.",
            pattern, round
        );
    }

    let mut out = format!(
        "Pattern `{}` from round {} scored {}/100 with {} false positive(s) and {} false negative(s).",
        pattern,
        round,
        result.score,
        result.false_positives.len(),
        result.false_negatives.len()
    );
    if !result.false_positives.is_empty() {
        out.push_str(&format!(
            " Wrongly accepted: {}.",
            sample(&result.false_positives)
        ));
    }
    if !result.false_negatives.is_empty() {
        out.push_str(&format!(
            " Wrongly rejected: {}.",
            sample(&result.false_negatives)
        ));
    }
    out
}

fn sample(items: &[String]) -> String {
    let mut shown: Vec<String> = items
        .iter()
        .take(FEEDBACK_SAMPLE)
        .map(|s| format!("{:?}", s))
        .collect();
    if items.len() > FEEDBACK_SAMPLE {
        shown.push(format!("and {} more", items.len() - FEEDBACK_SAMPLE));
    }
    shown.join(", ")
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &FinalReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize final report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary of the report.
pub fn render_report_markdown(report: &FinalReport) -> String {
    let mut out = String::new();
    out.push_str("# Arena Report\n\n");
    out.push_str(&format!(
        "- final regex: `{}`\n- score: {}/100\n- selected: {} (round {}, {})\n- rounds played: {}\n\n",
        report.final_regex,
        report.score,
        report.candidate_id,
        report.round,
        report.generator,
        report.rounds_played
    ));
    out.push_str(&format!("{}\n\n", report.feedback));

    if !report.false_positives.is_empty() {
        out.push_str("## False Positives\n");
        for s in &report.false_positives {
            out.push_str(&format!("- `{}`\n", s));
        }
        out.push('\n');
    }
    if !report.false_negatives.is_empty() {
        out.push_str("## False Negatives\n");
        for s in &report.false_negatives {
            out.push_str(&format!("- `{}`\n", s));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "## Final Test Suite\n- valid: {}\n- invalid: {}\n",
        report.final_test_suite.valid.len(),
        report.final_test_suite.invalid.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Candidate, GeneratorId};
    use crate::domain::evaluation::EvaluationResult;
    use crate::domain::round::Round;
    use crate::domain::run::RunId;

    fn round(number: u32, corpus: Corpus, outcomes: Vec<CandidateOutcome>) -> Round {
        let digest = corpus.digest().unwrap();
        Round::new(number, corpus, digest, outcomes, vec![])
    }

    fn outcome(pattern: &str, gen: usize, round: u32, result: EvaluationResult) -> CandidateOutcome {
        CandidateOutcome {
            candidate: Candidate::new(pattern, GeneratorId::new(gen, format!("g{gen}")), round),
            result,
        }
    }

    #[test]
    fn test_report_picks_best_across_rounds() {
        let mut run = ArenaRun::new(RunId::from("r"), "single a", 2).unwrap();
        let c0 = Corpus::new(["a"], ["b"]).unwrap();
        let c1 = Corpus::new(["a"], ["b", "aa"]).unwrap();
        run.push_round(round(
            0,
            c0,
            vec![outcome(
                "a+",
                0,
                0,
                EvaluationResult::scored(2, 2, vec![], vec![], vec![]),
            )],
        ))
        .unwrap();
        run.push_round(round(
            1,
            c1.clone(),
            vec![outcome(
                "a+",
                0,
                1,
                EvaluationResult::scored(2, 3, vec!["aa".into()], vec![], vec![]),
            )],
        ))
        .unwrap();

        let report = build_report(&run).unwrap();
        assert_eq!(report.score, 100);
        assert_eq!(report.round, 0);
        assert_eq!(report.final_test_suite, c1);
        assert_eq!(report.rounds_played, 2);
    }

    #[test]
    fn test_report_requires_a_usable_candidate() {
        let mut run = ArenaRun::new(RunId::from("r"), "single a", 1).unwrap();
        run.push_round(round(
            0,
            Corpus::new(["a"], ["b"]).unwrap(),
            vec![outcome("(", 0, 0, EvaluationResult::compile_error("unclosed"))],
        ))
        .unwrap();
        assert!(matches!(
            build_report(&run),
            Err(ArenaError::NoUsableCandidate { rounds: 1 })
        ));
    }

    #[test]
    fn test_feedback_lists_mismatches() {
        let o = outcome(
            "a.",
            0,
            0,
            EvaluationResult::scored(1, 3, vec!["ab".into()], vec!["a".into()], vec![]),
        );
        let text = feedback_for(&o);
        assert!(text.contains("33/100"));
        assert!(text.contains("\"ab\""));
        assert!(text.contains("Wrongly rejected"));
    }

    #[test]
    fn test_write_and_render() {
        let report = FinalReport {
            final_regex: "^a$".into(),
            score: 100,
            false_positives: vec![],
            false_negatives: vec![],
            feedback: "ok".into(),
            final_test_suite: Corpus::new(["a"], ["b"]).unwrap(),
            candidate_id: "r0-g0-g0".into(),
            generator: "g0#0".into(),
            round: 0,
            rounds_played: 1,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report_json(&path, &report).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["finalRegex"], "^a$");
        assert_eq!(json["finalTestSuite"]["valid"][0], "a");

        let md = render_report_markdown(&report);
        assert!(md.contains("# Arena Report"));
        assert!(md.contains("`^a$`"));
    }
}
