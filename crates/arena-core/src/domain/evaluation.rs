//! Scored outcome of one pattern against one corpus.

use serde::{Deserialize, Serialize};

use crate::domain::corpus::Corpus;

/// Why an evaluation produced no meaningful score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    #[default]
    None,
    CompileError,
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::CompileError => write!(f, "compileError"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of evaluating a candidate against a frozen corpus.
///
/// Produced once per (candidate, corpus) pair and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// `floor(100 * passed / total)`, 0 when the corpus is empty or on failure.
    pub score: u8,
    /// `invalid` strings the pattern matched, in corpus order.
    pub false_positives: Vec<String>,
    /// `valid` strings the pattern did not match, in corpus order.
    pub false_negatives: Vec<String>,
    pub failure_kind: FailureKind,
    /// True when every case passed and no failure occurred.
    #[serde(default)]
    pub passed: bool,
    /// Human-readable description of every failed case.
    #[serde(default)]
    pub failures: Vec<String>,
}

/// `floor(100 * passed / total)`, defined as 0 for an empty corpus.
pub fn score_for(passed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // passed <= total, so the quotient is at most 100
    ((100 * passed.min(total)) / total) as u8
}

impl EvaluationResult {
    /// Successful evaluation from per-case counts.
    pub fn scored(
        passed: usize,
        total: usize,
        false_positives: Vec<String>,
        false_negatives: Vec<String>,
        failures: Vec<String>,
    ) -> Self {
        Self {
            score: score_for(passed, total),
            passed: total > 0 && passed == total,
            false_positives,
            false_negatives,
            failure_kind: FailureKind::None,
            failures,
        }
    }

    /// The pattern did not compile: no partial credit, no case lists.
    pub fn compile_error(message: impl Into<String>) -> Self {
        Self {
            score: 0,
            false_positives: Vec::new(),
            false_negatives: Vec::new(),
            failure_kind: FailureKind::CompileError,
            passed: false,
            failures: vec![format!("Error compiling regex: {}", message.into())],
        }
    }

    /// The evaluation ran out of time part-way through.
    ///
    /// `false_positives` / `false_negatives` must already include the cases
    /// that were not reached.
    pub fn timed_out(
        false_positives: Vec<String>,
        false_negatives: Vec<String>,
        mut failures: Vec<String>,
        limit_ms: u64,
    ) -> Self {
        failures.push(format!("Evaluation exceeded {}ms wall-clock limit", limit_ms));
        Self {
            score: 0,
            false_positives,
            false_negatives,
            failure_kind: FailureKind::Timeout,
            passed: false,
            failures,
        }
    }

    /// Timed out with no case known to have completed: every `valid` string
    /// is a false negative and every `invalid` string a false positive.
    pub fn timed_out_unfinished(corpus: &Corpus, limit_ms: u64) -> Self {
        Self::timed_out(
            corpus.invalid.clone(),
            corpus.valid.clone(),
            Vec::new(),
            limit_ms,
        )
    }

    /// The worker died without producing a result. Reported with the
    /// timeout kind: every case counts as failed and the score is 0.
    pub fn worker_failed(corpus: &Corpus, reason: impl Into<String>) -> Self {
        Self {
            score: 0,
            false_positives: corpus.invalid.clone(),
            false_negatives: corpus.valid.clone(),
            failure_kind: FailureKind::Timeout,
            passed: false,
            failures: vec![reason.into()],
        }
    }

    /// Whether the evaluation produced a usable score.
    pub fn is_usable(&self) -> bool {
        self.failure_kind == FailureKind::None
    }

    /// Number of mismatched cases.
    pub fn mismatch_count(&self) -> usize {
        self.false_positives.len() + self.false_negatives.len()
    }
}
