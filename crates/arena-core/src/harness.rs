//! Evaluation harness: score one pattern against one corpus.
//!
//! Pure and deterministic for fixed inputs. Matching is full-string: the
//! pattern is anchored as `^(?:pattern)$` after it has been compiled on its
//! own, so a candidate cannot escape the anchoring group.
//!
//! The harness is meant to run inside an isolated executor (see
//! [`crate::sandbox`]); it cooperates with that executor through an
//! [`EvalBudget`] checked between cases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};
use crate::domain::evaluation::EvaluationResult;

/// Resource limits applied when compiling untrusted patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessLimits {
    /// Patterns longer than this (in bytes) are rejected as compile errors.
    pub max_pattern_len: usize,
    /// Upper bound on the compiled program size.
    pub size_limit_bytes: usize,
}

impl Default for HarnessLimits {
    fn default() -> Self {
        Self {
            max_pattern_len: 4096,
            size_limit_bytes: 1 << 20,
        }
    }
}

/// Wall-clock deadline plus an external abort flag.
#[derive(Debug, Clone, Default)]
pub struct EvalBudget {
    deadline: Option<Instant>,
    abort: Option<Arc<AtomicBool>>,
    limit_ms: u64,
}

impl EvalBudget {
    /// No deadline, never aborted.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Deadline `limit` from now, also tripped when `abort` is set.
    pub fn new(limit: Duration, abort: Arc<AtomicBool>) -> Self {
        Self {
            deadline: Some(Instant::now() + limit),
            abort: Some(abort),
            limit_ms: limit.as_millis() as u64,
        }
    }

    pub fn limit_ms(&self) -> u64 {
        self.limit_ms
    }

    /// True once the deadline has passed or an abort was requested.
    pub fn exhausted(&self) -> bool {
        if let Some(abort) = &self.abort {
            if abort.load(Ordering::Relaxed) {
                return true;
            }
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }
}

/// Compile `pattern` for full-string matching.
pub fn compile_full_match(pattern: &str, limits: &HarnessLimits) -> ArenaResult<Regex> {
    if pattern.len() > limits.max_pattern_len {
        return Err(ArenaError::Compile(format!(
            "pattern is {} bytes, limit is {}",
            pattern.len(),
            limits.max_pattern_len
        )));
    }

    // Must stand on its own before being wrapped, otherwise `a)|(b` would
    // compile once anchored and silently change meaning.
    RegexBuilder::new(pattern)
        .size_limit(limits.size_limit_bytes)
        .build()
        .map_err(|e| ArenaError::Compile(e.to_string()))?;

    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .size_limit(limits.size_limit_bytes)
        .build()
        .map_err(|e| ArenaError::Compile(e.to_string()))
}

/// Evaluate with default limits and no deadline.
pub fn evaluate(pattern: &str, corpus: &Corpus) -> EvaluationResult {
    evaluate_with(
        pattern,
        corpus,
        &HarnessLimits::default(),
        &EvalBudget::unbounded(),
    )
}

/// Evaluate `pattern` against `corpus` under `limits` and `budget`.
///
/// - compile failure: score 0, empty mismatch lists, `compileError`
/// - budget exhausted: score 0, `timeout`, unreached cases counted as failed
/// - otherwise: `floor(100 * passed / total)` (0 for an empty corpus)
pub fn evaluate_with(
    pattern: &str,
    corpus: &Corpus,
    limits: &HarnessLimits,
    budget: &EvalBudget,
) -> EvaluationResult {
    let regex = match compile_full_match(pattern, limits) {
        Ok(regex) => regex,
        Err(ArenaError::Compile(message)) => return EvaluationResult::compile_error(message),
        Err(other) => return EvaluationResult::compile_error(other.to_string()),
    };

    let total = corpus.len();
    let mut passed = 0usize;
    let mut false_positives = Vec::new();
    let mut false_negatives = Vec::new();
    let mut failures = Vec::new();

    for (i, input) in corpus.valid.iter().enumerate() {
        if budget.exhausted() {
            false_negatives.extend(corpus.valid[i..].iter().cloned());
            false_positives.extend(corpus.invalid.iter().cloned());
            failures.push(unreached(total - i));
            return EvaluationResult::timed_out(
                false_positives,
                false_negatives,
                failures,
                budget.limit_ms(),
            );
        }
        if regex.is_match(input) {
            passed += 1;
        } else {
            failures.push(format!("Failed to match valid input: {}", input));
            false_negatives.push(input.clone());
        }
    }

    for (i, input) in corpus.invalid.iter().enumerate() {
        if budget.exhausted() {
            false_positives.extend(corpus.invalid[i..].iter().cloned());
            failures.push(unreached(corpus.invalid.len() - i));
            return EvaluationResult::timed_out(
                false_positives,
                false_negatives,
                failures,
                budget.limit_ms(),
            );
        }
        if regex.is_match(input) {
            failures.push(format!("Incorrectly matched invalid input: {}", input));
            false_positives.push(input.clone());
        } else {
            passed += 1;
        }
    }

    EvaluationResult::scored(passed, total, false_positives, false_negatives, failures)
}

fn unreached(count: usize) -> String {
    format!("{} case(s) not evaluated before the deadline", count)
}
