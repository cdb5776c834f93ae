//! Scripted capability fakes (testing and demos).
//!
//! Provides generators and a challenger that satisfy the trait contracts
//! deterministically, without any network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::challenger::{ChallengeRequest, CorpusChallenger};
use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};
use crate::generator::{CandidateGenerator, GenerationRequest, GenerationResponse};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Returns its scripted patterns one per call, repeating the last one.
#[derive(Debug)]
pub struct ScriptedGenerator {
    name: String,
    patterns: Vec<String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new<I>(name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl CandidateGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> ArenaResult<GenerationResponse> {
        let call = {
            let mut calls = lock(&self.calls);
            calls.push(request.clone());
            calls.len() - 1
        };
        let pattern = self
            .patterns
            .get(call)
            .or_else(|| self.patterns.last())
            .cloned()
            .ok_or_else(|| ArenaError::Generation {
                generator: self.name.clone(),
                reason: "script is empty".to_string(),
            })?;
        Ok(GenerationResponse { pattern })
    }
}

/// Always fails.
#[derive(Debug)]
pub struct FailingGenerator {
    name: String,
    attempts: AtomicUsize,
}

impl FailingGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CandidateGenerator for FailingGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _request: &GenerationRequest) -> ArenaResult<GenerationResponse> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(ArenaError::Generation {
            generator: self.name.clone(),
            reason: "scripted failure".to_string(),
        })
    }
}

/// Sleeps for `delay` before answering with a fixed pattern.
#[derive(Debug)]
pub struct SlowGenerator {
    name: String,
    delay: Duration,
    pattern: String,
}

impl SlowGenerator {
    pub fn new(name: impl Into<String>, delay: Duration, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay,
            pattern: pattern.into(),
        }
    }
}

#[async_trait]
impl CandidateGenerator for SlowGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _request: &GenerationRequest) -> ArenaResult<GenerationResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(GenerationResponse {
            pattern: self.pattern.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Challenger
// ---------------------------------------------------------------------------

/// Returns its scripted corpora one per call, repeating the last one.
///
/// `fail_on(n)` makes the n-th call (0-based) return a `Corpus` error;
/// `with_delay(d)` sleeps before every answer.
#[derive(Debug)]
pub struct ScriptedChallenger {
    corpora: Vec<Corpus>,
    fail_on: Option<usize>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ChallengeRequest>>,
}

impl ScriptedChallenger {
    pub fn new(corpora: Vec<Corpus>) -> Self {
        Self {
            corpora,
            fail_on: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ChallengeRequest> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl CorpusChallenger for ScriptedChallenger {
    async fn challenge(&self, request: &ChallengeRequest) -> ArenaResult<Corpus> {
        let call = {
            let mut calls = lock(&self.calls);
            calls.push(request.clone());
            calls.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(call) {
            return Err(ArenaError::Corpus(format!(
                "scripted challenger failure on call {}",
                call
            )));
        }
        self.corpora
            .get(call)
            .or_else(|| self.corpora.last())
            .cloned()
            .ok_or_else(|| ArenaError::Corpus("challenger script is empty".to_string()))
    }
}
