//! Regex Arena Core Library
//!
//! Adversarial, round-based refinement of a candidate pattern against a
//! growing labeled corpus. Re-exports the components needed to assemble and
//! drive an arena programmatically.

pub mod cancel;
pub mod challenger;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod generator;
pub mod harness;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod reporter;
pub mod sandbox;
pub mod service;
pub mod status;
pub mod store;
pub mod telemetry;

pub use domain::{
    score_for, ArenaError, ArenaResult, ArenaRun, Candidate, CandidateOutcome, CandidateStatus,
    ContentDigest, Corpus, EvaluationResult, FailureCause, FailureKind, GenerationFailure,
    GeneratorId, Round, RunFailure, RunId, RunStatus,
};

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use challenger::{enforce_growth, ChallengeRequest, CorpusChallenger, HttpChallenger};
pub use config::ArenaConfig;
pub use generator::{
    fan_out, CandidateGenerator, FanOutConfig, GenerationRequest, GenerationResponse,
    HttpGenerator,
};
pub use harness::{evaluate, evaluate_with, EvalBudget, HarnessLimits};
pub use orchestrator::{Orchestrator, RunHandle};
pub use reporter::{build_report, render_report_markdown, write_report_json, FinalReport};
pub use sandbox::{
    ExecutionRequest, IsolatedExecutor, LocalSandbox, SandboxConfig, SandboxError, SandboxResult,
};
pub use service::ArenaService;
pub use status::{CandidateView, CreateRunResponse, RoundView, RunStatusView};
pub use store::{ArenaStore, MemoryArenaStore, StoreError, StoreResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
