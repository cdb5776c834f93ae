//! Domain models for the arena.
//!
//! Canonical definitions for the core entities:
//! - `Corpus`: labeled valid/invalid test strings
//! - `Candidate`: one pattern proposal from one generator in one round
//! - `EvaluationResult`: scored outcome of a candidate against a corpus
//! - `Round` / `RoundDraft`: finished and in-progress rounds
//! - `ArenaRun`: one end-to-end refinement run and its status machine

pub mod candidate;
pub mod corpus;
pub mod digest;
pub mod error;
pub mod evaluation;
pub mod round;
pub mod run;
pub mod selection;

// Re-export main types and errors
pub use candidate::{Candidate, CandidateOutcome, GenerationFailure, GeneratorId};
pub use corpus::Corpus;
pub use digest::ContentDigest;
pub use error::{ArenaError, ArenaResult};
pub use evaluation::{score_for, EvaluationResult, FailureKind};
pub use round::{CandidateStatus, DraftSlot, Round, RoundDraft};
pub use run::{ArenaRun, FailureCause, RunFailure, RunId, RunStatus};
