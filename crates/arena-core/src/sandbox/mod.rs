//! Sandbox: isolated, time-bounded execution of untrusted patterns.
//!
//! Candidate patterns come from outside the process. Evaluation runs on a
//! blocking worker under a wall-clock limit, with a bounded number of
//! concurrent workers, and can be cancelled by the owning run.
//!
//! # Modules
//!
//! - [`execution`]: `SandboxConfig`, `IsolatedExecutor`, `LocalSandbox`
//! - [`error`]: `SandboxError` / `SandboxResult`

pub mod error;
pub mod execution;

pub use error::{SandboxError, SandboxResult};
pub use execution::{EvaluatorFn, ExecutionRequest, IsolatedExecutor, LocalSandbox, SandboxConfig};
