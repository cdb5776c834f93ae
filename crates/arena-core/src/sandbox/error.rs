//! Error types for the sandbox module.

/// Errors produced by the isolated executor.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("evaluation timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation worker crashed: {0}")]
    Crashed(String),

    #[error("executor is shut down")]
    Closed,

    #[error("invalid sandbox configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;

