use thiserror::Error;

use crate::job::JobKind;

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Failure reported by an executor for one attempt.
///
/// Executors are opaque to the dispatcher, so their failures travel as
/// a message rather than a structured cause. Every executor failure is
/// treated as transient and retried until the budget runs out.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecutorError {
    pub message: String,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ExecutorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ExecutorError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Top-level error type returned by the dispatcher.
///
/// Admission failures (`RateLimited`, `SystemBusy`) are surfaced
/// immediately at submit time and are distinct from execution
/// failures, so callers can present "slow down" messaging separately
/// from "something went wrong".
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("rate limit exceeded for {kind}, please wait a moment")]
    RateLimited { kind: JobKind },

    #[error("the system is at capacity, please try again shortly")]
    SystemBusy,

    #[error("job failed after {attempts} attempts: {source}")]
    Failed {
        attempts: u32,
        #[source]
        source: ExecutorError,
    },

    #[error("no executor bound for kind `{0}`")]
    MissingExecutor(JobKind),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("dispatcher shut down before the job finished")]
    Shutdown,
}
