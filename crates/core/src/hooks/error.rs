//! Per-invocation hook failures

use thiserror::Error;

/// Why a hook invocation failed. Every variant is treated as a deny and is
/// contained in the invocation result; none escape the hook stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("exited with code {code} without a parsable decision")]
    NonZeroExit { code: i32 },

    #[error("malformed output: {0}")]
    MalformedOutput(String),

    #[error("failed to spawn: {0}")]
    Spawn(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl HookError {
    /// Stable tag recorded in telemetry
    pub fn kind(&self) -> &'static str {
        match self {
            HookError::Timeout { .. } => "timeout",
            HookError::NonZeroExit { .. } => "non_zero_exit",
            HookError::MalformedOutput(_) => "malformed_output",
            HookError::Spawn(_) => "spawn",
            HookError::Io(_) => "io",
        }
    }
}
