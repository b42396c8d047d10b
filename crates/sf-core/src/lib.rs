//! Shared primitives used across static-fixes crates.

use thiserror::Error;

/// Result alias used across the workspace.
pub type FixResult<T> = Result<T, FixError>;

/// Workspace error: a dotted machine-readable code plus a human message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct FixError {
    pub code: &'static str,
    pub message: String,
}

impl FixError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
