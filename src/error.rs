use std::io;

use thiserror::Error;

/// Failures reported by the window stack.
///
/// None of these are retried internally; a failing call leaves the stack
/// exactly as it found it.
#[derive(Debug, Error)]
pub enum StackError {
    /// A region node or grab entry could not be allocated.
    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),
    /// The requested grab is already held by another window.
    #[error("{what} is already grabbed")]
    Locked { what: &'static str },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An optional collaborator feature (e.g. screenshots) is not available.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StackError>;

impl StackError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}
