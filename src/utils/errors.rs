// src/utils/errors.rs
//! Error types for the executor
//!
//! All fallible operations in the crate return [`Result<T>`], an alias over
//! [`ExecutorError`]. Validation errors are raised synchronously at submit
//! time; everything after acceptance is reported through the session state
//! machine instead of bubbling out to the caller.

use thiserror::Error;

/// Executor error type
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Language is not in the interpreter allow-list
    #[error("unsupported language: '{0}'")]
    UnsupportedLanguage(String),

    /// Source exceeds the configured byte limit
    #[error("source is {size} bytes, limit is {limit}")]
    CodeTooLarge { size: usize, limit: usize },

    /// Session id is unknown or has been evicted
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Interpreter could not be resolved or spawned
    #[error("failed to launch process: {0}")]
    LaunchFailed(String),

    /// Workspace directory could not be created or written
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal runtime failure
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Convenience result type
pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExecutorError::UnsupportedLanguage("ruby".into());
        assert_eq!(err.to_string(), "unsupported language: 'ruby'");

        let err = ExecutorError::CodeTooLarge { size: 100, limit: 10 };
        assert_eq!(err.to_string(), "source is 100 bytes, limit is 10");
    }
}
