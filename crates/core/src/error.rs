//! Error types for Concierge.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, I/O, remote model calls, agent runs,
//! deadlines, documents and prompts.

use thiserror::Error;

/// Unified error type for Concierge.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote model service errors (network, HTTP status, payload shape)
    #[error("LLM error: {0}")]
    Llm(String),

    /// A remote agent invocation failed during a named workflow stage
    #[error("Agent error in stage '{stage}': {message}")]
    Agent { stage: String, message: String },

    /// A remote call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A remote call was abandoned because the run was cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Word-processor and spreadsheet errors
    #[error("Document error: {0}")]
    Document(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build an agent error for the given stage.
    pub fn agent(stage: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Agent {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Whether re-issuing the same operation could succeed.
    ///
    /// Remote failures and deadlines are transient; configuration problems,
    /// malformed data and user cancellation are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Llm(_) | AppError::Agent { .. } | AppError::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_display() {
        let err = AppError::agent("classify", "missing operating_procedure");
        assert_eq!(
            err.to_string(),
            "Agent error in stage 'classify': missing operating_procedure"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(AppError::Timeout("rewrite".into()).is_recoverable());
        assert!(AppError::Llm("502".into()).is_recoverable());
        assert!(AppError::agent("classify", "bad json").is_recoverable());
        assert!(!AppError::Config("no key".into()).is_recoverable());
        assert!(!AppError::Cancelled("rewrite".into()).is_recoverable());
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
