//! Error types for the tandem CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Only errors that prevent a run from starting (or genuinely
//! unexpected internal failures) surface here; failures inside the
//! execution loop are reported as run outcomes, not errors.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for tandem operations.
#[derive(Error, Debug)]
pub enum TandemError {
    /// The requested task file does not exist.
    #[error("task '{name}' not found at {path}")]
    TaskNotFound { name: String, path: String },

    /// Bad arguments, invalid configuration, or an unexpected IO failure.
    #[error("{0}")]
    UserError(String),
}

impl TandemError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            TandemError::TaskNotFound { .. } => exit_codes::USER_ERROR,
            TandemError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for tandem operations.
pub type Result<T> = std::result::Result<T, TandemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_not_found_has_user_error_exit_code() {
        let err = TandemError::TaskNotFound {
            name: "deploy".to_string(),
            path: "tasks/deploy.md".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn user_error_has_user_error_exit_code() {
        let err = TandemError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = TandemError::TaskNotFound {
            name: "deploy".to_string(),
            path: "tasks/deploy.md".to_string(),
        };
        assert_eq!(err.to_string(), "task 'deploy' not found at tasks/deploy.md");

        let err = TandemError::UserError("config invalid".to_string());
        assert_eq!(err.to_string(), "config invalid");
    }
}
