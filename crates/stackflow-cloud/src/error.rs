//! Stack deployment error types

use thiserror::Error;

/// Errors surfaced by the stack deployer
///
/// Provider-origin variants carry the provider's code and message verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("Template validation failed ({code}): {message}")]
    Validation { code: String, message: String },

    #[error("Authentication failed ({code}): {message}")]
    Auth { code: String, message: String },

    #[error("Deployment of stack {stack} failed ({code}): {message}")]
    DeploymentFailure {
        stack: String,
        code: String,
        message: String,
    },

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Invalid stack name: {0}")]
    InvalidStackName(String),
}

impl CloudError {
    /// Auth errors point at the environment/session, not the template
    pub fn is_auth(&self) -> bool {
        matches!(self, CloudError::Auth { .. })
    }

    /// Provider-assigned error code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            CloudError::Validation { code, .. }
            | CloudError::Auth { code, .. }
            | CloudError::DeploymentFailure { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
