use stackflow_cloud::CloudError;
use stackflow_config::ConfigError;
use stackflow_templates::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// No configuration source supplied a required field
    #[error("{0} must be provided")]
    MissingConfiguration(String),

    #[error("Environment '{0}' is not defined in the configuration")]
    UnknownEnvironment(String),

    /// A step read a state field that no earlier step resolved
    #[error("Step '{step}' requires {field} to be resolved first")]
    Unresolved { step: String, field: &'static str },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkflowError {
    pub fn missing(field: impl Into<String>) -> Self {
        WorkflowError::MissingConfiguration(field.into())
    }

    /// Credential problems are reported apart from template defects
    pub fn is_auth(&self) -> bool {
        matches!(self, WorkflowError::Cloud(e) if e.is_auth())
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
