//! Stack orchestration provider trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remote stack orchestration service abstraction
///
/// Implementations translate their native errors into [`ProviderError`] so
/// nothing above this boundary inspects provider-specific strings.
#[async_trait]
pub trait StackProvider: Send + Sync {
    /// Returns the provider name (e.g., "cloudformation")
    fn name(&self) -> &str;

    /// Check document syntax and semantics without deploying anything
    async fn validate(&self, document: &str) -> Result<(), ProviderError>;

    /// Look up a stack; `Ok(None)` when it does not exist
    async fn describe(&self, stack_name: &str) -> Result<Option<StackSummary>, ProviderError>;

    /// Create the stack if absent, update it otherwise
    async fn create_or_update(
        &self,
        stack_name: &str,
        document: &str,
        options: &StackOptions,
    ) -> Result<StackStatus, ProviderError>;

    /// Delete a stack
    async fn delete(&self, stack_name: &str) -> Result<(), ProviderError>;
}

/// Terminal status reported by `create_or_update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    Created,
    Updated,
    Unchanged,
    Failed { code: String, message: String },
}

/// Error classes the deployer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Invalid or expired credentials
    Auth,
    /// The stack already matches the document
    NoUpdates,
    /// The stack does not exist
    NotFound,
    Other,
}

/// Error reported by a provider, already classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, code, message)
    }

    pub fn other(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, code, message)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Everything besides the document that goes into a stack operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOptions {
    /// Stack parameters (key -> value)
    pub parameters: BTreeMap<String, String>,

    /// Role the provider assumes while deploying
    pub role_arn: Option<String>,

    /// Tags applied to the stack
    pub tags: BTreeMap<String, String>,

    /// Stack policy document
    pub policy: Option<String>,
}

impl StackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Current state of a deployed stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSummary {
    pub name: String,

    /// Provider-specific status (e.g., "CREATE_COMPLETE")
    pub status: String,

    /// Stack outputs
    pub outputs: BTreeMap<String, String>,
}

impl StackSummary {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }
}
