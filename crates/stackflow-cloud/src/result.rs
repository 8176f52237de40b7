//! Deployment outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Outcome of deploying one rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentResult {
    /// A new stack was created
    Created,
    /// An existing stack was changed
    Updated,
    /// The stack already matched the document
    Unchanged,
    /// The document was empty; the provider was never called
    Skipped,
}

impl DeploymentResult {
    /// Whether the remote stack changed
    pub fn is_change(&self) -> bool {
        matches!(self, DeploymentResult::Created | DeploymentResult::Updated)
    }
}

impl std::fmt::Display for DeploymentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentResult::Created => write!(f, "created"),
            DeploymentResult::Updated => write!(f, "updated"),
            DeploymentResult::Unchanged => write!(f, "unchanged"),
            DeploymentResult::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of deleting a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationResult {
    Deleted,
    /// Nothing to delete
    NotFound,
}

impl std::fmt::Display for TerminationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationResult::Deleted => write!(f, "deleted"),
            TerminationResult::NotFound => write!(f, "not found"),
        }
    }
}

/// What happened to a stack during a workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum StackAction {
    Deploy { result: DeploymentResult },
    Terminate { result: TerminationResult },
}

impl std::fmt::Display for StackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackAction::Deploy { result } => write!(f, "{}", result),
            StackAction::Terminate { result } => write!(f, "{}", result),
        }
    }
}

/// Record of one stack operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    pub stack_name: String,
    pub action: StackAction,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl StackRecord {
    pub fn new(stack_name: impl Into<String>, action: StackAction, started: Instant) -> Self {
        Self {
            stack_name: stack_name.into(),
            action,
            finished_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}
