//! Step chains
//!
//! A [`Workflow`] is an ordered list of [`Step`]s run one after another against
//! a single [`WorkflowState`]. The first failing step ends the run and its
//! error is returned as-is.

use crate::error::Result;
use crate::state::WorkflowState;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// One unit of work in a workflow
///
/// A step mutates the state and makes at most one collaborator call.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, state: &mut WorkflowState) -> Result<()>;
}

pub struct Workflow<'a> {
    name: String,
    steps: Vec<Box<dyn Step + 'a>>,
}

impl<'a> Workflow<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl Step + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the steps in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, stopping at the first failure
    #[tracing::instrument(skip_all, fields(workflow = %self.name))]
    pub async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            debug!(step = step.name(), index, "Running step");
            if let Err(e) = step.execute(state).await {
                warn!(step = step.name(), error = %e, "Step failed");
                return Err(e);
            }
        }
        info!(steps = self.steps.len(), "Workflow complete");
        Ok(())
    }

    /// Run against a fresh state and hand the state back
    pub async fn execute(&self) -> Result<WorkflowState> {
        let mut state = WorkflowState::new();
        self.run(&mut state).await?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use std::sync::Mutex;

    struct Recording<'a> {
        name: &'static str,
        log: &'a Mutex<Vec<&'static str>>,
        fail: bool,
    }

    #[async_trait]
    impl Step for Recording<'_> {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(WorkflowError::missing("Pipeline build bucket"));
            }
            if state.repo_name.is_none() {
                state.repo_name = Some(self.name.to_string());
            }
            Ok(())
        }
    }

    fn step<'a>(name: &'static str, log: &'a Mutex<Vec<&'static str>>, fail: bool) -> Recording<'a> {
        Recording { name, log, fail }
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let log = Mutex::new(Vec::new());
        let workflow = Workflow::new("ordered")
            .step(step("a", &log, false))
            .step(step("b", &log, false))
            .step(step("c", &log, false));

        let state = workflow.execute().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(state.repo_name.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_halts_at_first_failure() {
        let log = Mutex::new(Vec::new());
        let workflow = Workflow::new("short-circuit")
            .step(step("a", &log, false))
            .step(step("b", &log, true))
            .step(step("c", &log, false));

        let mut state = WorkflowState::new();
        let err = workflow.run(&mut state).await.unwrap_err();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(err.to_string(), "Pipeline build bucket must be provided");
        // effects of steps before the failure are kept
        assert_eq!(state.repo_name.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_empty_workflow_succeeds() {
        let workflow = Workflow::new("empty");
        assert!(workflow.step_names().is_empty());
        workflow.execute().await.unwrap();
    }
}
