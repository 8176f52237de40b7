//! Stack deployer
//!
//! Submits rendered documents to a [`StackProvider`] and interprets what comes
//! back. No retries and no timeouts happen here: one provider failure is one
//! error.

use crate::error::{CloudError, Result};
use crate::provider::{ProviderError, ProviderErrorKind, StackOptions, StackProvider, StackStatus, StackSummary};
use crate::result::{DeploymentResult, TerminationResult};
use stackflow_templates::RenderedDocument;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which provider call an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Validate,
    Apply,
    Lookup,
}

#[derive(Clone)]
pub struct StackDeployer {
    provider: Arc<dyn StackProvider>,
}

impl StackDeployer {
    pub fn new(provider: Arc<dyn StackProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Validate then create or update `stack_name` from `document`
    ///
    /// An empty document is skipped without calling the provider.
    #[tracing::instrument(skip(self, document, options), fields(provider = %self.provider.name()))]
    pub async fn deploy(
        &self,
        document: &RenderedDocument,
        stack_name: &str,
        options: &StackOptions,
    ) -> Result<DeploymentResult> {
        if document.is_empty() {
            info!(stack = %stack_name, "Empty document, nothing to deploy");
            return Ok(DeploymentResult::Skipped);
        }

        check_stack_name(stack_name)?;

        self.validate(document).await?;

        let status = self
            .provider
            .create_or_update(stack_name, document.as_str(), options)
            .await;

        let result = match status {
            Ok(StackStatus::Created) => DeploymentResult::Created,
            Ok(StackStatus::Updated) => DeploymentResult::Updated,
            Ok(StackStatus::Unchanged) => DeploymentResult::Unchanged,
            Ok(StackStatus::Failed { code, message }) => {
                return Err(CloudError::DeploymentFailure {
                    stack: stack_name.to_string(),
                    code,
                    message,
                });
            }
            Err(e) if e.kind == ProviderErrorKind::NoUpdates => {
                debug!(stack = %stack_name, message = %e.message, "Provider reported no updates");
                DeploymentResult::Unchanged
            }
            Err(e) => return Err(classify(Phase::Apply, stack_name, e)),
        };

        info!(stack = %stack_name, result = %result, "Stack deployed");
        Ok(result)
    }

    /// Ask the provider to validate a document
    pub async fn validate(&self, document: &RenderedDocument) -> Result<()> {
        if document.is_empty() {
            return Ok(());
        }
        self.provider
            .validate(document.as_str())
            .await
            .map_err(|e| classify(Phase::Validate, "", e))
    }

    /// Look up a stack by name
    pub async fn lookup(&self, stack_name: &str) -> Result<Option<StackSummary>> {
        check_stack_name(stack_name)?;
        match self.provider.describe(stack_name).await {
            Ok(summary) => Ok(summary),
            Err(e) if e.kind == ProviderErrorKind::NotFound => Ok(None),
            Err(e) => Err(classify(Phase::Lookup, stack_name, e)),
        }
    }

    /// Look up a stack that must exist
    pub async fn require(&self, stack_name: &str) -> Result<StackSummary> {
        self.lookup(stack_name)
            .await?
            .ok_or_else(|| CloudError::StackNotFound(stack_name.to_string()))
    }

    /// Delete a stack; deleting an absent stack is not an error
    #[tracing::instrument(skip(self), fields(provider = %self.provider.name()))]
    pub async fn terminate(&self, stack_name: &str) -> Result<TerminationResult> {
        if self.lookup(stack_name).await?.is_none() {
            warn!(stack = %stack_name, "Stack does not exist, nothing to delete");
            return Ok(TerminationResult::NotFound);
        }

        match self.provider.delete(stack_name).await {
            Ok(()) => {
                info!(stack = %stack_name, "Stack deleted");
                Ok(TerminationResult::Deleted)
            }
            Err(e) if e.kind == ProviderErrorKind::NotFound => Ok(TerminationResult::NotFound),
            Err(e) => Err(classify(Phase::Apply, stack_name, e)),
        }
    }
}

/// Map a classified provider error onto the deployer's taxonomy
fn classify(phase: Phase, stack_name: &str, error: ProviderError) -> CloudError {
    let ProviderError { kind, code, message } = error;
    match (kind, phase) {
        (ProviderErrorKind::Auth, _) => CloudError::Auth { code, message },
        (_, Phase::Validate) => CloudError::Validation { code, message },
        (_, Phase::Apply | Phase::Lookup) => CloudError::DeploymentFailure {
            stack: stack_name.to_string(),
            code,
            message,
        },
    }
}

/// Stack names: 1-128 characters, alphanumerics and hyphens, starting with a letter
fn check_stack_name(stack_name: &str) -> Result<()> {
    let valid = !stack_name.is_empty()
        && stack_name.len() <= 128
        && stack_name.starts_with(|c: char| c.is_ascii_alphabetic())
        && stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CloudError::InvalidStackName(stack_name.to_string()))
    }
}
