//! CloudFormation-backed [`StackProvider`]

use crate::error::from_sdk_error;
use crate::status::{Progress, apply_progress, needs_replacement};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::types::{Capability, Parameter, Stack, Tag};
use stackflow_cloud::{
    ProviderError, ProviderErrorKind, StackOptions, StackProvider, StackStatus, StackSummary,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct CloudFormationProvider {
    client: Client,
    poll_interval: Duration,
}

impl CloudFormationProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build a client from the standard AWS credential/region chain
    ///
    /// `region` overrides whatever the chain resolves.
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn describe_stack(&self, stack_name: &str) -> Result<Option<Stack>, ProviderError> {
        match self.client.describe_stacks().stack_name(stack_name).send().await {
            Ok(output) => Ok(output.stacks().first().cloned()),
            Err(e) => {
                let err = from_sdk_error(&e);
                if err.kind == ProviderErrorKind::NotFound {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Poll until the stack leaves its `*_IN_PROGRESS` state
    async fn wait_for_apply(&self, stack_name: &str) -> Result<StackStatus, ProviderError> {
        loop {
            let Some(stack) = self.describe_stack(stack_name).await? else {
                return Ok(StackStatus::Failed {
                    code: "STACK_MISSING".to_string(),
                    message: format!("Stack {stack_name} disappeared while deploying"),
                });
            };
            let status = stack_status(&stack);
            match apply_progress(status, stack.stack_status_reason()) {
                Progress::Pending => {
                    debug!(stack = %stack_name, status = %status, "Waiting for stack");
                    sleep(self.poll_interval).await;
                }
                Progress::Done(result) => return Ok(result),
            }
        }
    }

    async fn wait_for_delete(&self, stack_name: &str) -> Result<(), ProviderError> {
        loop {
            let Some(stack) = self.describe_stack(stack_name).await? else {
                return Ok(());
            };
            match stack_status(&stack) {
                "DELETE_COMPLETE" => return Ok(()),
                "DELETE_FAILED" => {
                    return Err(ProviderError::other(
                        "DELETE_FAILED",
                        stack.stack_status_reason().unwrap_or_default(),
                    ));
                }
                status => {
                    debug!(stack = %stack_name, status = %status, "Waiting for stack deletion");
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn create(
        &self,
        stack_name: &str,
        document: &str,
        options: &StackOptions,
    ) -> Result<(), ProviderError> {
        info!(stack = %stack_name, "Creating stack");
        self.client
            .create_stack()
            .stack_name(stack_name)
            .template_body(document)
            .set_parameters(Some(parameters(options)))
            .set_tags(Some(tags(options)?))
            .set_role_arn(options.role_arn.clone())
            .set_stack_policy_body(options.policy.clone())
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn update(
        &self,
        stack_name: &str,
        document: &str,
        options: &StackOptions,
    ) -> Result<(), ProviderError> {
        info!(stack = %stack_name, "Updating stack");
        self.client
            .update_stack()
            .stack_name(stack_name)
            .template_body(document)
            .set_parameters(Some(parameters(options)))
            .set_tags(Some(tags(options)?))
            .set_role_arn(options.role_arn.clone())
            .set_stack_policy_body(options.policy.clone())
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }
}

#[async_trait]
impl StackProvider for CloudFormationProvider {
    fn name(&self) -> &str {
        "cloudformation"
    }

    async fn validate(&self, document: &str) -> Result<(), ProviderError> {
        self.client
            .validate_template()
            .template_body(document)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn describe(&self, stack_name: &str) -> Result<Option<StackSummary>, ProviderError> {
        Ok(self.describe_stack(stack_name).await?.map(|stack| {
            let mut summary = StackSummary::new(
                stack.stack_name().unwrap_or(stack_name),
                stack_status(&stack),
            );
            summary.outputs = stack
                .outputs()
                .iter()
                .filter_map(|o| Some((o.output_key()?.to_string(), o.output_value()?.to_string())))
                .collect();
            summary
        }))
    }

    async fn create_or_update(
        &self,
        stack_name: &str,
        document: &str,
        options: &StackOptions,
    ) -> Result<StackStatus, ProviderError> {
        let existing = self.describe_stack(stack_name).await?;
        let status = existing.as_ref().map(stack_status);

        match status {
            Some(status) if needs_replacement(status) => {
                warn!(stack = %stack_name, "Stack is in ROLLBACK_COMPLETE, replacing it");
                self.delete(stack_name).await?;
                self.create(stack_name, document, options).await?;
            }
            Some(_) => self.update(stack_name, document, options).await?,
            None => self.create(stack_name, document, options).await?,
        }

        self.wait_for_apply(stack_name).await
    }

    async fn delete(&self, stack_name: &str) -> Result<(), ProviderError> {
        info!(stack = %stack_name, "Deleting stack");
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        self.wait_for_delete(stack_name).await
    }
}

fn stack_status(stack: &Stack) -> &str {
    stack
        .stack_status()
        .map(|s| s.as_str())
        .unwrap_or("UNKNOWN")
}

fn parameters(options: &StackOptions) -> Vec<Parameter> {
    options
        .parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn tags(options: &StackOptions) -> Result<Vec<Tag>, ProviderError> {
    options
        .tags
        .iter()
        .map(|(key, value)| {
            // `Tag::build` is infallible in this SDK version.
            Ok(Tag::builder().key(key).value(value).build())
        })
        .collect()
}
