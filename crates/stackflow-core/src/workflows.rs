//! Workflow definitions
//!
//! Each function assembles the step chain for one lifecycle action. Running
//! the returned [`Workflow`] is left to the caller.

use crate::context::WorkflowContext;
use crate::error::{Result, WorkflowError};
use crate::executor::Workflow;
use crate::stack::StackKind;
use crate::steps::{
    DatabaseInput, DeployStack, RenderPolicy, RenderTemplate, RequireStack, ResolveArtifactBucket,
    ResolveCodeRevision, ResolveDeployRole, ResolveEncryptionKey, ResolveEnvironment,
    ResolveRepoName, ResolveServiceName, RoleScope, StackParameters, TerminateStack,
};
use futures_util::stream::{self, StreamExt};
use stackflow_templates::ids;
use tracing::{info, warn};

/// Number of templates validated at once
const VALIDATE_CONCURRENCY: usize = 4;

/// Network stack, then the environment's compute stack
pub fn environment_upsert<'a>(ctx: &'a WorkflowContext, environment: &str) -> Workflow<'a> {
    Workflow::new("environment upsert")
        .step(ResolveEnvironment::new(ctx, Some(environment)).defined())
        .step(StackParameters::new(ctx, StackKind::Network))
        .step(RenderTemplate::new(ctx, StackKind::Network))
        .step(RenderPolicy::new(ctx, ids::POLICY_ALLOW_ALL))
        .step(DeployStack::new(ctx, StackKind::Network))
        .step(StackParameters::new(ctx, StackKind::Environment))
        .step(RenderTemplate::new(ctx, StackKind::Environment))
        .step(DeployStack::new(ctx, StackKind::Environment))
}

/// Environment stack first, the network it sits in last
pub fn environment_terminate<'a>(ctx: &'a WorkflowContext, environment: &str) -> Workflow<'a> {
    Workflow::new("environment terminate")
        .step(ResolveEnvironment::new(ctx, Some(environment)))
        .step(TerminateStack::new(ctx, StackKind::Environment))
        .step(TerminateStack::new(ctx, StackKind::Network))
}

pub fn service_deploy<'a>(
    ctx: &'a WorkflowContext,
    environment: &str,
    service: Option<&str>,
    revision: Option<&str>,
) -> Workflow<'a> {
    Workflow::new("service deploy")
        .step(ResolveServiceName::new(ctx, service))
        .step(ResolveEnvironment::new(ctx, Some(environment)))
        .step(ResolveCodeRevision::new(ctx, revision))
        .step(RequireStack::new(ctx, StackKind::Environment))
        .step(StackParameters::new(ctx, StackKind::Service))
        .step(RenderTemplate::new(ctx, StackKind::Service))
        .step(RenderPolicy::new(ctx, ids::POLICY_ALLOW_ALL))
        .step(DeployStack::new(ctx, StackKind::Service))
}

pub fn service_terminate<'a>(
    ctx: &'a WorkflowContext,
    environment: &str,
    service: Option<&str>,
) -> Workflow<'a> {
    Workflow::new("service terminate")
        .step(ResolveServiceName::new(ctx, service))
        .step(ResolveEnvironment::new(ctx, Some(environment)))
        .step(TerminateStack::new(ctx, StackKind::Service))
}

/// Database stack for a service in an environment
///
/// Fails before any remote call when no artifact bucket is configured.
pub fn database_upsert<'a>(
    ctx: &'a WorkflowContext,
    environment: &str,
    service: Option<&str>,
) -> Workflow<'a> {
    Workflow::new("database upsert")
        .step(DatabaseInput::new(ctx, service))
        .step(ResolveEnvironment::new(ctx, Some(environment)))
        .step(ResolveDeployRole::new(ctx, RoleScope::Database))
        .step(ResolveEncryptionKey::new(ctx, RoleScope::Database))
        .step(StackParameters::new(ctx, StackKind::Database))
        .step(RenderTemplate::new(ctx, StackKind::Database))
        .step(RenderPolicy::new(ctx, ids::POLICY_DEFAULT))
        .step(DeployStack::new(ctx, StackKind::Database))
}

pub fn database_terminate<'a>(
    ctx: &'a WorkflowContext,
    environment: &str,
    service: Option<&str>,
) -> Workflow<'a> {
    Workflow::new("database terminate")
        .step(ResolveServiceName::new(ctx, service))
        .step(ResolveEnvironment::new(ctx, Some(environment)))
        .step(TerminateStack::new(ctx, StackKind::Database))
}

pub fn pipeline_upsert<'a>(ctx: &'a WorkflowContext, service: Option<&str>) -> Workflow<'a> {
    Workflow::new("pipeline upsert")
        .step(ResolveServiceName::new(ctx, service))
        .step(ResolveArtifactBucket::new(ctx))
        .step(ResolveRepoName::new(ctx))
        .step(ResolveDeployRole::new(ctx, RoleScope::Pipeline))
        .step(ResolveEncryptionKey::new(ctx, RoleScope::Pipeline))
        .step(StackParameters::new(ctx, StackKind::Pipeline))
        .step(RenderTemplate::new(ctx, StackKind::Pipeline))
        .step(RenderPolicy::new(ctx, ids::POLICY_ALLOW_ALL))
        .step(DeployStack::new(ctx, StackKind::Pipeline))
}

pub fn pipeline_terminate<'a>(ctx: &'a WorkflowContext, service: Option<&str>) -> Workflow<'a> {
    Workflow::new("pipeline terminate")
        .step(ResolveServiceName::new(ctx, service))
        .step(TerminateStack::new(ctx, StackKind::Pipeline))
}

/// Outcome of validating one template
#[derive(Debug)]
pub enum TemplateCheck {
    Valid,
    /// Rendered empty with no input, nothing to validate
    Skipped,
    Invalid(WorkflowError),
}

#[derive(Debug)]
pub struct TemplateReport {
    pub id: String,
    pub check: TemplateCheck,
}

impl TemplateReport {
    pub fn is_invalid(&self) -> bool {
        matches!(self.check, TemplateCheck::Invalid(_))
    }
}

/// Render every stack template with no input and have the provider validate it
///
/// Reports come back in template order. An auth error aborts the whole run
/// since every other template would fail the same way.
#[tracing::instrument(skip_all)]
pub async fn validate_templates(ctx: &WorkflowContext) -> Result<Vec<TemplateReport>> {
    let template_ids = ctx
        .renderer
        .store()
        .list_all(ids::CLOUDFORMATION_PREFIX)?;
    info!(count = template_ids.len(), "Validating templates");

    let mut checks = stream::iter(template_ids)
        .map(|id| async move {
            let check = check_template(ctx, &id).await;
            (id, check)
        })
        .buffered(VALIDATE_CONCURRENCY);

    let mut reports = Vec::new();
    while let Some((id, check)) = checks.next().await {
        let check = match check {
            Ok(check) => check,
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => {
                warn!(template = %id, error = %e, "Template is invalid");
                TemplateCheck::Invalid(e)
            }
        };
        reports.push(TemplateReport { id, check });
    }
    Ok(reports)
}

async fn check_template(ctx: &WorkflowContext, id: &str) -> Result<TemplateCheck> {
    let document = ctx.renderer.render(id, None)?;
    if document.is_empty() {
        return Ok(TemplateCheck::Skipped);
    }
    ctx.deployer.validate(&document).await?;
    Ok(TemplateCheck::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_cloud::memory::InMemoryStackProvider;
    use stackflow_config::Config;
    use stackflow_templates::default_store;
    use std::sync::Arc;

    fn context() -> WorkflowContext {
        WorkflowContext::new(
            Config::default(),
            default_store(None),
            Arc::new(InMemoryStackProvider::new()),
        )
    }

    #[test]
    fn test_environment_upsert_chain() {
        let ctx = context();
        assert_eq!(
            environment_upsert(&ctx, "dev").step_names(),
            vec![
                "resolve environment",
                "vpc parameters",
                "render vpc template",
                "render stack policy",
                "deploy vpc stack",
                "environment parameters",
                "render environment template",
                "deploy environment stack",
            ]
        );
    }

    #[test]
    fn test_database_upsert_starts_with_input() {
        let ctx = context();
        let workflow = database_upsert(&ctx, "dev", None);
        assert_eq!(workflow.name(), "database upsert");
        assert_eq!(workflow.step_names()[0], "database input");
        assert_eq!(workflow.step_names().last(), Some(&"deploy database stack"));
    }

    #[test]
    fn test_service_deploy_requires_environment_before_render() {
        let ctx = context();
        let workflow = service_deploy(&ctx, "dev", None, None);
        let names = workflow.step_names();
        let require = names.iter().position(|n| *n == "require environment stack");
        let render = names.iter().position(|n| *n == "render service template");
        assert!(require.unwrap() < render.unwrap());
    }
}
