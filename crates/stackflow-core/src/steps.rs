//! Reusable workflow steps
//!
//! Resolver steps only fill in state fields. Render, lookup, deploy and
//! terminate steps each make exactly one collaborator call.

use crate::context::WorkflowContext;
use crate::error::{Result, WorkflowError};
use crate::executor::Step;
use crate::resolver::Resolver;
use crate::stack::StackKind;
use crate::state::{WorkflowState, set_once};
use async_trait::async_trait;
use stackflow_cloud::{StackAction, StackRecord};
use stackflow_config::{Config, EnvironmentProvider};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

const DEFAULT_CODE_REVISION: &str = "latest";

/// Which section of the configuration role and key settings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScope {
    Database,
    Pipeline,
}

fn resolve_service_name(config: &Config, explicit: Option<&str>) -> Result<String> {
    Resolver::new("Service name")
        .source("argument", explicit)
        .source("service.name", config.service.name.as_str())
        .source("repo.name", config.repo.name.as_str())
        .resolve()
}

fn resolve_artifact_bucket(config: &Config) -> Result<String> {
    Resolver::new("Pipeline build bucket")
        .source("service.pipeline.build.bucket", config.service.pipeline.build.bucket.as_str())
        .resolve()
}

/// Explicit argument, then `service.name`, then `repo.name`
pub struct ResolveServiceName<'a> {
    ctx: &'a WorkflowContext,
    explicit: Option<String>,
}

impl<'a> ResolveServiceName<'a> {
    pub fn new(ctx: &'a WorkflowContext, explicit: Option<&str>) -> Self {
        Self {
            ctx,
            explicit: explicit.map(String::from),
        }
    }
}

#[async_trait]
impl Step for ResolveServiceName<'_> {
    fn name(&self) -> &str {
        "resolve service name"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.service_name.is_none() {
            let name = resolve_service_name(&self.ctx.config, self.explicit.as_deref())?;
            set_once(&mut state.service_name, name);
        }
        Ok(())
    }
}

/// Service name and artifact bucket for the database workflow
///
/// The service name is stored before the bucket is checked, so a missing
/// bucket leaves the resolved name in the state.
pub struct DatabaseInput<'a> {
    ctx: &'a WorkflowContext,
    explicit: Option<String>,
}

impl<'a> DatabaseInput<'a> {
    pub fn new(ctx: &'a WorkflowContext, service_name: Option<&str>) -> Self {
        Self {
            ctx,
            explicit: service_name.map(String::from),
        }
    }
}

#[async_trait]
impl Step for DatabaseInput<'_> {
    fn name(&self) -> &str {
        "database input"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.service_name.is_none() {
            let name = resolve_service_name(&self.ctx.config, self.explicit.as_deref())?;
            set_once(&mut state.service_name, name);
        }
        if state.artifact_bucket.is_none() {
            set_once(&mut state.artifact_bucket, resolve_artifact_bucket(&self.ctx.config)?);
        }
        Ok(())
    }
}

pub struct ResolveArtifactBucket<'a> {
    ctx: &'a WorkflowContext,
}

impl<'a> ResolveArtifactBucket<'a> {
    pub fn new(ctx: &'a WorkflowContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for ResolveArtifactBucket<'_> {
    fn name(&self) -> &str {
        "resolve artifact bucket"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.artifact_bucket.is_none() {
            set_once(&mut state.artifact_bucket, resolve_artifact_bucket(&self.ctx.config)?);
        }
        Ok(())
    }
}

/// Environment name plus its configured runtime and network settings
pub struct ResolveEnvironment<'a> {
    ctx: &'a WorkflowContext,
    explicit: Option<String>,
    require_defined: bool,
}

impl<'a> ResolveEnvironment<'a> {
    /// Environments not listed in the configuration use defaults
    pub fn new(ctx: &'a WorkflowContext, name: Option<&str>) -> Self {
        Self {
            ctx,
            explicit: name.map(String::from),
            require_defined: false,
        }
    }

    /// Fail with `UnknownEnvironment` if the configuration lacks the environment
    pub fn defined(mut self) -> Self {
        self.require_defined = true;
        self
    }
}

#[async_trait]
impl Step for ResolveEnvironment<'_> {
    fn name(&self) -> &str {
        "resolve environment"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.environment_name.is_some() {
            return Ok(());
        }
        let name = Resolver::new("Environment name")
            .source("argument", self.explicit.as_deref())
            .resolve()?;

        let environment = self.ctx.config.environment(&name).cloned();
        if environment.is_none() && self.require_defined {
            return Err(WorkflowError::UnknownEnvironment(name));
        }

        let runtime = environment.as_ref().map(|e| e.provider).unwrap_or_default();
        debug!(environment = %name, runtime = %runtime, "Resolved environment");

        if state.runtime.is_none() {
            state.runtime = Some(runtime);
        }
        state.environment = environment;
        set_once(&mut state.environment_name, name);
        Ok(())
    }
}

/// `repo.name`, then the resolved service name
pub struct ResolveRepoName<'a> {
    ctx: &'a WorkflowContext,
}

impl<'a> ResolveRepoName<'a> {
    pub fn new(ctx: &'a WorkflowContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for ResolveRepoName<'_> {
    fn name(&self) -> &str {
        "resolve repository name"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.repo_name.is_none() {
            let name = Resolver::new("Repository name")
                .source("repo.name", self.ctx.config.repo.name.as_str())
                .source("service name", state.service_name.as_deref())
                .resolve()?;
            set_once(&mut state.repo_name, name);
        }
        Ok(())
    }
}

/// Explicit argument, then `repo.revision`, then "latest"
pub struct ResolveCodeRevision<'a> {
    ctx: &'a WorkflowContext,
    explicit: Option<String>,
}

impl<'a> ResolveCodeRevision<'a> {
    pub fn new(ctx: &'a WorkflowContext, explicit: Option<&str>) -> Self {
        Self {
            ctx,
            explicit: explicit.map(String::from),
        }
    }
}

#[async_trait]
impl Step for ResolveCodeRevision<'_> {
    fn name(&self) -> &str {
        "resolve code revision"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.code_revision.is_none() {
            let revision = Resolver::new("Code revision")
                .source("argument", self.explicit.as_deref())
                .source("repo.revision", self.ctx.config.repo.revision.as_str())
                .resolve_or(DEFAULT_CODE_REVISION);
            set_once(&mut state.code_revision, revision);
        }
        Ok(())
    }
}

/// Role the orchestration service assumes; optional
pub struct ResolveDeployRole<'a> {
    ctx: &'a WorkflowContext,
    scope: RoleScope,
}

impl<'a> ResolveDeployRole<'a> {
    pub fn new(ctx: &'a WorkflowContext, scope: RoleScope) -> Self {
        Self { ctx, scope }
    }
}

#[async_trait]
impl Step for ResolveDeployRole<'_> {
    fn name(&self) -> &str {
        "resolve deploy role"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.deploy_role_arn.is_some() {
            return Ok(());
        }
        let service = &self.ctx.config.service;
        let (label, scoped) = match self.scope {
            RoleScope::Database => ("service.database.roleArn", service.database.role_arn.as_str()),
            RoleScope::Pipeline => ("service.pipeline.roleArn", service.pipeline.role_arn.as_str()),
        };
        let role = Resolver::new("Deploy role ARN")
            .source(label, scoped)
            .source("roles.cloudFormation", self.ctx.config.roles.cloud_formation.as_str())
            .resolve_optional();

        if let Some(role) = role {
            state.options.role_arn = Some(role.clone());
            set_once(&mut state.deploy_role_arn, role);
        }
        Ok(())
    }
}

/// Encryption key for the stack's data at rest; optional
pub struct ResolveEncryptionKey<'a> {
    ctx: &'a WorkflowContext,
    scope: RoleScope,
}

impl<'a> ResolveEncryptionKey<'a> {
    pub fn new(ctx: &'a WorkflowContext, scope: RoleScope) -> Self {
        Self { ctx, scope }
    }
}

#[async_trait]
impl Step for ResolveEncryptionKey<'_> {
    fn name(&self) -> &str {
        "resolve encryption key"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        if state.encryption_key_arn.is_some() {
            return Ok(());
        }
        let service = &self.ctx.config.service;
        let (label, value) = match self.scope {
            RoleScope::Database => ("service.database.kmsKey", service.database.kms_key.as_str()),
            RoleScope::Pipeline => ("service.pipeline.kmsKey", service.pipeline.kms_key.as_str()),
        };
        if let Some(key) = Resolver::new("Encryption key ARN")
            .source(label, value)
            .resolve_optional()
        {
            set_once(&mut state.encryption_key_arn, key);
        }
        Ok(())
    }
}

/// Look up a stack the workflow depends on; it must exist
pub struct RequireStack<'a> {
    ctx: &'a WorkflowContext,
    kind: StackKind,
    name: String,
}

impl<'a> RequireStack<'a> {
    pub fn new(ctx: &'a WorkflowContext, kind: StackKind) -> Self {
        Self {
            ctx,
            kind,
            name: format!("require {kind} stack"),
        }
    }
}

#[async_trait]
impl Step for RequireStack<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        let stack_name = self.kind.stack_name(self.ctx.namespace(), state)?;
        let summary = self.ctx.deployer.require(&stack_name).await?;
        debug!(stack = %stack_name, status = %summary.status, "Dependency present");
        state.dependencies.insert(stack_name, summary);
        Ok(())
    }
}

/// Replace the stack parameters with the ones `kind` takes
pub struct StackParameters<'a> {
    ctx: &'a WorkflowContext,
    kind: StackKind,
    name: String,
}

impl<'a> StackParameters<'a> {
    pub fn new(ctx: &'a WorkflowContext, kind: StackKind) -> Self {
        Self {
            ctx,
            kind,
            name: format!("{kind} parameters"),
        }
    }
}

#[async_trait]
impl Step for StackParameters<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        let parameters = stack_parameters(self.ctx, self.kind, state)?;
        debug!(kind = %self.kind, count = parameters.len(), "Stack parameters");
        state.options.parameters = parameters;
        Ok(())
    }
}

/// Parameters each template declares, filled from configuration and state
///
/// Unset values are left out so the template default applies.
fn stack_parameters(
    ctx: &WorkflowContext,
    kind: StackKind,
    state: &WorkflowState,
) -> Result<BTreeMap<String, String>> {
    let config = &ctx.config;
    let namespace = ctx.namespace();
    let mut params = Params::default();

    match kind {
        StackKind::Network => {}
        StackKind::Environment => {
            params.put("VpcStackName", &StackKind::Network.stack_name(namespace, state)?);
            if let Some(cluster) = state.environment.as_ref().map(|e| &e.cluster) {
                params.put("InstanceType", &cluster.instance_type);
                params.put_num("DesiredCapacity", cluster.desired_capacity);
                params.put_num("MaxSize", cluster.max_size);
            }
        }
        StackKind::Service => {
            let service = &config.service;
            params.put(
                "EnvironmentStackName",
                &StackKind::Environment.stack_name(namespace, state)?,
            );
            params.put("CodeRevision", state.code_revision.as_deref().unwrap_or_default());
            params.put_num("ServicePort", service.port.map(u32::from));
            params.put("ServiceHealthEndpoint", &service.health_endpoint);
            match state.runtime.unwrap_or_default() {
                EnvironmentProvider::Ecs => {
                    params.put("ImageUrl", &service.image);
                    params.put_num("ServiceCpu", service.cpu);
                    params.put_num("ServiceMemory", service.memory);
                    params.put_num("ServiceDesiredCount", service.desired_count);
                }
                EnvironmentProvider::Ec2 => {
                    params.put("ArtifactBucket", &service.pipeline.build.bucket);
                }
            }
        }
        StackKind::Database => {
            let database = &config.service.database;
            params.put(
                "EnvironmentStackName",
                &StackKind::Environment.stack_name(namespace, state)?,
            );
            params.put("DatabaseName", &database.name);
            params.put("DatabaseEngine", &database.engine);
            params.put("DatabaseInstanceClass", &database.instance_class);
            params.put("ArtifactBucket", state.artifact_bucket.as_deref().unwrap_or_default());
        }
        StackKind::Pipeline => {
            let pipeline = &config.service.pipeline;
            let source_repo = Resolver::new("Source repository")
                .source("service.pipeline.source.repo", pipeline.source.repo.as_str())
                .source("repository name", state.repo_name.as_deref())
                .resolve_optional();
            let source_branch = Resolver::new("Source branch")
                .source("service.pipeline.source.branch", pipeline.source.branch.as_str())
                .source("repo.branch", config.repo.branch.as_str())
                .resolve_optional();

            params.put("SourceRepo", source_repo.as_deref().unwrap_or_default());
            params.put("SourceBranch", source_branch.as_deref().unwrap_or_default());
            params.put("ArtifactBucket", state.artifact_bucket.as_deref().unwrap_or_default());
            params.put("BuildImage", &pipeline.build.image);
            params.put("BuildComputeType", &pipeline.build.compute_type);
            params.put("AcceptanceEnvironment", &pipeline.acceptance.environment);
            params.put("ProductionEnvironment", &pipeline.production.environment);
        }
    }

    Ok(params.0)
}

#[derive(Default)]
struct Params(BTreeMap<String, String>);

impl Params {
    fn put(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.0.insert(key.to_string(), value.to_string());
        }
    }

    fn put_num(&mut self, key: &str, value: Option<u32>) {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.to_string());
        }
    }
}

/// Render the template variant for `kind` with the current state
pub struct RenderTemplate<'a> {
    ctx: &'a WorkflowContext,
    kind: StackKind,
    name: String,
}

impl<'a> RenderTemplate<'a> {
    pub fn new(ctx: &'a WorkflowContext, kind: StackKind) -> Self {
        Self {
            ctx,
            kind,
            name: format!("render {kind} template"),
        }
    }
}

#[async_trait]
impl Step for RenderTemplate<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        let id = self.kind.template_id(state);
        let context = state.render_context(self.ctx.namespace());
        let document = self.ctx.renderer.render(id, Some(&context))?;
        state.document = Some(document);
        Ok(())
    }
}

/// Render a stack policy into the deployment options
pub struct RenderPolicy<'a> {
    ctx: &'a WorkflowContext,
    id: &'static str,
}

impl<'a> RenderPolicy<'a> {
    pub fn new(ctx: &'a WorkflowContext, id: &'static str) -> Self {
        Self { ctx, id }
    }
}

#[async_trait]
impl Step for RenderPolicy<'_> {
    fn name(&self) -> &str {
        "render stack policy"
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        let policy = self.ctx.renderer.render(self.id, None)?;
        state.options.policy = (!policy.is_empty()).then(|| policy.into_string());
        Ok(())
    }
}

/// Deploy the rendered document as the `kind` stack
pub struct DeployStack<'a> {
    ctx: &'a WorkflowContext,
    kind: StackKind,
    name: String,
}

impl<'a> DeployStack<'a> {
    pub fn new(ctx: &'a WorkflowContext, kind: StackKind) -> Self {
        Self {
            ctx,
            kind,
            name: format!("deploy {kind} stack"),
        }
    }
}

#[async_trait]
impl Step for DeployStack<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        let stack_name = self.kind.stack_name(self.ctx.namespace(), state)?;
        let document = state.document.take().ok_or_else(|| WorkflowError::Unresolved {
            step: self.name.clone(),
            field: "rendered document",
        })?;
        let options = state
            .options
            .clone()
            .with_tag("stackflow-namespace", self.ctx.namespace())
            .with_tag("stackflow-kind", self.kind.label());

        let started = Instant::now();
        let result = self
            .ctx
            .deployer
            .deploy(&document, &stack_name, &options)
            .await?;

        info!(stack = %stack_name, result = %result, "Deploy step finished");
        state.records.push(StackRecord::new(
            stack_name,
            StackAction::Deploy { result },
            started,
        ));
        Ok(())
    }
}

/// Delete the `kind` stack
pub struct TerminateStack<'a> {
    ctx: &'a WorkflowContext,
    kind: StackKind,
    name: String,
}

impl<'a> TerminateStack<'a> {
    pub fn new(ctx: &'a WorkflowContext, kind: StackKind) -> Self {
        Self {
            ctx,
            kind,
            name: format!("terminate {kind} stack"),
        }
    }
}

#[async_trait]
impl Step for TerminateStack<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &mut WorkflowState) -> Result<()> {
        let stack_name = self.kind.stack_name(self.ctx.namespace(), state)?;
        let started = Instant::now();
        let result = self.ctx.deployer.terminate(&stack_name).await?;
        state.records.push(StackRecord::new(
            stack_name,
            StackAction::Terminate { result },
            started,
        ));
        Ok(())
    }
}
