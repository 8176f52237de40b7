//! Stack kinds, names and template variants

use crate::error::{Result, WorkflowError};
use crate::state::WorkflowState;
use stackflow_config::EnvironmentProvider;
use stackflow_templates::ids;

/// The kinds of stack a workflow manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Network,
    Environment,
    Service,
    Database,
    Pipeline,
}

impl StackKind {
    pub fn label(&self) -> &'static str {
        match self {
            StackKind::Network => "vpc",
            StackKind::Environment => "environment",
            StackKind::Service => "service",
            StackKind::Database => "database",
            StackKind::Pipeline => "pipeline",
        }
    }

    /// Stack name for this kind, from the fields resolved so far
    ///
    /// `<ns>-vpc-<env>`, `<ns>-environment-<env>`, `<ns>-service-<svc>-<env>`,
    /// `<ns>-database-<svc>-<env>`, `<ns>-pipeline-<svc>`
    pub fn stack_name(&self, namespace: &str, state: &WorkflowState) -> Result<String> {
        let label = self.label();
        let name = match self {
            StackKind::Network | StackKind::Environment => {
                let env = required(state.environment_name.as_deref(), *self, "environment name")?;
                format!("{namespace}-{label}-{env}")
            }
            StackKind::Service | StackKind::Database => {
                let service = required(state.service_name.as_deref(), *self, "service name")?;
                let env = required(state.environment_name.as_deref(), *self, "environment name")?;
                format!("{namespace}-{label}-{service}-{env}")
            }
            StackKind::Pipeline => {
                let service = required(state.service_name.as_deref(), *self, "service name")?;
                format!("{namespace}-{label}-{service}")
            }
        };
        Ok(name)
    }

    /// Template rendered for this kind, picked by runtime and network target
    pub fn template_id(&self, state: &WorkflowState) -> &'static str {
        let runtime = state.runtime.unwrap_or_default();
        match (self, runtime) {
            (StackKind::Network, _) => {
                let targeted = state
                    .environment
                    .as_ref()
                    .is_some_and(|e| e.vpc_target.is_some());
                if targeted { ids::VPC_TARGET } else { ids::VPC }
            }
            (StackKind::Environment, EnvironmentProvider::Ecs) => ids::ENV_ECS,
            (StackKind::Environment, EnvironmentProvider::Ec2) => ids::ENV_EC2,
            (StackKind::Service, EnvironmentProvider::Ecs) => ids::SERVICE_ECS,
            (StackKind::Service, EnvironmentProvider::Ec2) => ids::SERVICE_EC2,
            (StackKind::Database, _) => ids::DATABASE,
            (StackKind::Pipeline, _) => ids::PIPELINE,
        }
    }
}

impl std::fmt::Display for StackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn required<'s>(value: Option<&'s str>, kind: StackKind, field: &'static str) -> Result<&'s str> {
    value.ok_or_else(|| WorkflowError::Unresolved {
        step: format!("{kind} stack name"),
        field,
    })
}
