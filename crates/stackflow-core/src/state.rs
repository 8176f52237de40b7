//! Mutable state threaded through one workflow run

use serde_json::{Map, Value, json};
use stackflow_cloud::{StackOptions, StackRecord, StackSummary};
use stackflow_config::{EnvironmentConfig, EnvironmentProvider};
use stackflow_templates::RenderedDocument;
use std::collections::BTreeMap;

/// Values gathered by the steps of a single workflow run
///
/// Owned by the run; steps fill fields in as they go and never overwrite a
/// field an earlier step already resolved.
#[derive(Debug, Default)]
pub struct WorkflowState {
    pub service_name: Option<String>,
    pub environment_name: Option<String>,
    /// Environment settings, when the environment is in the configuration
    pub environment: Option<EnvironmentConfig>,
    pub runtime: Option<EnvironmentProvider>,
    pub code_revision: Option<String>,
    pub artifact_bucket: Option<String>,
    pub repo_name: Option<String>,
    pub deploy_role_arn: Option<String>,
    pub encryption_key_arn: Option<String>,

    /// Parameters, policy and role for the next deployment
    pub options: StackOptions,
    /// Document rendered for the next deployment
    pub document: Option<RenderedDocument>,
    /// Stacks this run depends on, by name
    pub dependencies: BTreeMap<String, StackSummary>,
    /// Stacks touched so far, in order
    pub records: Vec<StackRecord>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template context built from every resolved field
    ///
    /// Unresolved fields are left out so templates fall back to their
    /// `default` filters.
    pub fn render_context(&self, namespace: &str) -> Value {
        let mut ctx = Map::new();
        ctx.insert("namespace".into(), json!(namespace));

        let fields = [
            ("service_name", &self.service_name),
            ("environment_name", &self.environment_name),
            ("code_revision", &self.code_revision),
            ("artifact_bucket", &self.artifact_bucket),
            ("repo_name", &self.repo_name),
            ("deploy_role_arn", &self.deploy_role_arn),
            ("encryption_key_arn", &self.encryption_key_arn),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                ctx.insert(key.into(), json!(value));
            }
        }

        if let Some(runtime) = self.runtime {
            ctx.insert("runtime".into(), json!(runtime.to_string()));
        }
        if let Some(target) = self.environment.as_ref().and_then(|e| e.vpc_target.as_ref()) {
            ctx.insert(
                "vpc_target".into(),
                json!({
                    "vpc_id": target.vpc_id,
                    "elb_subnet_ids": target.elb_subnet_ids,
                    "instance_subnet_ids": target.instance_subnet_ids,
                }),
            );
        }

        Value::Object(ctx)
    }
}

/// Set `slot` unless an earlier step already did
///
/// Returns whether the value was taken.
pub(crate) fn set_once(slot: &mut Option<String>, value: String) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}
