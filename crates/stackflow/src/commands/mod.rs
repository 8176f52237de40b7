pub mod db;
pub mod env;
pub mod pipeline;
pub mod svc;
pub mod templates;

use colored::Colorize;
use stackflow_cloud::{DeploymentResult, StackAction, TerminationResult};
use stackflow_cloud_aws::CloudFormationProvider;
use stackflow_config::{Config, ConfigError};
use stackflow_core::{Workflow, WorkflowContext, WorkflowState};
use stackflow_templates::{TemplateStore, default_store};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Options shared by every subcommand
pub struct Globals {
    pub config: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub region: Option<String>,
}

impl Globals {
    /// Load the configuration; it must exist
    pub fn load_config(&self) -> anyhow::Result<Config> {
        Ok(stackflow_core::load_config(self.config.as_deref())?)
    }

    /// Load the configuration if one can be found
    ///
    /// An explicit `--config` that cannot be read is still an error.
    pub fn try_load_config(&self) -> anyhow::Result<Option<Config>> {
        match stackflow_core::load_config(self.config.as_deref()) {
            Ok(config) => Ok(Some(config)),
            Err(stackflow_core::WorkflowError::Config(ConfigError::ConfigFileNotFound)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Bundled templates layered under `--templates-dir` or `templatesDir`
    pub fn store(&self, config: Option<&Config>) -> Arc<dyn TemplateStore> {
        let dir = self
            .templates_dir
            .clone()
            .or_else(|| config.and_then(Config::templates_dir));
        default_store(dir.as_deref())
    }

    pub async fn context(&self, config: Config) -> WorkflowContext {
        let store = self.store(Some(&config));
        let region = self
            .region
            .clone()
            .or_else(|| (!config.region.is_empty()).then(|| config.region.clone()));
        debug!(region = ?region, "Building CloudFormation client");
        let provider = CloudFormationProvider::from_env(region).await;
        WorkflowContext::new(config, store, Arc::new(provider))
    }
}

/// Run a workflow and print what happened to each stack
pub async fn run_workflow(workflow: Workflow<'_>) -> anyhow::Result<()> {
    println!("{} {}", "▶".blue(), workflow.name().bold());
    let mut state = WorkflowState::new();
    let outcome = workflow.run(&mut state).await;
    print_records(&state);
    outcome?;
    println!("{}", format!("✓ {} complete", workflow.name()).green());
    Ok(())
}

fn print_records(state: &WorkflowState) {
    for record in &state.records {
        let action = match &record.action {
            StackAction::Deploy { result } => match result {
                DeploymentResult::Created | DeploymentResult::Updated => {
                    result.to_string().green()
                }
                DeploymentResult::Unchanged | DeploymentResult::Skipped => {
                    result.to_string().dimmed()
                }
            },
            StackAction::Terminate { result } => match result {
                TerminationResult::Deleted => result.to_string().yellow(),
                TerminationResult::NotFound => result.to_string().dimmed(),
            },
        };
        println!(
            "  {} {} ({} ms)",
            record.stack_name.cyan(),
            action,
            record.duration_ms
        );
    }
}
