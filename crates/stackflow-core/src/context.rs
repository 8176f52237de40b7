//! Per-invocation workflow context

use crate::error::Result;
use stackflow_cloud::{StackDeployer, StackProvider};
use stackflow_config::Config;
use stackflow_templates::{TemplateRenderer, TemplateStore};
use std::path::Path;
use std::sync::Arc;

/// Everything a workflow reads but never mutates
pub struct WorkflowContext {
    pub config: Config,
    pub renderer: TemplateRenderer,
    pub deployer: StackDeployer,
}

impl WorkflowContext {
    pub fn new(
        config: Config,
        store: Arc<dyn TemplateStore>,
        provider: Arc<dyn StackProvider>,
    ) -> Self {
        Self {
            config,
            renderer: TemplateRenderer::new(store),
            deployer: StackDeployer::new(provider),
        }
    }

    pub fn namespace(&self) -> &str {
        self.config.namespace()
    }
}

/// Load the configuration from `path`, or discover it when `None`
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => stackflow_config::load_config(path)?,
        None => stackflow_config::load()?,
    };
    Ok(config)
}
