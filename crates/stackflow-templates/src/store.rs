//! Template stores
//!
//! A store maps a template identifier (`namespace/name`, e.g.
//! `cloudformation/vpc.yml`) to raw template content. The embedded store is
//! populated at build time and never changes; the directory store lets a
//! project override individual templates.

use crate::error::{Result, TemplateError};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Identifiers of the bundled templates
pub mod ids {
    pub const APP: &str = "cloudformation/app.yml";
    pub const BUCKET: &str = "cloudformation/bucket.yml";
    pub const COMMON_IAM: &str = "cloudformation/common-iam.yml";
    pub const DATABASE: &str = "cloudformation/database.yml";
    pub const ELB: &str = "cloudformation/elb.yml";
    pub const ENV_EC2: &str = "cloudformation/env-ec2.yml";
    pub const ENV_ECS: &str = "cloudformation/env-ecs.yml";
    pub const PIPELINE_IAM: &str = "cloudformation/pipeline-iam.yml";
    pub const PIPELINE: &str = "cloudformation/pipeline.yml";
    pub const REPO: &str = "cloudformation/repo.yml";
    pub const SCHEDULE: &str = "cloudformation/schedule.yml";
    pub const SERVICE_EC2: &str = "cloudformation/service-ec2.yml";
    pub const SERVICE_ECS: &str = "cloudformation/service-ecs.yml";
    pub const SERVICE_IAM: &str = "cloudformation/service-iam.yml";
    pub const VPC_TARGET: &str = "cloudformation/vpc-target.yml";
    pub const VPC: &str = "cloudformation/vpc.yml";
    pub const BUILDSPEC: &str = "codebuild/buildspec.yml";
    pub const POLICY_ALLOW_ALL: &str = "policies/allow-all.json";
    pub const POLICY_DEFAULT: &str = "policies/default.json";

    /// Prefix shared by every stack template
    pub const CLOUDFORMATION_PREFIX: &str = "cloudformation/";
}

/// Read-only access to named templates
pub trait TemplateStore: Send + Sync {
    /// Resolve an identifier to its raw content
    fn resolve(&self, id: &str) -> Result<String>;

    /// List identifiers starting with `prefix`, sorted
    fn list_all(&self, prefix: &str) -> Result<Vec<String>>;
}

// Sorted by identifier.
static EMBEDDED: &[(&str, &str)] = &[
    (ids::APP, include_str!("../assets/cloudformation/app.yml")),
    (ids::BUCKET, include_str!("../assets/cloudformation/bucket.yml")),
    (ids::COMMON_IAM, include_str!("../assets/cloudformation/common-iam.yml")),
    (ids::DATABASE, include_str!("../assets/cloudformation/database.yml")),
    (ids::ELB, include_str!("../assets/cloudformation/elb.yml")),
    (ids::ENV_EC2, include_str!("../assets/cloudformation/env-ec2.yml")),
    (ids::ENV_ECS, include_str!("../assets/cloudformation/env-ecs.yml")),
    (ids::PIPELINE_IAM, include_str!("../assets/cloudformation/pipeline-iam.yml")),
    (ids::PIPELINE, include_str!("../assets/cloudformation/pipeline.yml")),
    (ids::REPO, include_str!("../assets/cloudformation/repo.yml")),
    (ids::SCHEDULE, include_str!("../assets/cloudformation/schedule.yml")),
    (ids::SERVICE_EC2, include_str!("../assets/cloudformation/service-ec2.yml")),
    (ids::SERVICE_ECS, include_str!("../assets/cloudformation/service-ecs.yml")),
    (ids::SERVICE_IAM, include_str!("../assets/cloudformation/service-iam.yml")),
    (ids::VPC_TARGET, include_str!("../assets/cloudformation/vpc-target.yml")),
    (ids::VPC, include_str!("../assets/cloudformation/vpc.yml")),
    (ids::BUILDSPEC, include_str!("../assets/codebuild/buildspec.yml")),
    (ids::POLICY_ALLOW_ALL, include_str!("../assets/policies/allow-all.json")),
    (ids::POLICY_DEFAULT, include_str!("../assets/policies/default.json")),
];

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplateStore;

impl EmbeddedTemplateStore {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateStore for EmbeddedTemplateStore {
    fn resolve(&self, id: &str) -> Result<String> {
        EMBEDDED
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = EMBEDDED
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Templates read from a directory on disk
///
/// The identifier is the path relative to the root, using `/` separators.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
}

impl DirectoryTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an identifier to a path under the root, rejecting escapes
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let relative = Path::new(id);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if id.is_empty() || !safe {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl TemplateStore for DirectoryTemplateStore {
    fn resolve(&self, id: &str) -> Result<String> {
        let path = self
            .path_for(id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

        if !path.is_file() {
            return Err(TemplateError::NotFound(id.to_string()));
        }

        debug!(id = %id, path = %path.display(), "Reading template override");
        std::fs::read_to_string(&path).map_err(|e| TemplateError::Io {
            path,
            message: e.to_string(),
        })
    }

    fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = self.root.join("**").join("*");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| TemplateError::InvalidPattern(pattern.display().to_string()))?;

        let entries =
            glob::glob(pattern).map_err(|e| TemplateError::InvalidPattern(e.to_string()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TemplateError::Io {
                path: e.path().to_path_buf(),
                message: e.to_string(),
            })?;
            if !path.is_file() {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if id.starts_with(prefix) {
                names.push(id);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Stores consulted in order; the first layer that knows an identifier wins
#[derive(Clone, Default)]
pub struct LayeredTemplateStore {
    layers: Vec<Arc<dyn TemplateStore>>,
}

impl LayeredTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer with lower priority than the existing ones
    pub fn with_layer(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.layers.push(store);
        self
    }
}

impl TemplateStore for LayeredTemplateStore {
    fn resolve(&self, id: &str) -> Result<String> {
        for layer in &self.layers {
            match layer.resolve(id) {
                Ok(content) => return Ok(content),
                Err(TemplateError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(TemplateError::NotFound(id.to_string()))
    }

    fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        for layer in &self.layers {
            names.extend(layer.list_all(prefix)?);
        }
        Ok(names.into_iter().collect())
    }
}

/// Embedded templates, optionally overridden by a directory
pub fn default_store(override_dir: Option<&Path>) -> Arc<dyn TemplateStore> {
    match override_dir {
        Some(dir) => Arc::new(
            LayeredTemplateStore::new()
                .with_layer(Arc::new(DirectoryTemplateStore::new(dir)))
                .with_layer(Arc::new(EmbeddedTemplateStore::new())),
        ),
        None => Arc::new(EmbeddedTemplateStore::new()),
    }
}
