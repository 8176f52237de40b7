//! Configuration model (`stackflow.yml`)
//!
//! String fields follow the "empty means unset" convention so that a field
//! can be present in YAML but still fall through to a lower-precedence source.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "stackflow";

/// Root of the configuration tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub namespace: String,
    pub region: String,
    /// Directory with template overrides, relative to the config file
    pub templates_dir: Option<PathBuf>,
    pub repo: RepoConfig,
    pub service: ServiceConfig,
    pub environments: Vec<EnvironmentConfig>,
    pub roles: RolesConfig,

    /// Directory that held the configuration file
    #[serde(skip)]
    pub base_path: Option<PathBuf>,
}

impl Config {
    /// Namespace used as the prefix of every stack name
    pub fn namespace(&self) -> &str {
        if self.namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            &self.namespace
        }
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Template override directory resolved against the config location
    pub fn templates_dir(&self) -> Option<PathBuf> {
        let dir = self.templates_dir.as_ref()?;
        match &self.base_path {
            Some(base) if dir.is_relative() => Some(base.join(dir)),
            _ => Some(dir.clone()),
        }
    }
}

/// Source repository of the project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoConfig {
    pub name: String,
    pub revision: String,
    pub branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    pub name: String,
    pub image: String,
    pub port: Option<u16>,
    pub health_endpoint: String,
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    pub desired_count: Option<u32>,
    pub pipeline: PipelineConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub build: BuildConfig,
    pub acceptance: StageTarget,
    pub production: StageTarget,
    pub role_arn: String,
    pub kms_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Artifact storage location for build outputs
    pub bucket: String,
    pub image: String,
    pub compute_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageTarget {
    pub environment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseConfig {
    pub name: String,
    pub engine: String,
    pub instance_class: String,
    pub kms_key: String,
    pub role_arn: String,
}

/// Compute runtime an environment is built on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentProvider {
    #[default]
    Ecs,
    Ec2,
}

impl std::fmt::Display for EnvironmentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentProvider::Ecs => write!(f, "ecs"),
            EnvironmentProvider::Ec2 => write!(f, "ec2"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentConfig {
    pub name: String,
    pub provider: EnvironmentProvider,
    pub cluster: ClusterConfig,
    pub vpc_target: Option<VpcTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    pub instance_type: String,
    pub desired_capacity: Option<u32>,
    pub max_size: Option<u32>,
}

/// An existing network an environment is deployed into instead of a new VPC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcTarget {
    pub vpc_id: String,
    pub elb_subnet_ids: Vec<String>,
    pub instance_subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RolesConfig {
    pub cloud_formation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
namespace: acme
repo:
  name: orders-repo
service:
  name: orders
  port: 8080
  pipeline:
    build:
      bucket: acme-artifacts
    kmsKey: arn:aws:kms:us-east-1:111111111111:key/pipeline
  database:
    engine: aurora-postgresql
environments:
  - name: dev
  - name: prod
    provider: ec2
    cluster:
      instanceType: m5.large
      maxSize: 4
    vpcTarget:
      vpcId: vpc-123
      elbSubnetIds: [subnet-a, subnet-b]
      instanceSubnetIds: [subnet-c]
roles:
  cloudFormation: arn:aws:iam::111111111111:role/cfn
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();

        assert_eq!(config.namespace(), "acme");
        assert_eq!(config.repo.name, "orders-repo");
        assert_eq!(config.service.name, "orders");
        assert_eq!(config.service.port, Some(8080));
        assert_eq!(config.service.pipeline.build.bucket, "acme-artifacts");
        assert_eq!(config.service.database.engine, "aurora-postgresql");
        assert_eq!(config.roles.cloud_formation, "arn:aws:iam::111111111111:role/cfn");

        let dev = config.environment("dev").unwrap();
        assert_eq!(dev.provider, EnvironmentProvider::Ecs);
        assert!(dev.vpc_target.is_none());

        let prod = config.environment("prod").unwrap();
        assert_eq!(prod.provider, EnvironmentProvider::Ec2);
        assert_eq!(prod.cluster.instance_type, "m5.large");
        assert_eq!(prod.cluster.max_size, Some(4));
        assert_eq!(prod.vpc_target.as_ref().unwrap().elb_subnet_ids.len(), 2);

        assert!(config.environment("staging").is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.namespace(), DEFAULT_NAMESPACE);
        assert!(config.service.name.is_empty());
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_templates_dir_relative_to_base_path() {
        let config = Config {
            templates_dir: Some(PathBuf::from("infra/templates")),
            base_path: Some(PathBuf::from("/work/project")),
            ..Default::default()
        };
        assert_eq!(
            config.templates_dir().unwrap(),
            PathBuf::from("/work/project/infra/templates")
        );

        let absolute = Config {
            templates_dir: Some(PathBuf::from("/opt/templates")),
            base_path: Some(PathBuf::from("/work/project")),
            ..Default::default()
        };
        assert_eq!(absolute.templates_dir().unwrap(), PathBuf::from("/opt/templates"));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result: std::result::Result<Config, _> =
            serde_yaml::from_str("environments:\n  - name: dev\n    provider: lambda\n");
        assert!(result.is_err());
    }
}
