pub mod error;
pub mod model;

pub use error::*;
pub use model::*;

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing directly at a configuration file
pub const CONFIG_PATH_ENV: &str = "STACKFLOW_CONFIG_PATH";

/// Environment variable overriding the configured namespace
pub const NAMESPACE_ENV: &str = "STACKFLOW_NAMESPACE";

const CANDIDATES: [&str; 3] = ["stackflow.local.yml", "stackflow.yml", ".stackflow.yml"];

/// Locate the project's stackflow.yml
///
/// Search order:
/// 1. `STACKFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: stackflow.local.yml, stackflow.yml, .stackflow.yml
/// 3. `./.stackflow/` with the same names
/// 4. `~/.config/stackflow/stackflow.yml` (global config)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".stackflow");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("stackflow").join("stackflow.yml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Read and parse a configuration file
///
/// An empty `repo.name` defaults to the name of the directory holding the
/// file, and `STACKFLOW_NAMESPACE` overrides `namespace`.
#[tracing::instrument]
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut config = parse_config(&content).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    let base_path = path
        .canonicalize()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| path.parent().map(Path::to_path_buf));

    if config.repo.name.is_empty()
        && let Some(dir_name) = base_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    {
        debug!(repo = %dir_name, "Defaulting repo name to project directory");
        config.repo.name = dir_name;
    }
    config.base_path = base_path;

    apply_env_overrides(&mut config);

    info!(
        path = %path.display(),
        namespace = %config.namespace(),
        environments = config.environments.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Locate and load the project configuration
pub fn load() -> Result<Config> {
    let path = find_config_file()?;
    load_config(&path)
}

fn parse_config(content: &str) -> std::result::Result<Config, String> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|e| e.to_string())
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(namespace) = std::env::var(NAMESPACE_ENV)
        && !namespace.is_empty()
    {
        debug!(namespace = %namespace, "Namespace overridden from environment");
        config.namespace = namespace;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stackflow.yml"), "namespace: test").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("stackflow.yml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stackflow.yml"), "# shared").unwrap();
        fs::write(temp_dir.path().join("stackflow.local.yml"), "# local").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("stackflow.local.yml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let project_dir = temp_dir.path().join(".stackflow");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("stackflow.yml"), "# nested").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with(".stackflow/stackflow.yml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yml");
        fs::write(&config_path, "# custom").unwrap();

        let result = temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), find_config_file);
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_load_config_defaults_repo_name_to_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("orders-repo");
        fs::create_dir(&project).unwrap();
        let path = project.join("stackflow.yml");
        fs::write(&path, "service:\n  pipeline:\n    build:\n      bucket: b\n").unwrap();

        let config = temp_env::with_var_unset(NAMESPACE_ENV, || load_config(&path)).unwrap();

        assert_eq!(config.repo.name, "orders-repo");
        assert_eq!(config.service.pipeline.build.bucket, "b");
        assert!(config.base_path.unwrap().ends_with("orders-repo"));
    }

    #[test]
    #[serial]
    fn test_load_config_keeps_explicit_repo_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yml");
        fs::write(&path, "repo:\n  name: explicit\n").unwrap();

        let config = temp_env::with_var_unset(NAMESPACE_ENV, || load_config(&path)).unwrap();
        assert_eq!(config.repo.name, "explicit");
    }

    #[test]
    #[serial]
    fn test_namespace_env_override() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yml");
        fs::write(&path, "namespace: from-file\n").unwrap();

        let config =
            temp_env::with_var(NAMESPACE_ENV, Some("from-env"), || load_config(&path)).unwrap();
        assert_eq!(config.namespace(), "from-env");
    }

    #[test]
    fn test_load_config_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yml");
        fs::write(&path, "").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.service.name.is_empty());
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yml");
        fs::write(&path, "service: [unclosed").unwrap();

        match load_config(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/stackflow.yml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
