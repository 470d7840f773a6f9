// ABOUTME: Configuration management for the reportsmith application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::reporting::RenderingConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub rendering: RenderingConfig,

    /// Variables exposed to every report under `vars`
    #[serde(default)]
    pub template_vars: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Configuration file not found: {}", p.display());
                }
                Some(p)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(config_path) => {
                let contents = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                Self::from_yaml(&contents)
                    .with_context(|| format!("Invalid configuration in {}", config_path.display()))?
            }
            None => Config::default(),
        };

        config.merge_env()?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let possible_paths = [
            PathBuf::from("reportsmith.yaml"),
            PathBuf::from("reportsmith.yml"),
            PathBuf::from(".reportsmith.yaml"),
        ];

        if let Some(path) = possible_paths.into_iter().find(|p| p.exists()) {
            return Some(path);
        }

        dirs::home_dir()
            .map(|home| home.join(".reportsmith").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(level) = var("REPORTSMITH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("REPORTSMITH_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(depth) = var("REPORTSMITH_MAX_DEPTH") {
            self.rendering.max_partial_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("REPORTSMITH_MAX_DEPTH must be a number, got '{}'", depth))?;
        }
        if let Some(dirs) = var("REPORTSMITH_PARTIALS_DIR") {
            self.rendering
                .partial_dirs
                .extend(std::env::split_paths(&dirs).filter(|p| !p.as_os_str().is_empty()));
        }
        Ok(())
    }

    /// Merge additional variables into template variables
    pub fn merge_variables(&mut self, vars: HashMap<String, String>) {
        self.template_vars.extend(vars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DEFAULT_MAX_DEPTH;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.rendering.max_partial_depth, DEFAULT_MAX_DEPTH);
        assert!(config.template_vars.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("reportsmith.yaml");
        std::fs::write(
            &config_path,
            r#"
logging:
  level: debug
  format: compact
rendering:
  partial_dirs: [./partials]
  max_partial_depth: 10
template_vars:
  org: Acme
"#,
        )
        .unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.rendering.partial_dirs, vec![PathBuf::from("./partials")]);
        assert_eq!(config.template_vars.get("org"), Some(&"Acme".to_string()));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = tempdir().unwrap();
        assert!(Config::load(Some(temp_dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(|key| match key {
                "REPORTSMITH_LOG_LEVEL" => Some("trace".to_string()),
                "REPORTSMITH_MAX_DEPTH" => Some(" 5 ".to_string()),
                "REPORTSMITH_PARTIALS_DIR" => Some("shared".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.rendering.max_partial_depth, 5);
        assert_eq!(config.rendering.partial_dirs, vec![PathBuf::from("shared")]);
    }

    #[test]
    fn test_bad_depth_env_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == "REPORTSMITH_MAX_DEPTH").then(|| "deep".to_string())
        });
        assert!(result.is_err());
    }
}
