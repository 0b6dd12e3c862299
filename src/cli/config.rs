// ABOUTME: Configuration management for the flowbook CLI
// ABOUTME: Loads logging settings and default context variables from YAML and the environment

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Variables placed in every run's context before playbook vars are seeded
    #[serde(default)]
    pub vars: HashMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
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
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)?
        } else {
            Config::default()
        };

        config.merge_env();
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("flowbook.yaml"),
            PathBuf::from("flowbook.yml"),
            PathBuf::from(".flowbook.yaml"),
            PathBuf::from(".flowbook.yml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".flowbook").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default path (may not exist)
        PathBuf::from("flowbook.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) {
        if let Ok(level) = std::env::var("FLOWBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FLOWBOOK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Merge additional variables, overriding configured ones
    pub fn merge_variables(&mut self, vars: HashMap<String, String>) {
        self.vars.extend(vars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("flowbook.yaml");
        fs::write(
            &config_path,
            "vars:\n  env: staging\nlogging:\n  level: debug\n  format: compact\n",
        )
        .unwrap();

        let config = Config::load(Some(config_path)).unwrap();

        assert_eq!(config.vars.get("env"), Some(&"staging".to_string()));
        if std::env::var("FLOWBOOK_LOG_LEVEL").is_err() {
            assert_eq!(config.logging.level, "debug");
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load(Some(temp_dir.path().join("absent.yaml"))).unwrap();

        assert!(config.vars.is_empty());
        if std::env::var("FLOWBOOK_LOG_FORMAT").is_err() {
            assert_eq!(config.logging.format, "pretty");
        }
    }

    #[test]
    fn test_merge_variables_overrides() {
        let mut config = Config::default();
        config.vars.insert("env".to_string(), "staging".to_string());

        let mut overrides = HashMap::new();
        overrides.insert("env".to_string(), "prod".to_string());
        config.merge_variables(overrides);

        assert_eq!(config.vars.get("env"), Some(&"prod".to_string()));
    }
}
