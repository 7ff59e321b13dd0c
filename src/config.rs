//! Run configuration.
//!
//! Loaded from `<config dir>/paramsync/config.json` when present. Every field
//! has a default, so an empty object (or no file at all) is a valid config.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "paramsync";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root holding one folder per project, each with one folder per environment.
    pub environments_dir: PathBuf,
    /// Root for session logs, laid out as `{profile}/{project}/{environment}/`.
    pub logs_dir: PathBuf,
    /// Name of the key/value file inside each environment folder.
    pub env_file_name: String,
    /// AWS CLI executable.
    pub aws_cli: String,
    pub region: Option<String>,
    /// Store values as SecureString rather than String.
    pub secure: bool,
    /// KMS key for SecureString values. Ignored when `secure` is false.
    pub kms_key_id: Option<String>,
    /// Description attached to every parameter. `{project}` and `{environment}`
    /// are substituted.
    pub description_template: String,
    /// Tags added after the `Project` and `Environment` tags.
    pub tags: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environments_dir: PathBuf::from("environments"),
            logs_dir: PathBuf::from("logs"),
            env_file_name: ".env".to_string(),
            aws_cli: "aws".to_string(),
            region: None,
            secure: true,
            kms_key_id: Some("alias/aws/ssm".to_string()),
            description_template: "Parameters for {project} in {environment}".to_string(),
            tags: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from the user's config directory.
    /// Returns default config if file doesn't exist or fails to parse.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load from an explicit path. Unlike [`Config::load`], errors are returned.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    pub fn description_for(&self, project: &str, environment: &str) -> String {
        self.description_template
            .replace("{project}", project)
            .replace("{environment}", environment)
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.environments_dir.join(project)
    }

    pub fn env_file_path(&self, project: &str, environment: &str) -> PathBuf {
        self.project_dir(project)
            .join(environment)
            .join(&self.env_file_name)
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

/// Parse a `KEY=VALUE` tag given on the command line.
pub fn parse_tag(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
