use std::fs;
use std::path::Path;
use std::time::Duration;

use humantime::parse_duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{HostError, Result};

pub const DEFAULT_COMMAND: &str = "minikube docker-env";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for the minikube extension, as written in YAML:
///
/// ```yaml
/// command: minikube -p dev docker-env
/// timeout: 10s
/// kill_on_timeout: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionConfig {
    pub command: String,
    pub timeout: String,
    /// Kill the command when it outlives `timeout`. Off by default: the
    /// command is left running and only its output is abandoned.
    pub kill_on_timeout: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            timeout: "5s".to_string(),
            kill_on_timeout: false,
        }
    }
}

impl ExtensionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| HostError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            ParseFailure::Yaml(source) => HostError::ConfigParse {
                path: path.display().to_string(),
                source,
            },
            ParseFailure::Invalid(e) => e,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, ParseFailure> {
        let config: ExtensionConfig = if content.trim().is_empty() {
            ExtensionConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(ParseFailure::Yaml)?
        };
        config.validate().map_err(ParseFailure::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(HostError::Config("command must not be empty".to_string()));
        }
        self.timeout_duration()?;
        Ok(())
    }

    pub fn timeout_duration(&self) -> Result<Duration> {
        parse_duration(&self.timeout).map_err(|e| {
            HostError::Config(format!("Invalid timeout duration '{}': {}", self.timeout, e))
        })
    }
}

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("Invalid YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),

    #[error(transparent)]
    Invalid(HostError),
}
