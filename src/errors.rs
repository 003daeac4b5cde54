use std::io;
use std::time::Duration;

use thiserror::Error;

/// Ways fetching the docker env can fail. None of these reach the build
/// lifecycle: the extension logs them and carries on with an empty map.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Failed to get docker env from running {command} due to {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Timeout when running {command}")]
    Timeout { command: String, waited: Duration },

    #[error("Interrupted when running {command}")]
    WaitInterrupted { command: String },

    #[error("the command [{command}] exit with code: {code}")]
    NonZeroExit { command: String, code: i32 },

    #[error("Failed to read output from running {command} due to {source}")]
    OutputRead {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl EnvError {
    pub fn command(&self) -> &str {
        match self {
            EnvError::Spawn { command, .. }
            | EnvError::Timeout { command, .. }
            | EnvError::WaitInterrupted { command }
            | EnvError::NonZeroExit { command, .. }
            | EnvError::OutputRead { command, .. } => command,
        }
    }
}

/// Errors raised by the host side: loading configuration, driving hooks.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Participant '{name}' failed during {hook}: {message}")]
    Participant {
        name: String,
        hook: &'static str,
        message: String,
    },
}

pub type Result<T, E = HostError> = std::result::Result<T, E>;
