use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::Colorize;

use crate::{config::ExtensionConfig, errors::Result, session::Properties};

#[derive(Parser, Debug)]
#[command(name = "minikube-env")]
#[command(version)]
#[command(about = "Inject `minikube docker-env` exports into build properties", long_about = None)]
pub struct Args {
    /// YAML file with extension settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Command to run instead of `minikube docker-env`
    #[arg(long)]
    pub command: Option<String>,

    /// How long to wait for the command, e.g. 5s or 500ms
    #[arg(long)]
    pub timeout: Option<String>,

    /// Kill the command if it is still running when the timeout expires
    #[arg(long)]
    pub kill_on_timeout: bool,

    /// How to print the resulting properties
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Shell)]
    pub format: OutputFormat,

    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show warnings
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `export KEY="VALUE"` lines, escaped for double quotes
    Shell,
    /// `KEY=VALUE` lines
    Properties,
    /// A single JSON object
    Json,
}

impl Args {
    /// Config file values with command-line overrides applied on top.
    pub fn resolve_config(&self) -> Result<ExtensionConfig> {
        let mut config = match &self.config {
            Some(path) => ExtensionConfig::load(path)?,
            None => ExtensionConfig::default(),
        };
        if let Some(command) = &self.command {
            config.command = command.clone();
        }
        if let Some(timeout) = &self.timeout {
            config.timeout = timeout.clone();
        }
        if self.kill_on_timeout {
            config.kill_on_timeout = true;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "minikube_env=debug"
        } else if self.quiet {
            "minikube_env=warn"
        } else {
            "minikube_env=info"
        }
    }
}

pub fn render(props: &Properties, format: OutputFormat) -> String {
    match format {
        OutputFormat::Shell => props
            .iter()
            .map(|(k, v)| format!("export {}=\"{}\"\n", k, shell_escape(v)))
            .collect(),
        OutputFormat::Properties => props
            .iter()
            .map(|(k, v)| format!("{}={}\n", k.green(), v))
            .collect(),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(props.as_map()).unwrap_or_default();
            out.push('\n');
            out
        }
    }
}

/// Escapes the characters that stay special inside double quotes.
fn shell_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
