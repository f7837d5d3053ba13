//! LaunchProfile and config path resolution.
use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::debug;

pub const MCP_CONFIG_ENV: &str = "MCP_CONFIG_PATH";

/// MCP transport mode.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
}

impl TransportMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Stdio => "stdio",
            TransportMode::Http => "http",
        }
    }
}

/// Resolved launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    /// `None` runs on built-in defaults.
    pub config_path: Option<PathBuf>,
    pub transport: TransportMode,
    pub launch_args: Vec<String>,
}

/// Resolve the config path in the order: CLI override → env var → none.
pub fn resolve_config_path(override_path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let env_path = env::var_os(MCP_CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    let Some(path) = override_path.or(env_path) else {
        debug!(
            target: "mcp_extensions::config",
            env = MCP_CONFIG_ENV,
            "No config file given; using built-in defaults"
        );
        return Ok(None);
    };

    if path.is_absolute() {
        return Ok(Some(path));
    }

    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok(Some(cwd.join(path)))
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(transport: TransportMode, config: Option<&Path>) -> Vec<String> {
    let mut args = vec![format!("--transport={}", transport.as_str())];
    if let Some(config) = config {
        args.push(format!("--config={}", config.display()));
    }
    args
}
