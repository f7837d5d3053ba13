//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

use super::{build_launch_args, resolve_config_path, LaunchProfile, TransportMode};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    RunServer(LaunchProfile),
    Cli(CliCommand),
}

/// Client-side developer commands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Call one tool on a server and print its text output.
    #[command(about = "Call a tool on an MCP server (stdio or HTTP)")]
    Call(CallArgs),
    /// Print the tools a server lists for this session.
    #[command(about = "List the tools an MCP server exposes")]
    List(ServerTarget),
    /// Report how large a server's tool list is.
    #[command(about = "Measure the size of an MCP server's tool list")]
    Measure(MeasureArgs),
}

/// Which server a client command talks to.
#[derive(Debug, Clone, Args)]
pub struct ServerTarget {
    /// Server command to spawn, split with shell quoting (e.g. `mcp-extensions --transport stdio`).
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub cmd: Option<String>,
    /// URL of a running streamable HTTP server (e.g. `http://127.0.0.1:8787/mcp`).
    #[arg(long)]
    pub url: Option<String>,
}

/// Arguments for `call`.
#[derive(Debug, Clone, Args)]
#[command(
    after_help = "Hint: `call --http --cmd '<server command>'` without a tool name only checks that the HTTP transport comes up."
)]
pub struct CallArgs {
    #[command(flatten)]
    pub target: ServerTarget,
    /// Spawn `--cmd` as an HTTP server on a free port (passed as MCP_HTTP_PORT).
    #[arg(long, default_value_t = false, requires = "cmd")]
    pub http: bool,
    /// Tool name.
    pub tool: Option<String>,
    /// Tool arguments as a JSON object.
    pub args: Option<String>,
}

/// Arguments for `measure`.
#[derive(Debug, Clone, Args)]
pub struct MeasureArgs {
    #[command(flatten)]
    pub target: ServerTarget,
    /// Label printed in the report.
    #[arg(long)]
    pub server_name: Option<String>,
    /// Print a per-tool JSON breakdown.
    #[arg(long, default_value_t = false)]
    pub details: bool,
}

impl CallArgs {
    /// Parse the JSON argument string; absent means `{}`.
    pub fn arguments(&self) -> Result<Map<String, Value>> {
        parse_tool_arguments(self.args.as_deref())
    }
}

pub fn parse_tool_arguments(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(anyhow!("tool arguments must be a JSON object")),
        Err(err) => Err(anyhow!("tool arguments are not valid JSON: {err}")),
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mcp-extensions",
    author,
    version,
    about = "MCP server extensions demo server and client tooling",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Select stdio (default) or http.
    #[arg(long, value_enum, default_value_t = TransportMode::Stdio)]
    pub transport: TransportMode,
    /// Path to config.toml (overrides MCP_CONFIG_PATH).
    #[arg(long = "config")]
    pub config_override: Option<PathBuf>,
    /// Optional CLI command mode.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchProfileArgs {
    /// Build a `LaunchProfile` from CLI args and environment variables.
    pub fn build(self) -> Result<LaunchProfile> {
        let config_path = resolve_config_path(self.config_override)?;
        let launch_args = build_launch_args(self.transport, config_path.as_deref());

        Ok(LaunchProfile {
            config_path,
            transport: self.transport,
            launch_args,
        })
    }

    /// Parse CLI args into either server launch mode or utility command mode.
    pub fn into_command(self) -> Result<ParsedCommand> {
        match self.command {
            Some(command) => {
                validate_command(&command)?;
                Ok(ParsedCommand::Cli(command))
            }
            None => Ok(ParsedCommand::RunServer(self.build()?)),
        }
    }
}

fn validate_command(command: &CliCommand) -> Result<()> {
    match command {
        CliCommand::Call(args) => {
            if !args.http && args.tool.is_none() {
                return Err(anyhow!("a tool name is required unless --http is given"));
            }
            if args.tool.is_none() && args.args.is_some() {
                return Err(anyhow!("tool arguments given without a tool name"));
            }
            args.arguments()?;
            validate_target(&args.target)
        }
        CliCommand::List(target) => validate_target(target),
        CliCommand::Measure(args) => validate_target(&args.target),
    }
}

fn validate_target(target: &ServerTarget) -> Result<()> {
    if let Some(cmd) = &target.cmd {
        if cmd.split_whitespace().next().is_none() {
            return Err(anyhow!("--cmd must not be empty"));
        }
        if shlex::split(cmd).is_none() {
            return Err(anyhow!("--cmd has unbalanced quotes"));
        }
    }
    if let Some(url) = &target.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("--url must be an http:// or https:// URL"));
        }
    }
    Ok(())
}
