//! Telemetry initialization and runtime logging helpers.

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize `tracing` and format developer logs on stderr.
///
/// stdout stays reserved for the stdio transport.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Payload for logging MCP runtime state as structured telemetry.
#[derive(Debug, Serialize)]
pub struct RuntimeModeTelemetry<'a> {
    pub server_name: &'a str,
    pub transport: &'a str,
    pub bind_addr: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub tool_count: usize,
    pub filter_count: usize,
    pub modules: &'a [String],
    pub launch_args: &'a [String],
}

/// Emit runtime mode to `tracing`.
pub fn emit_runtime_mode(telemetry: &RuntimeModeTelemetry<'_>) {
    info!(
        target: "mcp_extensions::runtime",
        server_name = telemetry.server_name,
        transport = telemetry.transport,
        bind_addr = telemetry.bind_addr.unwrap_or(""),
        config_path = telemetry.config_path.unwrap_or("<defaults>"),
        tool_count = telemetry.tool_count,
        filter_count = telemetry.filter_count,
        modules = ?telemetry.modules,
        launch_args = ?telemetry.launch_args,
        "Started MCP server"
    );
}
