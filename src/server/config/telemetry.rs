use tracing::info;

use super::ServerConfig;

pub fn log_loaded(config: &ServerConfig) {
    info!(
        target: "mcp_extensions::config",
        path = %config
            .source_path
            .as_deref()
            .map_or_else(|| "<defaults>".into(), |p| p.display().to_string()),
        name = %config.server.name,
        host = %config.server.host,
        port = config.server.port,
        readonly_mode = config.tool_filters.readonly_mode,
        no_destructive_tools = config.tool_filters.no_destructive_tools,
        include_modules = config.tool_filters.include_modules.len(),
        exclude_modules = config.tool_filters.exclude_modules.len(),
        exclude_tools = config.tool_filters.exclude_tools.len(),
        advertised = config.info.advertised.len(),
        "Configuration loaded"
    );
}
