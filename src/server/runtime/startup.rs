use std::{env, process::ExitCode};

use anyhow::{Context, Error};
use rmcp::{
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    },
    ServiceExt,
};
use tokio::net::TcpListener;

use crate::{
    cli::{LaunchProfile, TransportMode},
    lib::telemetry::{emit_runtime_mode, RuntimeModeTelemetry},
    server::{config::ServerConfig, runtime::McpServer},
};

/// Overrides the configured port for the HTTP transport.
pub const HTTP_PORT_ENV: &str = "MCP_HTTP_PORT";
/// Path the streamable HTTP service is mounted on.
pub const MCP_HTTP_PATH: &str = "/mcp";

/// Bundles a runtime error message with an exit code and optional structured error data.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
    error_data: Option<rmcp::model::ErrorData>,
}

impl RuntimeExit {
    pub fn structured(error: rmcp::model::ErrorData, exit_code: ExitCode) -> Self {
        Self {
            message: error.message.to_string(),
            exit_code,
            error_data: Some(error),
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
            error_data: None,
        }
    }

    pub fn report(self) -> ExitCode {
        if let Some(data) = self.error_data {
            if let Ok(serialized) = serde_json::to_string(&data) {
                eprintln!("{serialized}");
            } else {
                eprintln!("{}", data.message);
            }
        } else {
            eprintln!("{}", self.message);
        }
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn error_data(&self) -> Option<&rmcp::model::ErrorData> {
        self.error_data.as_ref()
    }
}

/// Port for the HTTP transport: `MCP_HTTP_PORT` when set and valid, else the configured one.
pub fn resolve_http_port(configured: u16, override_value: Option<&str>) -> Result<u16, Error> {
    match override_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .with_context(|| format!("{HTTP_PORT_ENV} must be a port number, got `{raw}`")),
        None => Ok(configured),
    }
}

/// Serve `server` over the transport selected by the launch profile.
pub async fn run_server(
    profile: LaunchProfile,
    config: ServerConfig,
    server: McpServer,
) -> Result<(), RuntimeExit> {
    let config_path = config
        .source_path
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());
    let bind_addr = match profile.transport {
        TransportMode::Stdio => None,
        TransportMode::Http => {
            let override_value = env::var(HTTP_PORT_ENV).ok();
            let port = resolve_http_port(config.server.port, override_value.as_deref())
                .map_err(RuntimeExit::from_error)?;
            Some(format!("{}:{}", config.server.host, port))
        }
    };

    emit_runtime_mode(&RuntimeModeTelemetry {
        server_name: server.name(),
        transport: profile.transport.as_str(),
        bind_addr: bind_addr.as_deref(),
        config_path: config_path.as_deref(),
        tool_count: server.tool_names().len(),
        filter_count: server.visibility().chain().len(),
        modules: server.modules(),
        launch_args: &profile.launch_args,
    });

    match bind_addr {
        None => run_stdio(server).await,
        Some(addr) => run_http(server, &addr).await,
    }
}

async fn run_stdio(server: McpServer) -> Result<(), RuntimeExit> {
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(RuntimeExit::from_error)?;
    running.waiting().await.map_err(RuntimeExit::from_error)?;
    Ok(())
}

async fn run_http(server: McpServer, addr: &str) -> Result<(), RuntimeExit> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service(MCP_HTTP_PATH, service);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP address {addr}"))
        .map_err(RuntimeExit::from_error)?;
    tracing::info!(
        target: "mcp_extensions::runtime",
        transport = "http",
        bind_addr = %addr,
        path = MCP_HTTP_PATH,
        "Started listening in HTTP mode"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .with_context(|| format!("HTTP server on {addr} failed"))
        .map_err(RuntimeExit::from_error)?;
    Ok(())
}
