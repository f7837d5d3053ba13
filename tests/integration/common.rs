use std::process::Stdio;

use anyhow::{Context, Result};
use mcp_extensions::{
    cli::ChildIoBridge,
    server::{config::ServerConfig, resolver::EnvView, runtime::McpServer},
    tools,
};
use rmcp::{
    model::{CallToolRequestParam, ClientInfo},
    serve_client,
    service::{RunningService, ServiceError},
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
    task::JoinHandle,
};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_mcp-extensions");

pub type TestClient = RunningService<RoleClient, ClientInfo>;

/// Demo server whose env-var tier only sees `env`.
pub fn demo_server(config: &ServerConfig, env: &[(&str, &str)]) -> Result<McpServer> {
    let env = EnvView::fixed(env.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Ok(tools::build_demo_server(config, env)?)
}

/// Serve `server` over an in-process duplex pipe and connect a client to it.
pub async fn connect_in_process(
    server: McpServer,
) -> Result<(TestClient, JoinHandle<Result<()>>)> {
    let (server_transport, client_transport) = tokio::io::duplex(4096);
    let server_task = tokio::spawn(async move {
        server.serve(server_transport).await?.waiting().await?;
        Result::<_, anyhow::Error>::Ok(())
    });
    let client = serve_client(ClientInfo::default(), client_transport).await?;
    Ok((client, server_task))
}

pub async fn shutdown(client: TestClient, server_task: JoinHandle<Result<()>>) {
    let _ = client.cancel().await;
    let _ = server_task.await;
}

pub async fn tool_names(client: &TestClient) -> Result<Vec<String>> {
    let mut names: Vec<String> = client
        .list_all_tools()
        .await?
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    names.sort();
    Ok(names)
}

pub async fn call(
    client: &TestClient,
    tool: &str,
    arguments: Value,
) -> Result<rmcp::model::CallToolResult, ServiceError> {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    client
        .call_tool(CallToolRequestParam {
            name: tool.to_string().into(),
            arguments: Some(arguments),
        })
        .await
}

/// First text part of a tool result parsed as JSON.
pub fn text_json(result: &rmcp::model::CallToolResult) -> Value {
    let rendered = mcp_extensions::cli::render_call_result(result).expect("renderable result");
    serde_json::from_str(&rendered).expect("tool output should be JSON")
}

pub fn error_code(error: &ServiceError) -> Option<String> {
    match error {
        ServiceError::McpError(inner) => inner
            .data
            .as_ref()
            .and_then(|data| data.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Spawn the binary in stdio mode with extra env vars.
pub async fn spawn_server_process(
    envs: &[(&str, &str)],
) -> Result<(Child, ChildIoBridge, Option<JoinHandle<()>>)> {
    let mut command = Command::new(BINARY_PATH);
    command
        .env_remove("MCP_CONFIG_PATH")
        .env_remove("MCP_READONLY_MODE")
        .env_remove("MCP_NO_DESTRUCTIVE_TOOLS")
        .env_remove("MCP_INCLUDE_MODULES")
        .env_remove("MCP_EXCLUDE_MODULES")
        .env_remove("MCP_EXCLUDE_TOOLS")
        .env_remove("DEMO_API_KEY")
        .envs(envs.iter().copied())
        .stdout(Stdio::piped())
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let mut child = command.spawn().context("failed to spawn server process")?;
    let stdout = child.stdout.take().context("child stdout")?;
    let stdin = child.stdin.take().context("child stdin")?;
    let bridge = ChildIoBridge::new(stdout, stdin);
    let stderr_handle = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
        })
    });
    Ok((child, bridge, stderr_handle))
}
