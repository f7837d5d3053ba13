//! Client side of the developer commands: spawn or connect, list, call, measure.
use std::{io, net::TcpListener as StdTcpListener, pin::Pin, process::Stdio, time::Duration};

use anyhow::{anyhow, Context, Result};
use rmcp::{
    model::{CallToolRequestParam, CallToolResult, ClientInfo, Tool},
    serve_client,
    service::RunningService,
    transport::StreamableHttpClientTransport,
    RoleClient,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    process::{Child, ChildStdin, ChildStdout, Command},
    time::{sleep, timeout, Instant},
};
use tracing::{debug, warn};

use crate::server::runtime::{HTTP_PORT_ENV, MCP_HTTP_PATH};

pub const SERVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
pub const SERVER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub type McpClient = RunningService<RoleClient, ClientInfo>;

/// Joins a child's stdout and stdin into one duplex stream for the stdio transport.
pub struct ChildIoBridge {
    stdout: ChildStdout,
    stdin: ChildStdin,
}

impl ChildIoBridge {
    pub fn new(stdout: ChildStdout, stdin: ChildStdin) -> Self {
        Self { stdout, stdin }
    }
}

impl AsyncRead for ChildIoBridge {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

impl AsyncWrite for ChildIoBridge {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        data: &[u8],
    ) -> std::task::Poll<io::Result<usize>> {
        Pin::new(&mut self.stdin).poll_write(cx, data)
    }

    fn poll_flush(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        Pin::new(&mut self.stdin).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        Pin::new(&mut self.stdin).poll_shutdown(cx)
    }
}

/// Split a `--cmd` value into program and arguments using POSIX shell quoting.
pub fn split_command(cmd: &str) -> Result<(String, Vec<String>)> {
    let parts = shlex::split(cmd)
        .ok_or_else(|| anyhow!("server command has unbalanced quotes: {cmd}"))?;
    let mut parts = parts.into_iter();
    let program = parts.next().ok_or_else(|| anyhow!("server command is empty"))?;
    Ok((program, parts.collect()))
}

fn server_command(cmd: &str) -> Result<Command> {
    let (program, args) = split_command(cmd)?;
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    Ok(command)
}

/// Spawn `cmd` and connect to it over stdio.
pub async fn connect_stdio(cmd: &str) -> Result<(McpClient, Child)> {
    let mut command = server_command(cmd)?;
    command
        .stdout(Stdio::piped())
        .stdin(Stdio::piped())
        .stderr(Stdio::null());
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn server command `{cmd}`"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("server stdout was not captured"))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("server stdin was not captured"))?;
    let client = serve_client(ClientInfo::default(), ChildIoBridge::new(stdout, stdin))
        .await
        .context("MCP initialization over stdio failed")?;
    Ok((client, child))
}

/// Connect to a running streamable HTTP server.
pub async fn connect_http(url: &str) -> Result<McpClient> {
    let transport = StreamableHttpClientTransport::from_uri(url.to_string());
    serve_client(ClientInfo::default(), transport)
        .await
        .with_context(|| format!("MCP initialization against {url} failed"))
}

/// Ask the OS for a free localhost port.
pub fn find_free_port() -> Result<u16> {
    let listener = StdTcpListener::bind(("127.0.0.1", 0)).context("failed to bind a probe port")?;
    Ok(listener.local_addr()?.port())
}

pub fn local_mcp_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}{MCP_HTTP_PATH}")
}

/// Poll `url` until `tools/list` succeeds or `startup_timeout` elapses.
pub async fn wait_for_server(
    url: &str,
    startup_timeout: Duration,
) -> Result<(McpClient, Vec<Tool>)> {
    let deadline = Instant::now() + startup_timeout;
    loop {
        let attempt = async {
            let client = connect_http(url).await?;
            let tools = client.list_all_tools().await?;
            anyhow::Ok((client, tools))
        };
        match attempt.await {
            Ok(ready) => return Ok(ready),
            Err(err) if Instant::now() + POLL_INTERVAL < deadline => {
                debug!(target: "mcp_extensions::runtime", url, error = %err, "Server not ready yet");
                sleep(POLL_INTERVAL).await;
            }
            Err(err) => {
                return Err(err.context(format!(
                    "server at {url} did not become ready within {}s",
                    startup_timeout.as_secs()
                )))
            }
        }
    }
}

/// An HTTP server child process that is killed when dropped.
pub struct SpawnedHttpServer {
    pub child: Child,
    pub port: u16,
}

impl SpawnedHttpServer {
    pub fn spawn(cmd: &str, port: u16) -> Result<Self> {
        let mut command = server_command(cmd)?;
        command
            .env(HTTP_PORT_ENV, port.to_string())
            .stdout(Stdio::null())
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        let child = command
            .spawn()
            .with_context(|| format!("failed to spawn server command `{cmd}`"))?;
        Ok(Self { child, port })
    }

    pub fn url(&self) -> String {
        local_mcp_url(self.port)
    }

    /// Kill the server and wait for it, bounded by `SERVER_SHUTDOWN_TIMEOUT`.
    pub async fn terminate(mut self) {
        if let Err(err) = self.child.start_kill() {
            warn!(target: "mcp_extensions::runtime", error = %err, "Failed to signal server process");
            return;
        }
        if timeout(SERVER_SHUTDOWN_TIMEOUT, self.child.wait()).await.is_err() {
            warn!(target: "mcp_extensions::runtime", port = self.port, "Server process did not exit in time");
        }
    }
}

pub async fn call_tool(
    client: &McpClient,
    tool: &str,
    arguments: Map<String, Value>,
) -> Result<CallToolResult> {
    client
        .call_tool(CallToolRequestParam {
            name: tool.to_string().into(),
            arguments: Some(arguments),
        })
        .await
        .with_context(|| format!("tool `{tool}` failed"))
}

/// Text parts of a tool result, one per line; non-text parts as JSON.
pub fn render_call_result(result: &CallToolResult) -> Result<String> {
    let value = serde_json::to_value(result)?;
    let parts: Vec<String> = value
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| match item.get("text").and_then(Value::as_str) {
                    Some(text) => text.to_string(),
                    None => item.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    let mut rendered = parts.join("\n");
    if value.get("isError").and_then(Value::as_bool) == Some(true) {
        rendered = format!("tool reported an error:\n{rendered}");
    }
    Ok(rendered)
}

/// Size of one tool's listing entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolSize {
    pub name: String,
    pub name_chars: usize,
    pub description_chars: usize,
    pub schema_chars: usize,
    pub total_chars: usize,
}

/// Aggregate size of a tool listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolListMeasurement {
    pub tool_count: usize,
    pub total_chars: usize,
    pub average_chars: usize,
    pub tools: Vec<ToolSize>,
}

impl ToolListMeasurement {
    pub fn measure(tools: &[Tool]) -> Result<Self> {
        let mut sizes = Vec::with_capacity(tools.len());
        for tool in tools {
            let value = serde_json::to_value(tool)?;
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let description_chars = value
                .get("description")
                .and_then(Value::as_str)
                .map_or(0, |d| d.chars().count());
            let schema_chars = value
                .get("inputSchema")
                .map_or(Ok(0), |schema| serde_json::to_string(schema).map(|s| s.chars().count()))?;
            let name_chars = name.chars().count();
            sizes.push(ToolSize {
                total_chars: name_chars + description_chars + schema_chars,
                name,
                name_chars,
                description_chars,
                schema_chars,
            });
        }
        let total_chars: usize = sizes.iter().map(|s| s.total_chars).sum();
        let average_chars = total_chars.checked_div(sizes.len()).unwrap_or(0);
        Ok(Self {
            tool_count: sizes.len(),
            total_chars,
            average_chars,
            tools: sizes,
        })
    }

    pub fn report(&self, server_name: &str, details: bool) -> Result<String> {
        let mut lines = vec![
            format!("MCP tool list measurement for {server_name}"),
            format!("  tools: {}", self.tool_count),
            format!("  total characters: {}", self.total_chars),
            format!("  average per tool: {}", self.average_chars),
        ];
        if details {
            lines.push(serde_json::to_string_pretty(&self.tools)?);
        }
        Ok(lines.join("\n"))
    }
}
