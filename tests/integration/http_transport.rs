use anyhow::Result;
use mcp_extensions::cli::{
    client::call_tool, find_free_port, render_call_result, wait_for_server, SpawnedHttpServer,
    SERVER_STARTUP_TIMEOUT,
};
use serde_json::Map;

use crate::common::BINARY_PATH;

#[tokio::test]
async fn http_server_comes_up_on_the_requested_port() -> Result<()> {
    let port = find_free_port()?;
    let cmd = format!("{BINARY_PATH} --transport http");
    let server = SpawnedHttpServer::spawn(&cmd, port)?;

    let outcome = async {
        let (client, tools) = wait_for_server(&server.url(), SERVER_STARTUP_TIMEOUT).await?;
        let result = call_tool(&client, "list_notes", Map::new()).await;
        let _ = client.cancel().await;
        anyhow::Ok((tools.len(), render_call_result(&result?)?))
    }
    .await;
    server.terminate().await;

    let (count, rendered) = outcome?;
    assert!(count >= 2, "expected demo tools, got {count}");
    assert!(rendered.contains("\"count\""), "output: {rendered}");
    Ok(())
}

#[tokio::test]
async fn cli_http_smoke_test_prints_tool_count() -> Result<()> {
    let cmd = format!("{BINARY_PATH} --transport http");
    let output = tokio::process::Command::new(BINARY_PATH)
        .args(["call", "--http", "--cmd", &cmd])
        .env_remove("MCP_READONLY_MODE")
        .env_remove("MCP_EXCLUDE_TOOLS")
        .env_remove("MCP_INCLUDE_MODULES")
        .env_remove("MCP_EXCLUDE_MODULES")
        .env_remove("MCP_NO_DESTRUCTIVE_TOOLS")
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(
        stdout.contains("HTTP transport OK - 4 tools available"),
        "stdout: {stdout}"
    );
    Ok(())
}
