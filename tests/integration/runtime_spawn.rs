use std::time::Duration;

use anyhow::Result;
use rmcp::{model::ClientInfo, serve_client};
use tokio::time::timeout;

use crate::common::{spawn_server_process, BINARY_PATH};

#[tokio::test]
async fn inspector_style_spawn_lists_tools() -> Result<()> {
    let (mut child, transport, stderr_task) = spawn_server_process(&[]).await?;

    let client = serve_client(ClientInfo::default(), transport).await?;
    let list = client.list_tools(None).await?;
    assert!(
        list.tools
            .iter()
            .any(|tool| tool.name.as_ref() == "describe_session"),
        "list_tools should include describe_session: {:?}",
        list.tools
    );

    client.cancel().await?;
    let status = timeout(Duration::from_secs(5), child.wait()).await??;
    assert!(
        status.success(),
        "server should exit cleanly but exit status was {status:?}"
    );
    if let Some(handle) = stderr_task {
        let _ = handle.await;
    }
    Ok(())
}

#[tokio::test]
async fn process_env_restricts_spawned_server() -> Result<()> {
    let (mut child, transport, stderr_task) =
        spawn_server_process(&[("MCP_READONLY_MODE", "1"), ("MCP_EXCLUDE_MODULES", "session")])
            .await?;

    let client = serve_client(ClientInfo::default(), transport).await?;
    let names: Vec<String> = client
        .list_all_tools()
        .await?
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    client.cancel().await?;
    let _ = timeout(Duration::from_secs(5), child.wait()).await;
    if let Some(handle) = stderr_task {
        let _ = handle.await;
    }

    assert_eq!(names, vec!["list_notes"]);
    Ok(())
}

#[tokio::test]
async fn missing_config_file_fails_startup() -> Result<()> {
    let output = tokio::process::Command::new(BINARY_PATH)
        .arg("--config")
        .arg("/nonexistent/mcp-extensions.toml")
        .stdin(std::process::Stdio::null())
        .output()
        .await?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read configuration file"),
        "stderr: {stderr}"
    );
    Ok(())
}

#[tokio::test]
async fn cli_call_reaches_spawned_stdio_server() -> Result<()> {
    let output = tokio::process::Command::new(BINARY_PATH)
        .args(["call", "--cmd", BINARY_PATH, "list_notes", "{}"])
        .env_remove("MCP_READONLY_MODE")
        .env_remove("MCP_EXCLUDE_TOOLS")
        .env_remove("MCP_INCLUDE_MODULES")
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let body: serde_json::Value = serde_json::from_str(stdout.trim())?;
    assert_eq!(body["count"], 0);
    Ok(())
}

#[tokio::test]
async fn cli_measure_reports_tool_count() -> Result<()> {
    let output = tokio::process::Command::new(BINARY_PATH)
        .args(["measure", "--cmd", BINARY_PATH, "--server-name", "demo"])
        .env_remove("MCP_READONLY_MODE")
        .env_remove("MCP_EXCLUDE_TOOLS")
        .env_remove("MCP_INCLUDE_MODULES")
        .env_remove("MCP_EXCLUDE_MODULES")
        .env_remove("MCP_NO_DESTRUCTIVE_TOOLS")
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("MCP tool list measurement for demo"), "stdout: {stdout}");
    assert!(stdout.contains("tools: 4"), "stdout: {stdout}");
    Ok(())
}
