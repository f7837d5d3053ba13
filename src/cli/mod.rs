//! CLI entrypoint module structure.
use anyhow::{anyhow, Result};
use rmcp::model::Tool;

pub mod args;
pub mod client;
pub mod profile;

pub use args::{
    parse_tool_arguments, CallArgs, CliCommand, LaunchProfileArgs, MeasureArgs, ParsedCommand,
    ServerTarget,
};
pub use client::{
    find_free_port, render_call_result, wait_for_server, ChildIoBridge, SpawnedHttpServer,
    ToolListMeasurement, SERVER_STARTUP_TIMEOUT,
};
pub use profile::{build_launch_args, resolve_config_path, LaunchProfile, TransportMode};

/// Execute a client command and return the text to print on stdout.
pub async fn execute_cli_command(command: CliCommand) -> Result<String> {
    match command {
        CliCommand::Call(args) if args.http => call_over_spawned_http(args).await,
        CliCommand::Call(args) => {
            let tool = args
                .tool
                .clone()
                .ok_or_else(|| anyhow!("a tool name is required"))?;
            let arguments = args.arguments()?;
            with_client(&args.target, |session| async move {
                let result = client::call_tool(&session, &tool, arguments).await;
                (session, result.and_then(|result| render_call_result(&result)))
            })
            .await
        }
        CliCommand::List(target) => {
            let tools = list_tools(&target).await?;
            Ok(tools
                .iter()
                .map(|tool| tool.name.to_string())
                .collect::<Vec<_>>()
                .join("\n"))
        }
        CliCommand::Measure(args) => {
            let tools = list_tools(&args.target).await?;
            let label = args
                .server_name
                .clone()
                .or_else(|| args.target.url.clone())
                .or_else(|| args.target.cmd.clone())
                .unwrap_or_else(|| "server".to_string());
            ToolListMeasurement::measure(&tools)?.report(&label, args.details)
        }
    }
}

async fn list_tools(target: &ServerTarget) -> Result<Vec<Tool>> {
    with_client(target, |session| async move {
        let tools = session.list_all_tools().await.map_err(anyhow::Error::from);
        (session, tools)
    })
    .await
}

/// Connect to `target`, run `body`, then shut the session (and any spawned child) down.
async fn with_client<F, Fut, T>(target: &ServerTarget, body: F) -> Result<T>
where
    F: FnOnce(client::McpClient) -> Fut,
    Fut: std::future::Future<Output = (client::McpClient, Result<T>)>,
{
    match (&target.cmd, &target.url) {
        (Some(cmd), _) => {
            let (client, mut child) = client::connect_stdio(cmd).await?;
            let (client, result) = body(client).await;
            let _ = client.cancel().await;
            let _ = tokio::time::timeout(client::SERVER_SHUTDOWN_TIMEOUT, child.wait()).await;
            result
        }
        (None, Some(url)) => {
            let client = client::connect_http(url).await?;
            let (client, result) = body(client).await;
            let _ = client.cancel().await;
            result
        }
        (None, None) => Err(anyhow!("either --cmd or --url is required")),
    }
}

async fn call_over_spawned_http(args: CallArgs) -> Result<String> {
    let cmd = args
        .target
        .cmd
        .as_deref()
        .ok_or_else(|| anyhow!("--http requires --cmd"))?;
    let arguments = args.arguments()?;
    let port = find_free_port()?;
    eprintln!("Starting HTTP server on port {port}...");
    let server = SpawnedHttpServer::spawn(cmd, port)?;

    let outcome = async {
        let (client, tools) = wait_for_server(&server.url(), SERVER_STARTUP_TIMEOUT).await?;
        let mut output = vec![format!("HTTP transport OK - {} tools available", tools.len())];
        if let Some(tool) = &args.tool {
            eprintln!("Calling tool: {tool}");
            let result = client::call_tool(&client, tool, arguments).await;
            let _ = client.cancel().await;
            output.push(render_call_result(&result?)?);
        } else {
            let _ = client.cancel().await;
        }
        anyhow::Ok(output.join("\n"))
    }
    .await;

    server.terminate().await;
    outcome
}
