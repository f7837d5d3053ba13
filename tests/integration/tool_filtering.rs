use anyhow::Result;
use mcp_extensions::server::{config::ServerConfig, filters::FilterDefaults};
use serde_json::json;

use crate::common::{
    call, connect_in_process, demo_server, error_code, shutdown, text_json, tool_names,
};

fn config_with(filters: FilterDefaults) -> ServerConfig {
    ServerConfig {
        tool_filters: filters,
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn default_session_lists_every_demo_tool() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[])?;
    let (client, task) = connect_in_process(server).await?;

    let names = tool_names(&client).await?;
    shutdown(client, task).await;

    assert_eq!(
        names,
        vec!["add_note", "clear_notes", "describe_session", "list_notes"]
    );
    Ok(())
}

#[tokio::test]
async fn readonly_env_hides_write_tools_and_rejects_calls() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[("MCP_READONLY_MODE", "true")])?;
    let (client, task) = connect_in_process(server).await?;

    let names = tool_names(&client).await?;
    let hidden = call(&client, "add_note", json!({ "text": "nope" })).await;
    let allowed = call(&client, "list_notes", json!({})).await;
    shutdown(client, task).await;

    assert_eq!(names, vec!["describe_session", "list_notes"]);
    let error = hidden.expect_err("hidden tool must be rejected");
    assert_eq!(error_code(&error).as_deref(), Some("TOOL_UNAVAILABLE"));
    let listed = text_json(&allowed?);
    assert_eq!(listed["count"], 0);
    Ok(())
}

#[tokio::test]
async fn hidden_and_unknown_tools_fail_identically() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[("MCP_EXCLUDE_TOOLS", "clear_notes")])?;
    let (client, task) = connect_in_process(server).await?;

    let hidden = call(&client, "clear_notes", json!({})).await;
    let unknown = call(&client, "no_such_tool", json!({})).await;
    shutdown(client, task).await;

    let hidden = hidden.expect_err("excluded tool must be rejected");
    let unknown = unknown.expect_err("unknown tool must be rejected");
    assert_eq!(error_code(&hidden).as_deref(), Some("TOOL_UNAVAILABLE"));
    assert_eq!(error_code(&unknown).as_deref(), Some("TOOL_UNAVAILABLE"));
    Ok(())
}

#[tokio::test]
async fn filter_check_runs_before_argument_validation() -> Result<()> {
    let server = demo_server(
        &config_with(FilterDefaults {
            readonly_mode: true,
            ..FilterDefaults::default()
        }),
        &[],
    )?;
    let (client, task) = connect_in_process(server).await?;

    // `text` is missing; a visible add_note would report INVALID_ARGUMENTS.
    let result = call(&client, "add_note", json!({})).await;
    shutdown(client, task).await;

    let error = result.expect_err("hidden tool must be rejected");
    assert_eq!(error_code(&error).as_deref(), Some("TOOL_UNAVAILABLE"));
    Ok(())
}

#[tokio::test]
async fn module_filters_combine_with_config_defaults() -> Result<()> {
    let server = demo_server(
        &config_with(FilterDefaults {
            include_modules: vec!["notes".into()],
            no_destructive_tools: true,
            ..FilterDefaults::default()
        }),
        &[],
    )?;
    let (client, task) = connect_in_process(server).await?;

    let names = tool_names(&client).await?;
    shutdown(client, task).await;

    assert_eq!(names, vec!["add_note", "list_notes"]);
    Ok(())
}

#[tokio::test]
async fn env_overrides_config_default() -> Result<()> {
    let server = demo_server(
        &config_with(FilterDefaults {
            readonly_mode: true,
            ..FilterDefaults::default()
        }),
        &[("MCP_READONLY_MODE", "0")],
    )?;
    let (client, task) = connect_in_process(server).await?;

    let names = tool_names(&client).await?;
    shutdown(client, task).await;

    assert_eq!(names.len(), 4, "env var must win over the config default");
    Ok(())
}

#[tokio::test]
async fn header_tier_wins_over_env_for_http_requests() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[("MCP_READONLY_MODE", "1")])?;
    let (parts, ()) = http::Request::builder()
        .header("x-mcp-readonly-mode", "false")
        .body(())?
        .into_parts();

    let with_header = server.request_context(Some(&parts));
    let without_header = server.request_context(None);
    assert_eq!(server.visible_tools(&with_header)?.len(), 4);
    assert_eq!(server.visible_tools(&without_header)?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn listing_and_calls_agree_for_every_tool() -> Result<()> {
    let server = demo_server(
        &ServerConfig::default(),
        &[("MCP_NO_DESTRUCTIVE_TOOLS", "yes"), ("MCP_EXCLUDE_MODULES", "session")],
    )?;
    let request = server.request_context(None);
    let visible: Vec<String> = server
        .visible_tools(&request)?
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();

    for name in server.tool_names() {
        let outcome = server
            .invoke(name, Some(serde_json::Map::new()), request.clone())
            .await;
        let rejected = outcome
            .as_ref()
            .err()
            .and_then(|err| err.data.as_ref())
            .and_then(|data| data.get("code"))
            .and_then(|code| code.as_str())
            == Some("TOOL_UNAVAILABLE");
        assert_eq!(
            rejected,
            !visible.iter().any(|v| v == name),
            "list/call disagreement for {name}"
        );
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_resolve_their_own_headers() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[])?;
    let (readonly_parts, ()) = http::Request::builder()
        .header("x-mcp-readonly-mode", "on")
        .body(())?
        .into_parts();
    let (open_parts, ()) = http::Request::builder()
        .header("x-mcp-readonly-mode", "off")
        .body(())?
        .into_parts();
    let readonly = server.request_context(Some(&readonly_parts));
    let open = server.request_context(Some(&open_parts));

    let session = |request: mcp_extensions::server::RequestContext| {
        let server = server.clone();
        tokio::spawn(async move {
            let mut outcomes = Vec::new();
            for round in 0..20 {
                let visible = server.visible_tools(&request)?.len();
                let added = server
                    .invoke(
                        "add_note",
                        json!({ "text": format!("round {round}") }).as_object().cloned(),
                        request.clone(),
                    )
                    .await
                    .is_ok();
                outcomes.push((visible, added));
                tokio::task::yield_now().await;
            }
            anyhow::Ok(outcomes)
        })
    };

    let (readonly_outcomes, open_outcomes) = tokio::join!(session(readonly), session(open));
    let readonly_outcomes = readonly_outcomes??;
    let open_outcomes = open_outcomes??;

    assert!(readonly_outcomes.iter().all(|outcome| *outcome == (2, false)));
    assert!(open_outcomes.iter().all(|outcome| *outcome == (4, true)));
    Ok(())
}
