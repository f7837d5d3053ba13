use anyhow::Result;
use mcp_extensions::server::config::{InfoSection, ServerConfig};
use rmcp::model::{GetPromptRequestParam, ReadResourceRequestParam, ResourceContents};
use serde_json::{json, Value};

use crate::common::{call, connect_in_process, demo_server, error_code, shutdown, text_json};

fn resource_text(contents: &[ResourceContents]) -> String {
    match contents.first() {
        Some(ResourceContents::TextResourceContents { text, .. }) => text.clone(),
        other => panic!("expected text contents, got {other:?}"),
    }
}

#[tokio::test]
async fn server_info_resource_describes_the_server() -> Result<()> {
    let config = ServerConfig {
        info: InfoSection {
            package_name: Some("notes-demo".into()),
            package_version: Some("2.0.0".into()),
            advertised: [("docs_url".to_string(), json!("https://example.invalid/docs"))]
                .into_iter()
                .collect(),
        },
        ..ServerConfig::default()
    };
    let server = demo_server(&config, &[])?;
    let uri = server.info_uri();
    let (client, task) = connect_in_process(server).await?;

    let resources = client.list_all_resources().await?;
    let read = client
        .read_resource(ReadResourceRequestParam { uri: uri.clone() })
        .await?;
    shutdown(client, task).await;

    assert!(resources.iter().any(|r| r.uri == uri));
    assert!(resources.iter().any(|r| r.uri == "notes://all"));
    let body: Value = serde_json::from_str(&resource_text(&read.contents))?;
    assert_eq!(body["name"], "mcp-extensions-demo");
    assert_eq!(body["framework"], "rmcp");
    assert_eq!(body["package_name"], "notes-demo");
    assert_eq!(body["package_version"], "2.0.0");
    assert_eq!(body["mcp_modules"], json!(["notes", "session"]));
    assert_eq!(body["docs_url"], "https://example.invalid/docs");
    Ok(())
}

#[tokio::test]
async fn notes_round_trip_through_tools_resource_and_prompt() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[])?;
    let (client, task) = connect_in_process(server).await?;

    call(&client, "add_note", json!({ "text": "buy milk" })).await?;
    call(&client, "add_note", json!({ "text": "call back" })).await?;
    let latest = call(&client, "list_notes", json!({ "limit": 1 })).await?;
    let resource = client
        .read_resource(ReadResourceRequestParam {
            uri: "notes://all".into(),
        })
        .await?;
    let prompt = client
        .get_prompt(GetPromptRequestParam {
            name: "summarize_notes".into(),
            arguments: None,
        })
        .await?;
    let cleared = call(&client, "clear_notes", json!({})).await?;
    shutdown(client, task).await;

    let latest = text_json(&latest);
    assert_eq!(latest["count"], 1);
    assert_eq!(latest["notes"][0]["text"], "call back");
    let stored: Value = serde_json::from_str(&resource_text(&resource.contents))?;
    assert_eq!(stored.as_array().map(Vec::len), Some(2));
    let rendered = serde_json::to_string(&prompt.messages)?;
    assert!(rendered.contains("buy milk"), "prompt: {rendered}");
    assert_eq!(text_json(&cleared)["removed"], 2);
    Ok(())
}

#[tokio::test]
async fn prompt_listing_advertises_optional_style_argument() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[])?;
    let (client, task) = connect_in_process(server).await?;

    let prompts = client.list_all_prompts().await?;
    let styled = client
        .get_prompt(GetPromptRequestParam {
            name: "summarize_notes".into(),
            arguments: Some(
                [("style".to_string(), json!("one paragraph"))]
                    .into_iter()
                    .collect(),
            ),
        })
        .await?;
    shutdown(client, task).await;

    let summarize = prompts
        .iter()
        .find(|prompt| prompt.name == "summarize_notes")
        .expect("summarize_notes is listed");
    let arguments = summarize.arguments.as_deref().unwrap_or_default();
    assert_eq!(arguments.len(), 1);
    assert_eq!(arguments[0].name, "style");
    assert_eq!(arguments[0].required, Some(false));
    let rendered = serde_json::to_string(&styled.messages)?;
    assert!(rendered.contains("one paragraph"), "prompt: {rendered}");
    Ok(())
}

#[tokio::test]
async fn invalid_arguments_are_reported_after_authorization() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[])?;
    let (client, task) = connect_in_process(server).await?;

    let missing = call(&client, "add_note", json!({})).await;
    let blank = call(&client, "add_note", json!({ "text": "   " })).await;
    shutdown(client, task).await;

    assert_eq!(
        error_code(&missing.expect_err("text is required")).as_deref(),
        Some("INVALID_ARGUMENTS")
    );
    assert_eq!(
        error_code(&blank.expect_err("blank text")).as_deref(),
        Some("INVALID_ARGUMENTS")
    );
    Ok(())
}

#[tokio::test]
async fn describe_session_reports_source_without_value() -> Result<()> {
    let secret = "sk-demo-secret-value";
    let server = demo_server(&ServerConfig::default(), &[("DEMO_API_KEY", secret)])?;
    let (client, task) = connect_in_process(server).await?;

    let result = call(&client, "describe_session", json!({})).await?;
    shutdown(client, task).await;

    let rendered = mcp_extensions::cli::render_call_result(&result)?;
    assert!(!rendered.contains(secret), "value leaked: {rendered}");
    let body: Value = serde_json::from_str(&rendered)?;
    assert_eq!(body["api_key"]["found"], true);
    assert_eq!(body["api_key"]["source"], "env");
    assert_eq!(
        body["session_date"].as_str().map(str::len),
        Some("2025-01-01".len())
    );
    Ok(())
}

#[tokio::test]
async fn malformed_bearer_header_fails_the_call_without_echoing_it() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[("DEMO_API_KEY", "fallback")])?;
    let (parts, ()) = http::Request::builder()
        .header("Authorization", "Bearer")
        .body(())?
        .into_parts();
    let request = server.request_context(Some(&parts));

    let error = server
        .invoke("describe_session", None, request)
        .await
        .expect_err("empty bearer token must not fall back to env");
    let data = error.data.clone().unwrap_or_default();
    assert_eq!(data["code"], "CONFIG_RESOLUTION_FAILED");
    assert_eq!(data["details"], json!({ "config": "api_key", "kind": "invalid" }));
    assert!(!data.to_string().contains("fallback"));
    Ok(())
}

#[tokio::test]
async fn unknown_prompt_and_resource_are_not_found() -> Result<()> {
    let server = demo_server(&ServerConfig::default(), &[])?;
    let (client, task) = connect_in_process(server).await?;

    let prompt = client
        .get_prompt(GetPromptRequestParam {
            name: "missing".into(),
            arguments: None,
        })
        .await;
    let resource = client
        .read_resource(ReadResourceRequestParam {
            uri: "notes://missing".into(),
        })
        .await;
    shutdown(client, task).await;

    assert_eq!(
        error_code(&prompt.expect_err("unknown prompt")).as_deref(),
        Some("NOT_FOUND")
    );
    assert_eq!(
        error_code(&resource.expect_err("unknown resource")).as_deref(),
        Some("NOT_FOUND")
    );
    Ok(())
}
