//! `session` module: reports how this request's configuration resolved.
use rmcp::model::{CallToolResult, Content, ErrorData};
use serde_json::json;

use crate::{
    lib::errors::{resolve_error_to_error_data, RegistryError},
    server::{
        registry::{NoArguments, Registry, ToolDefinition},
        resolver::{normalize, ConfigArg},
    },
};

pub const MODULE: &str = "session";
pub const CONFIG_API_KEY: &str = "api_key";
pub const CONFIG_SESSION_DATE: &str = "session_date";
pub const API_KEY_HEADER: &str = "Authorization";
pub const API_KEY_ENV: &str = "DEMO_API_KEY";

/// Config arguments the session tools resolve per request.
pub fn config_args() -> Vec<ConfigArg> {
    vec![
        ConfigArg::new(CONFIG_API_KEY)
            .header(API_KEY_HEADER)
            .env_var(API_KEY_ENV)
            .normalize(normalize::bearer_token)
            .optional()
            .sensitive(),
        ConfigArg::new(CONFIG_SESSION_DATE)
            .default_with(|| chrono::Utc::now().date_naive().to_string())
            .optional(),
    ]
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.add_tool(
        MODULE,
        ToolDefinition::new::<NoArguments, _, _>(
            "describe_session",
            "Report which configuration sources this session resolved (never the values)",
            |call| async move {
                let api_key = call
                    .resolve_detailed(CONFIG_API_KEY)
                    .map_err(|err| resolve_error_to_error_data(&err))?;
                let session_date = call
                    .resolve(CONFIG_SESSION_DATE)
                    .map_err(|err| resolve_error_to_error_data(&err))?;
                let body = json!({
                    "api_key": {
                        "found": !api_key.value.is_empty(),
                        "source": api_key.source.map(|source| source.as_str()),
                    },
                    "session_date": session_date,
                    "transport_headers": call.request().has_headers(),
                });
                let text = serde_json::to_string_pretty(&body)
                    .map_err(|err| ErrorData::internal_error(err.to_string(), None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            },
        )
        .read_only(true)
        .idempotent(true),
    )?;
    Ok(())
}
