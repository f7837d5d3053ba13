use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::lib::version::{git_sha, EXTENSIONS_VERSION, FALLBACK_PACKAGE_VERSION};

pub const SERVER_INFO_MIME_TYPE: &str = "application/json";
pub const FRAMEWORK_NAME: &str = "rmcp";

/// URI of the built-in server-info resource.
pub fn server_info_uri(server_name: &str) -> String {
    format!("{server_name}://server/info")
}

/// Static facts published through the server-info resource.
#[derive(Debug, Clone)]
pub struct ServerInfoDocument {
    pub name: String,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub modules: Vec<String>,
    pub advertised: BTreeMap<String, Value>,
    pub started_at: DateTime<Utc>,
}

impl ServerInfoDocument {
    /// Render the resource body. Advertised keys never shadow the built-in ones.
    pub fn to_json(&self) -> Value {
        let mut body: Map<String, Value> = self
            .advertised
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        body.insert("name".into(), Value::String(self.name.clone()));
        body.insert("framework".into(), Value::String(FRAMEWORK_NAME.into()));
        body.insert(
            "extensions_version".into(),
            Value::String(EXTENSIONS_VERSION.into()),
        );
        body.insert(
            "git_sha".into(),
            git_sha().map_or(Value::Null, |sha| Value::String(sha.to_string())),
        );
        if let Some(package_name) = &self.package_name {
            body.insert("package_name".into(), Value::String(package_name.clone()));
        }
        body.insert(
            "package_version".into(),
            Value::String(
                self.package_version
                    .clone()
                    .unwrap_or_else(|| FALLBACK_PACKAGE_VERSION.to_string()),
            ),
        );
        body.insert(
            "mcp_modules".into(),
            Value::Array(self.modules.iter().cloned().map(Value::String).collect()),
        );
        body.insert(
            "started_at".into(),
            Value::String(self.started_at.to_rfc3339()),
        );
        Value::Object(body)
    }
}

/// Build the `ServerInfo.instructions` string shown to MCP clients.
pub fn build_instructions(server_name: &str, modules: &[String]) -> String {
    let modules = if modules.is_empty() {
        "none".to_string()
    } else {
        modules.join(", ")
    };
    format!(
        "{server_name} exposes tools from modules: {modules}. The visible tool set depends on this session's configuration (readonly mode, module and tool exclusions). Read {uri} for server metadata.",
        uri = server_info_uri(server_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ServerInfoDocument {
        let mut advertised = BTreeMap::new();
        advertised.insert("docs_url".to_string(), Value::String("https://docs".into()));
        advertised.insert("framework".to_string(), Value::String("other".into()));
        ServerInfoDocument {
            name: "demo".into(),
            package_name: Some("demo-pkg".into()),
            package_version: None,
            modules: vec!["notes".into(), "session".into()],
            advertised,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn info_uri_uses_server_name_as_scheme() {
        assert_eq!(server_info_uri("demo"), "demo://server/info");
    }

    #[test]
    fn document_falls_back_to_dev_version_and_keeps_reserved_keys() {
        let body = document().to_json();
        assert_eq!(body["package_version"], FALLBACK_PACKAGE_VERSION);
        assert_eq!(body["framework"], FRAMEWORK_NAME);
        assert_eq!(body["docs_url"], "https://docs");
        assert_eq!(body["mcp_modules"], serde_json::json!(["notes", "session"]));
    }

    #[test]
    fn instructions_name_modules() {
        let text = build_instructions("demo", &["notes".into()]);
        assert!(text.contains("notes"));
        assert!(text.contains("demo://server/info"));
    }
}
