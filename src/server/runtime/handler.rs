use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ErrorData, GetPromptRequestParam,
        GetPromptResult, Implementation, JsonObject, ListPromptsResult, ListResourcesResult,
        ListToolsResult, PaginatedRequestParam, RawResource, ReadResourceRequestParam,
        ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext as RmcpRequestContext,
    RoleServer,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    lib::errors::{resolve_error_to_error_data, ResolveError, NOT_FOUND_ERROR},
    server::{
        filters::{tool_unavailable_error, CallRejection, ToolVisibility},
        registry::{PromptDefinition, RegisteredTool, ResourceDefinition, ToolCall},
        resolver::{ConfigSet, EnvView, RequestContext},
    },
};

use super::server_info::{server_info_uri, ServerInfoDocument, SERVER_INFO_MIME_TYPE};

pub(crate) struct ServerState {
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) instructions: String,
    pub(crate) tools: Vec<RegisteredTool>,
    pub(crate) prompts: Vec<PromptDefinition>,
    pub(crate) resources: Vec<ResourceDefinition>,
    pub(crate) visibility: ToolVisibility,
    pub(crate) env: EnvView,
    pub(crate) info: ServerInfoDocument,
}

/// An MCP server assembled by `McpServerBuilder`.
///
/// Cheap to clone; every transport session shares the same state.
#[derive(Clone)]
pub struct McpServer {
    state: Arc<ServerState>,
}

impl McpServer {
    pub(crate) fn from_state(state: ServerState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn instructions(&self) -> &str {
        &self.state.instructions
    }

    pub fn modules(&self) -> &[String] {
        &self.state.info.modules
    }

    pub fn config(&self) -> &Arc<ConfigSet> {
        self.state.visibility.config()
    }

    pub fn visibility(&self) -> &ToolVisibility {
        &self.state.visibility
    }

    /// Names of every registered tool, visible or not.
    pub fn tool_names(&self) -> Vec<&str> {
        self.state.tools.iter().map(RegisteredTool::name).collect()
    }

    pub fn info_uri(&self) -> String {
        server_info_uri(&self.state.name)
    }

    pub fn info_document(&self) -> serde_json::Value {
        self.state.info.to_json()
    }

    /// Request view over the server's environment, with headers when the
    /// transport carried an HTTP request.
    pub fn request_context(&self, parts: Option<&http::request::Parts>) -> RequestContext {
        RequestContext::from_http_parts(parts, self.state.env.clone())
    }

    /// Tools visible to `request`, in registration order.
    pub fn visible_tools(&self, request: &RequestContext) -> Result<Vec<Tool>, ResolveError> {
        let visible = self
            .state
            .visibility
            .filter_listing(self.state.tools.iter(), request)?;
        Ok(visible
            .into_iter()
            .map(|tool| tool.definition().to_tool())
            .collect())
    }

    /// Authorize then run a tool. The visibility check precedes argument
    /// parsing, so hidden and unknown tools fail identically.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        request: RequestContext,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = self.state.tools.iter().find(|tool| tool.name() == name);
        self.state
            .visibility
            .authorize_call(name, tool.map(RegisteredTool::descriptor), &request)
            .map_err(|rejection| {
                if let CallRejection::Unavailable { .. } = rejection {
                    info!(
                        target: "mcp_extensions::filters",
                        tool = %name,
                        "Rejected call to unavailable tool"
                    );
                }
                rejection.to_error_data()
            })?;
        // authorize_call only succeeds for registered tools.
        let Some(tool) = tool else {
            return Err(tool_unavailable_error(name));
        };

        debug!(target: "mcp_extensions::runtime", tool = %name, "Invoking tool");
        let call = ToolCall::new(
            arguments.unwrap_or_default(),
            Arc::clone(self.config()),
            request,
        );
        tool.definition().invoke(call).await
    }

    /// Read a registered resource or the built-in server-info document.
    pub fn read(&self, uri: &str) -> Result<String, ErrorData> {
        if uri == self.info_uri() {
            return serde_json::to_string_pretty(&self.state.info.to_json())
                .map_err(|err| ErrorData::internal_error(err.to_string(), None));
        }
        match self.state.resources.iter().find(|r| r.uri() == uri) {
            Some(resource) => resource.read(),
            None => Err(not_found("resource", uri)),
        }
    }

    fn info_resource(&self) -> Resource {
        let mut raw = RawResource::new(self.info_uri(), "server-info");
        raw.description = Some("Server metadata: name, versions and registered modules".into());
        raw.mime_type = Some(SERVER_INFO_MIME_TYPE.into());
        raw.no_annotation()
    }
}

fn not_found(kind: &str, name: &str) -> ErrorData {
    NOT_FOUND_ERROR
        .builder()
        .retryable(false)
        .with_context_field(kind, json!(name))
        .build()
        .unwrap_or_else(|_| ErrorData::resource_not_found(NOT_FOUND_ERROR.message, None))
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("name", &self.state.name)
            .field("tools", &self.tool_names())
            .field("filters", self.state.visibility.chain())
            .finish_non_exhaustive()
    }
}

impl ServerHandler for McpServer {
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        context: RmcpRequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let request = self.request_context(context.extensions.get::<http::request::Parts>());
        let tools = self
            .visible_tools(&request)
            .map_err(|err| resolve_error_to_error_data(&err))?;
        debug!(
            target: "mcp_extensions::filters",
            visible = tools.len(),
            registered = self.state.tools.len(),
            "Listed tools"
        );
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RmcpRequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let ctx = self.request_context(context.extensions.get::<http::request::Parts>());
        self.invoke(&request.name, request.arguments, ctx).await
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RmcpRequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let resources = std::iter::once(self.info_resource())
            .chain(self.state.resources.iter().map(ResourceDefinition::to_resource))
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RmcpRequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let text = self.read(&request.uri)?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RmcpRequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        let prompts = self
            .state
            .prompts
            .iter()
            .map(PromptDefinition::to_prompt)
            .collect();
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RmcpRequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        let prompt = self
            .state
            .prompts
            .iter()
            .find(|p| p.name() == request.name)
            .ok_or_else(|| not_found("prompt", &request.name))?;
        let arguments = request.arguments.unwrap_or_default();
        Ok(GetPromptResult {
            description: Some(prompt.description().to_string()),
            messages: prompt.render(&arguments),
        })
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: self.state.name.clone(),
                version: self.state.version.clone(),
                ..Default::default()
            },
            instructions: Some(self.state.instructions.clone()),
            ..ServerInfo::default()
        }
    }
}
