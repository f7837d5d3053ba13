use std::{future::Future, pin::Pin, sync::Arc};

use rmcp::model::{CallToolResult, ErrorData, JsonObject, Tool};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    lib::errors::{ResolveError, INVALID_ARGUMENTS_ERROR},
    server::{
        filters::ToolHints,
        resolver::{ConfigSet, RequestContext, Resolution},
    },
};

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send>>;
pub type ToolHandler = Arc<dyn Fn(ToolCall) -> ToolFuture + Send + Sync>;

/// Argument type for tools that take no input.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoArguments {}

/// Everything a tool handler receives for one invocation.
#[derive(Debug, Clone)]
pub struct ToolCall {
    arguments: JsonObject,
    config: Arc<ConfigSet>,
    request: RequestContext,
}

impl ToolCall {
    pub fn new(arguments: JsonObject, config: Arc<ConfigSet>, request: RequestContext) -> Self {
        Self {
            arguments,
            config,
            request,
        }
    }

    pub fn arguments(&self) -> &JsonObject {
        &self.arguments
    }

    /// Deserialize the arguments into the tool's typed input.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ErrorData> {
        serde_json::from_value(Value::Object(self.arguments.clone())).map_err(|err| {
            INVALID_ARGUMENTS_ERROR
                .builder()
                .retryable(false)
                .details(json!({ "reason": err.to_string() }))
                .build()
                .unwrap_or_else(|_| ErrorData::invalid_params(INVALID_ARGUMENTS_ERROR.message, None))
        })
    }

    /// Resolve a server config argument against this call's request.
    pub fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        self.config.resolve(name, &self.request)
    }

    pub fn resolve_detailed(&self, name: &str) -> Result<Resolution, ResolveError> {
        self.config.resolve_detailed(name, &self.request)
    }

    pub fn config(&self) -> &ConfigSet {
        &self.config
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }
}

/// A tool waiting to be registered on a server.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    title: Option<String>,
    description: String,
    input_schema: Arc<JsonObject>,
    hints: ToolHints,
    handler: ToolHandler,
}

impl ToolDefinition {
    /// Define a tool whose input schema is derived from `A`.
    pub fn new<A, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        A: JsonSchema,
        F: Fn(ToolCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ErrorData>> + Send + 'static,
    {
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            input_schema: Arc::new(schema_object::<A>()),
            hints: ToolHints::default(),
            handler: Arc::new(move |call| Box::pin(handler(call))),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn read_only(mut self, value: bool) -> Self {
        self.hints.read_only = Some(value);
        self
    }

    pub fn destructive(mut self, value: bool) -> Self {
        self.hints.destructive = Some(value);
        self
    }

    pub fn idempotent(mut self, value: bool) -> Self {
        self.hints.idempotent = Some(value);
        self
    }

    pub fn open_world(mut self, value: bool) -> Self {
        self.hints.open_world = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hints(&self) -> ToolHints {
        self.hints
    }

    pub fn input_schema(&self) -> &JsonObject {
        &self.input_schema
    }

    /// Top-level argument names declared by the input schema.
    pub fn parameter_names(&self) -> Vec<String> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of this definition with `names` removed from the input schema.
    /// Names the schema does not declare are ignored.
    pub fn without_args(&self, names: &[String]) -> Self {
        let declared = self.parameter_names();
        let removable: Vec<&String> = names.iter().filter(|name| declared.contains(name)).collect();
        if removable.is_empty() {
            return self.clone();
        }

        let mut schema = (*self.input_schema).clone();
        if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
            for name in &removable {
                properties.remove(name.as_str());
            }
        }
        if let Some(required) = schema.get_mut("required").and_then(Value::as_array_mut) {
            required.retain(|value| {
                value
                    .as_str()
                    .map_or(true, |name| !removable.iter().any(|r| r.as_str() == name))
            });
        }

        let mut copy = self.clone();
        copy.input_schema = Arc::new(schema);
        copy
    }

    /// The MCP wire representation.
    pub fn to_tool(&self) -> Tool {
        let mut tool = Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::clone(&self.input_schema),
        );
        tool.annotations = self.hints.to_annotations(self.title.clone());
        tool
    }

    pub fn invoke(&self, call: ToolCall) -> ToolFuture {
        (self.handler)(call)
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("hints", &self.hints)
            .finish_non_exhaustive()
    }
}

fn schema_object<A: JsonSchema>() -> JsonObject {
    match serde_json::to_value(schemars::schema_for!(A)) {
        Ok(Value::Object(object)) => object,
        _ => {
            let mut object = JsonObject::new();
            object.insert("type".into(), Value::String("object".into()));
            object
        }
    }
}
