use std::path::PathBuf;

use config::ConfigError as ConfigLoaderError;
use rmcp::model::ErrorData;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::server::resolver::ConfigSource;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures while resolving a named configuration value.
///
/// None of the variants carry a resolved or raw source value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The name was never registered in the `ConfigSet`.
    #[error("Unknown config argument: {name}")]
    UnknownConfig { name: String },
    /// A required value had no source.
    #[error("Required config '{name}' not found. Set {sources}.")]
    MissingRequired { name: String, sources: String },
    /// A source value was rejected by the normalizer.
    #[error("Config '{name}' from {tier} is invalid: {reason}")]
    Normalization {
        name: String,
        tier: ConfigSource,
        reason: String,
    },
}

/// Errors raised while building a `ConfigSet`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigSetError {
    #[error("Config argument `{name}` is registered more than once")]
    DuplicateName { name: String },
    #[error("Config argument name must not be empty")]
    EmptyName,
}

/// Errors raised while populating a `Registry`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool `{name}` is already registered")]
    DuplicateTool { name: String },
    #[error("Prompt `{name}` is already registered")]
    DuplicatePrompt { name: String },
    #[error("Resource `{uri}` is already registered")]
    DuplicateResource { uri: String },
    #[error("Module tag must not be empty")]
    EmptyModule,
}

/// Errors raised by `McpServerBuilder::build`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Server name must not be empty")]
    EmptyName,
    #[error(transparent)]
    ConfigSet(#[from] ConfigSetError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Structured error metadata returned by MCP handlers.
#[derive(Debug, Clone, Serialize)]
pub struct ToolErrorDescriptor {
    /// Error code.
    pub code: &'static str,
    /// User-facing message.
    pub message: &'static str,
    /// Recommended remediation.
    pub remediation: &'static str,
}

impl ToolErrorDescriptor {
    pub const fn new(code: &'static str, message: &'static str, remediation: &'static str) -> Self {
        Self {
            code,
            message,
            remediation,
        }
    }

    /// Create a builder.
    pub fn builder(&self) -> ToolErrorDescriptorBuilder<'_> {
        ToolErrorDescriptorBuilder::new(self)
    }
}

/// Builder for error data that fails if required fields are missing.
pub struct ToolErrorDescriptorBuilder<'a> {
    descriptor: &'a ToolErrorDescriptor,
    message: Option<String>,
    retryable: Option<bool>,
    details: Option<Value>,
    extra_fields: Map<String, Value>,
}

impl<'a> ToolErrorDescriptorBuilder<'a> {
    pub fn new(descriptor: &'a ToolErrorDescriptor) -> Self {
        Self {
            descriptor,
            message: None,
            retryable: None,
            details: None,
            extra_fields: Map::new(),
        }
    }

    /// Replace the descriptor's static message (e.g. to name the tool).
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_context_field(mut self, key: &str, value: Value) -> Self {
        self.extra_fields.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Result<ErrorData, ToolErrorBuilderError> {
        if self.descriptor.remediation.trim().is_empty() {
            return Err(ToolErrorBuilderError::MissingRemediation {
                code: self.descriptor.code,
            });
        }
        let retryable = self
            .retryable
            .ok_or(ToolErrorBuilderError::MissingRetryable {
                code: self.descriptor.code,
            })?;

        let mut data = Map::new();
        data.insert("code".into(), Value::String(self.descriptor.code.into()));
        data.insert(
            "remediation".into(),
            Value::String(self.descriptor.remediation.into()),
        );
        data.insert("retryable".into(), Value::Bool(retryable));
        if let Some(details) = self.details {
            data.insert("details".into(), details);
        }
        for (key, value) in self.extra_fields {
            data.insert(key, value);
        }

        let message = self
            .message
            .unwrap_or_else(|| self.descriptor.message.to_string());
        Ok(ErrorData::invalid_params(message, Some(Value::Object(data))))
    }
}

/// Errors when required builder fields are missing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolErrorBuilderError {
    #[error("retryable is missing (code={code})")]
    MissingRetryable { code: &'static str },
    #[error("remediation is empty (code={code})")]
    MissingRemediation { code: &'static str },
}

/// A call targeted a tool that is hidden (or unknown) under the current request.
pub const TOOL_UNAVAILABLE_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "TOOL_UNAVAILABLE",
    "Tool is not available. It may be restricted based on your current session configuration.",
    "List the tools available to this session and call one of those instead.",
);

/// Request-scoped configuration could not be resolved.
pub const CONFIG_RESOLUTION_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "CONFIG_RESOLUTION_FAILED",
    "Session configuration could not be resolved",
    "Check the request headers and server environment for the configured values.",
);

/// Tool arguments failed to deserialize.
pub const INVALID_ARGUMENTS_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "INVALID_ARGUMENTS",
    "Tool arguments do not match the input schema",
    "Compare the arguments with the tool's inputSchema before retrying.",
);

/// A prompt name or resource URI is not registered.
pub const NOT_FOUND_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "NOT_FOUND",
    "The requested prompt or resource does not exist",
    "List prompts or resources to discover the registered names.",
);

/// Map a resolution failure to request-level error data.
///
/// The resolver's own message never carries a value, but only the config name
/// and failure kind are forwarded to the client.
pub fn resolve_error_to_error_data(err: &ResolveError) -> ErrorData {
    let (kind, name) = match err {
        ResolveError::UnknownConfig { name } => ("unknown", name),
        ResolveError::MissingRequired { name, .. } => ("missing", name),
        ResolveError::Normalization { name, .. } => ("invalid", name),
    };
    CONFIG_RESOLUTION_ERROR
        .builder()
        .retryable(false)
        .details(serde_json::json!({ "config": name, "kind": kind }))
        .build()
        .unwrap_or_else(|_| ErrorData::internal_error(CONFIG_RESOLUTION_ERROR.message, None))
}
