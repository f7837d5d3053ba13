//! MCP server building blocks: config resolution, tool visibility, registration
//! and the rmcp handler.
pub mod config;
pub mod filters;
pub mod registry;
pub mod resolver;
pub mod runtime;

pub use filters::{FilterDefaults, ToolFilter, ToolVisibility};
pub use registry::{
    PromptDefinition, RegistrationOptions, Registry, ResourceDefinition, ToolCall, ToolDefinition,
};
pub use resolver::{ConfigArg, ConfigSet, EnvView, Normalized, RequestContext};
pub use runtime::{McpServer, McpServerBuilder};
