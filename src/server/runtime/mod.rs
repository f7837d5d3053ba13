//! Server assembly, the MCP handler and transport startup.
mod builder;
mod handler;
mod server_info;
mod startup;

pub use builder::McpServerBuilder;
pub use handler::McpServer;
pub use server_info::{build_instructions, server_info_uri, ServerInfoDocument};
pub use startup::{resolve_http_port, run_server, RuntimeExit, HTTP_PORT_ENV, MCP_HTTP_PATH};
