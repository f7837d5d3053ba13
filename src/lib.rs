//! Extensions for building MCP servers on rmcp.
//!
//! - [`server::resolver`]: per-request config resolution (HTTP header, env var, default).
//! - [`server::filters`]: per-request tool visibility shared by `tools/list` and `tools/call`.
//! - [`server::registry`] and [`server::runtime`]: explicit registration and the server factory.
//! - [`cli`]: the `mcp-extensions` binary's server launch and client commands.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod cli;
pub mod server;
pub mod tools;
