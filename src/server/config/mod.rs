//! Load and validate server configuration.
//!
//! The file is optional: without `--config` or `MCP_CONFIG_PATH` the built-in
//! defaults apply. A path that is given must exist and parse.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::{lib::errors::ConfigError, server::filters::FilterDefaults};

pub mod info;
pub mod server;
pub mod telemetry;
pub mod tool_filters;

pub use info::{parse_info_section, InfoSection, RawInfoSection};
pub use server::{
    parse_server_section, RawServerSection, ServerSection, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_SERVER_NAME,
};
pub use tool_filters::{parse_tool_filters_section, RawToolFiltersSection};

/// Top-level configuration container.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub info: InfoSection,
    pub tool_filters: FilterDefaults,
    /// `None` when running on built-in defaults.
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawServerConfig {
    server: Option<RawServerSection>,
    info: Option<RawInfoSection>,
    tool_filters: Option<RawToolFiltersSection>,
}

impl ServerConfig {
    /// Load `path` when given; otherwise use the built-in defaults.
    pub fn load_optional(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let config = Self::default();
                telemetry::log_loaded(&config);
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "mcp_extensions::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let builder = config::Config::builder().add_source(config::File::from(path.clone()));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "mcp_extensions::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawServerConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "mcp_extensions::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, &path).map_err(|err| {
            error!(
                target: "mcp_extensions::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawServerConfig, path: &Path) -> Result<Self, ConfigError> {
        let server = parse_server_section(raw.server, path)?;
        let info = parse_info_section(raw.info, path)?;
        let tool_filters = parse_tool_filters_section(raw.tool_filters, path)?;

        Ok(Self {
            server,
            info,
            tool_filters,
            source_path: Some(path.to_path_buf()),
        })
    }
}
