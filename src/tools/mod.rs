//! Demo tool modules and the server assembled from them.

pub mod notes;
pub mod session;

use crate::{
    lib::errors::{BuildError, RegistryError},
    server::{
        config::ServerConfig,
        registry::{RegistrationOptions, Registry},
        resolver::EnvView,
        runtime::{McpServer, McpServerBuilder},
    },
};

pub use notes::NoteStore;

/// Registry holding every demo module.
pub fn demo_registry(store: &NoteStore) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    notes::register(&mut registry, store)?;
    session::register(&mut registry)?;
    Ok(registry)
}

/// Build the demo server described by `config`, reading env vars through `env`.
pub fn build_demo_server(config: &ServerConfig, env: EnvView) -> Result<McpServer, BuildError> {
    let store = NoteStore::new();
    let registry = demo_registry(&store)?;

    let mut builder = McpServerBuilder::new(config.server.name.clone())
        .config_args(session::config_args())
        .standard_tool_filters(config.tool_filters.clone())
        .env_view(env);
    if let Some(name) = &config.info.package_name {
        builder = builder.package_name(name.clone());
    }
    if let Some(version) = &config.info.package_version {
        builder = builder.package_version(version.clone());
    }
    for (key, value) in &config.info.advertised {
        builder = builder.advertised_property(key.clone(), value.clone());
    }
    for module in [notes::MODULE, session::MODULE] {
        builder = builder.register_module(&registry, module, RegistrationOptions::new());
    }
    builder.build()
}
