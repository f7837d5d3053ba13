use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    lib::errors::{BuildError, RegistryError},
    server::{
        filters::{
            standard_config_args, standard_filters, FilterChain, FilterDefaults,
            ToolExclusionFilter, ToolFilter, ToolVisibility,
        },
        registry::{
            normalize_module, PromptDefinition, RegisteredTool, RegistrationOptions, Registry,
            ResourceDefinition,
        },
        resolver::{ConfigArg, ConfigSet, EnvView},
    },
};

use super::{
    handler::{McpServer, ServerState},
    server_info::{build_instructions, ServerInfoDocument},
};

/// Assembles an `McpServer` from registries, config arguments and filters.
///
/// Registration problems are collected and reported by [`build`](Self::build)
/// so the builder can be chained.
pub struct McpServerBuilder {
    name: String,
    package_name: Option<String>,
    package_version: Option<String>,
    advertised: BTreeMap<String, Value>,
    config_args: Vec<ConfigArg>,
    standard_defaults: Option<FilterDefaults>,
    excluded_tools: Vec<String>,
    filters: Vec<Arc<dyn ToolFilter>>,
    tools: Vec<RegisteredTool>,
    prompts: Vec<PromptDefinition>,
    resources: Vec<ResourceDefinition>,
    modules: Vec<String>,
    env: EnvView,
    instructions: Option<String>,
    registry_error: Option<RegistryError>,
}

impl McpServerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: None,
            package_version: None,
            advertised: BTreeMap::new(),
            config_args: Vec::new(),
            standard_defaults: None,
            excluded_tools: Vec::new(),
            filters: Vec::new(),
            tools: Vec::new(),
            prompts: Vec::new(),
            resources: Vec::new(),
            modules: Vec::new(),
            env: EnvView::default(),
            instructions: None,
            registry_error: None,
        }
    }

    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    pub fn package_version(mut self, version: impl Into<String>) -> Self {
        self.package_version = Some(version.into());
        self
    }

    /// Extra key published in the server-info resource.
    pub fn advertised_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.advertised.insert(key.into(), value.into());
        self
    }

    pub fn config_arg(mut self, arg: ConfigArg) -> Self {
        self.config_args.push(arg);
        self
    }

    pub fn config_args(mut self, args: impl IntoIterator<Item = ConfigArg>) -> Self {
        self.config_args.extend(args);
        self
    }

    /// Enable readonly mode, destructive-tool hiding, module include/exclude and
    /// tool exclusion, backed by the standard config arguments.
    pub fn standard_tool_filters(mut self, defaults: FilterDefaults) -> Self {
        self.standard_defaults = Some(defaults);
        self
    }

    pub fn tool_filter(mut self, filter: Arc<dyn ToolFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Tools hidden for every request.
    pub fn exclude_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_tools.extend(names.into_iter().map(Into::into));
        self
    }

    /// Copy one module's tools, prompts and resources out of `registry`.
    pub fn register_module(
        mut self,
        registry: &Registry,
        module: &str,
        options: RegistrationOptions,
    ) -> Self {
        let module = normalize_module(module);
        if module.is_empty() {
            self.record_error(RegistryError::EmptyModule);
            return self;
        }

        let mut registered = 0usize;
        for tool in registry.tools_for(&module) {
            let Some(tool) = options.apply(tool) else {
                debug!(
                    target: "mcp_extensions::runtime",
                    module = %module,
                    tool = %tool.name(),
                    "Skipped tool at registration"
                );
                continue;
            };
            if self.tools.iter().any(|t| t.name() == tool.name()) {
                self.record_error(RegistryError::DuplicateTool {
                    name: tool.name().to_string(),
                });
                continue;
            }
            self.tools.push(RegisteredTool::new(&module, tool));
            registered += 1;
        }
        for prompt in registry.prompts_for(&module) {
            if self.prompts.iter().any(|p| p.name() == prompt.name()) {
                self.record_error(RegistryError::DuplicatePrompt {
                    name: prompt.name().to_string(),
                });
                continue;
            }
            self.prompts.push(prompt.clone());
        }
        for resource in registry.resources_for(&module) {
            if self.resources.iter().any(|r| r.uri() == resource.uri()) {
                self.record_error(RegistryError::DuplicateResource {
                    uri: resource.uri().to_string(),
                });
                continue;
            }
            self.resources.push(resource.clone());
        }

        if !registry.modules().contains(&module) {
            warn!(
                target: "mcp_extensions::runtime",
                module = %module,
                "Registered module has no tools, prompts or resources"
            );
        }
        debug!(
            target: "mcp_extensions::runtime",
            module = %module,
            tools = registered,
            "Registered module"
        );
        if !self.modules.contains(&module) {
            self.modules.push(module);
        }
        self
    }

    /// Environment used for the env-var tier. Defaults to the process environment.
    pub fn env_view(mut self, env: EnvView) -> Self {
        self.env = env;
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.instructions = Some(text.into());
        self
    }

    fn record_error(&mut self, err: RegistryError) {
        if self.registry_error.is_none() {
            self.registry_error = Some(err);
        }
    }

    pub fn build(self) -> Result<McpServer, BuildError> {
        if self.name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }
        if let Some(err) = self.registry_error {
            return Err(err.into());
        }

        let mut args = self.config_args;
        let mut chain = FilterChain::default();
        match &self.standard_defaults {
            Some(defaults) => {
                args.extend(standard_config_args(defaults));
                for filter in standard_filters(self.excluded_tools.iter().cloned()) {
                    chain.push(filter);
                }
            }
            None if !self.excluded_tools.is_empty() => {
                chain.push(Arc::new(ToolExclusionFilter::new(
                    self.excluded_tools.iter().cloned(),
                )));
            }
            None => {}
        }
        for filter in self.filters {
            chain.push(filter);
        }
        let config = Arc::new(ConfigSet::new(args)?);

        let mut modules = self.modules;
        modules.sort();
        let instructions = self
            .instructions
            .unwrap_or_else(|| build_instructions(&self.name, &modules));
        let version = self
            .package_version
            .clone()
            .unwrap_or_else(|| crate::lib::version::FALLBACK_PACKAGE_VERSION.to_string());

        let info = ServerInfoDocument {
            name: self.name.clone(),
            package_name: self.package_name,
            package_version: self.package_version,
            modules,
            advertised: self.advertised,
            started_at: Utc::now(),
        };

        Ok(McpServer::from_state(ServerState {
            name: self.name,
            version,
            instructions,
            tools: self.tools,
            prompts: self.prompts,
            resources: self.resources,
            visibility: ToolVisibility::new(config, chain),
            env: self.env,
            info,
        }))
    }
}
