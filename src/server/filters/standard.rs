//! Standard filters and the config arguments they read.
use std::{collections::BTreeSet, sync::Arc};

use crate::{lib::errors::ResolveError, server::resolver::ConfigArg};

use super::{FilterContext, ToolDescriptor, ToolFilter};

pub const CONFIG_READONLY_MODE: &str = "readonly_mode";
pub const CONFIG_NO_DESTRUCTIVE_TOOLS: &str = "no_destructive_tools";
pub const CONFIG_INCLUDE_MODULES: &str = "include_modules";
pub const CONFIG_EXCLUDE_MODULES: &str = "exclude_modules";
pub const CONFIG_EXCLUDE_TOOLS: &str = "exclude_tools";

pub const HEADER_READONLY_MODE: &str = "X-MCP-Readonly-Mode";
pub const HEADER_NO_DESTRUCTIVE_TOOLS: &str = "X-No-Destructive-Tools";
pub const HEADER_INCLUDE_MODULES: &str = "X-MCP-Include-Modules";
pub const HEADER_EXCLUDE_MODULES: &str = "X-MCP-Exclude-Modules";
pub const HEADER_EXCLUDE_TOOLS: &str = "X-MCP-Exclude-Tools";

pub const ENV_READONLY_MODE: &str = "MCP_READONLY_MODE";
pub const ENV_NO_DESTRUCTIVE_TOOLS: &str = "MCP_NO_DESTRUCTIVE_TOOLS";
pub const ENV_INCLUDE_MODULES: &str = "MCP_INCLUDE_MODULES";
pub const ENV_EXCLUDE_MODULES: &str = "MCP_EXCLUDE_MODULES";
pub const ENV_EXCLUDE_TOOLS: &str = "MCP_EXCLUDE_TOOLS";

/// Process-wide defaults for the standard filters (the last resolution tier).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDefaults {
    pub readonly_mode: bool,
    pub no_destructive_tools: bool,
    pub include_modules: Vec<String>,
    pub exclude_modules: Vec<String>,
    pub exclude_tools: Vec<String>,
}

fn flag_default(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Config arguments backing the standard filters. All optional.
pub fn standard_config_args(defaults: &FilterDefaults) -> Vec<ConfigArg> {
    vec![
        ConfigArg::new(CONFIG_READONLY_MODE)
            .header(HEADER_READONLY_MODE)
            .env_var(ENV_READONLY_MODE)
            .default_value(flag_default(defaults.readonly_mode))
            .optional(),
        ConfigArg::new(CONFIG_NO_DESTRUCTIVE_TOOLS)
            .header(HEADER_NO_DESTRUCTIVE_TOOLS)
            .env_var(ENV_NO_DESTRUCTIVE_TOOLS)
            .default_value(flag_default(defaults.no_destructive_tools))
            .optional(),
        ConfigArg::new(CONFIG_INCLUDE_MODULES)
            .header(HEADER_INCLUDE_MODULES)
            .env_var(ENV_INCLUDE_MODULES)
            .default_value(defaults.include_modules.join(","))
            .optional(),
        ConfigArg::new(CONFIG_EXCLUDE_MODULES)
            .header(HEADER_EXCLUDE_MODULES)
            .env_var(ENV_EXCLUDE_MODULES)
            .default_value(defaults.exclude_modules.join(","))
            .optional(),
        ConfigArg::new(CONFIG_EXCLUDE_TOOLS)
            .header(HEADER_EXCLUDE_TOOLS)
            .env_var(ENV_EXCLUDE_TOOLS)
            .default_value(defaults.exclude_tools.join(","))
            .optional(),
    ]
}

/// The four standard filters. `excluded_tools` are hidden unconditionally.
pub fn standard_filters<I, S>(excluded_tools: I) -> Vec<Arc<dyn ToolFilter>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    vec![
        Arc::new(ReadonlyModeFilter),
        Arc::new(NoDestructiveToolsFilter),
        Arc::new(ModuleFilter),
        Arc::new(ToolExclusionFilter::new(excluded_tools)),
    ]
}

/// In readonly mode only tools explicitly hinted read-only stay visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadonlyModeFilter;

impl ToolFilter for ReadonlyModeFilter {
    fn name(&self) -> &str {
        CONFIG_READONLY_MODE
    }

    fn is_visible(
        &self,
        tool: &ToolDescriptor,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, ResolveError> {
        if !ctx.resolve_flag(CONFIG_READONLY_MODE)? {
            return Ok(true);
        }
        Ok(tool.hints.is_read_only())
    }
}

/// Hides tools hinted destructive. A missing hint counts as non-destructive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDestructiveToolsFilter;

impl ToolFilter for NoDestructiveToolsFilter {
    fn name(&self) -> &str {
        CONFIG_NO_DESTRUCTIVE_TOOLS
    }

    fn is_visible(
        &self,
        tool: &ToolDescriptor,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, ResolveError> {
        if !ctx.resolve_flag(CONFIG_NO_DESTRUCTIVE_TOOLS)? {
            return Ok(true);
        }
        Ok(!tool.hints.is_destructive())
    }
}

/// Include-list then exclude-list on the tool's origin module.
///
/// A non-empty include list hides untagged tools; exclude wins over include.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleFilter;

impl ToolFilter for ModuleFilter {
    fn name(&self) -> &str {
        "modules"
    }

    fn is_visible(
        &self,
        tool: &ToolDescriptor,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, ResolveError> {
        let include = ctx.resolve_list(CONFIG_INCLUDE_MODULES)?;
        let exclude = ctx.resolve_list(CONFIG_EXCLUDE_MODULES)?;
        let module = tool.module.as_deref();

        if !include.is_empty() && !module.is_some_and(|m| include.iter().any(|i| i == m)) {
            return Ok(false);
        }
        if module.is_some_and(|m| exclude.iter().any(|e| e == m)) {
            return Ok(false);
        }
        Ok(true)
    }
}

/// Hides tools by name: a static set plus the request's `exclude_tools` list.
#[derive(Debug, Clone, Default)]
pub struct ToolExclusionFilter {
    always_hidden: BTreeSet<String>,
}

impl ToolExclusionFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            always_hidden: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ToolFilter for ToolExclusionFilter {
    fn name(&self) -> &str {
        CONFIG_EXCLUDE_TOOLS
    }

    fn is_visible(
        &self,
        tool: &ToolDescriptor,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, ResolveError> {
        if self.always_hidden.contains(&tool.name) {
            return Ok(false);
        }
        // Skip resolution when the set has no such arg (static-only use).
        if !ctx.config().contains(CONFIG_EXCLUDE_TOOLS) {
            return Ok(true);
        }
        let excluded = ctx.resolve_list(CONFIG_EXCLUDE_TOOLS)?;
        Ok(!excluded.iter().any(|name| name == &tool.name))
    }
}
