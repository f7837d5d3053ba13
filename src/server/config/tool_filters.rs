use std::path::Path;

use serde::Deserialize;

use crate::{lib::errors::ConfigError, server::filters::FilterDefaults};

#[derive(Debug, Deserialize, Default)]
pub struct RawToolFiltersSection {
    pub readonly_mode: Option<bool>,
    pub no_destructive_tools: Option<bool>,
    pub include_modules: Option<Vec<String>>,
    pub exclude_modules: Option<Vec<String>>,
    pub exclude_tools: Option<Vec<String>>,
}

/// Parse `[tool_filters]` into the process-wide filter defaults.
pub fn parse_tool_filters_section(
    raw: Option<RawToolFiltersSection>,
    path: &Path,
) -> Result<FilterDefaults, ConfigError> {
    let raw = raw.unwrap_or_default();
    Ok(FilterDefaults {
        readonly_mode: raw.readonly_mode.unwrap_or(false),
        no_destructive_tools: raw.no_destructive_tools.unwrap_or(false),
        include_modules: names(raw.include_modules, "tool_filters.include_modules", path)?,
        exclude_modules: names(raw.exclude_modules, "tool_filters.exclude_modules", path)?,
        exclude_tools: names(raw.exclude_tools, "tool_filters.exclude_tools", path)?,
    })
}

// Entries are joined with commas when they become defaults, so a comma would split one name in two.
fn names(
    raw: Option<Vec<String>>,
    field: &'static str,
    path: &Path,
) -> Result<Vec<String>, ConfigError> {
    let mut names = Vec::new();
    for name in raw.unwrap_or_default() {
        let name = name.trim();
        if name.is_empty() || name.contains(',') {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field,
                message: format!("Invalid entry `{name}`: names must be non-empty and contain no commas"),
            });
        }
        names.push(name.to_string());
    }
    Ok(names)
}
