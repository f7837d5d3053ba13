use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;
use serde_json::Value;

use crate::lib::errors::ConfigError;

/// Package metadata and extra properties for the server-info resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoSection {
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub advertised: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawInfoSection {
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

pub fn parse_info_section(
    raw: Option<RawInfoSection>,
    path: &Path,
) -> Result<InfoSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let package_name = non_blank(raw.package_name, "info.package_name", path)?;
    let package_version = non_blank(raw.package_version, "info.package_version", path)?;
    Ok(InfoSection {
        package_name,
        package_version,
        advertised: raw.extra,
    })
}

fn non_blank(
    value: Option<String>,
    field: &'static str,
    path: &Path,
) -> Result<Option<String>, ConfigError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: "Remove the key or give it a non-empty value".into(),
        }),
        other => Ok(other),
    }
}
