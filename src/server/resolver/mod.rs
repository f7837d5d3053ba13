//! Resolve named configuration values through header → environment → default.
//!
//! A `ConfigSet` is built once at server setup and shared read-only. Each call to
//! [`ConfigSet::resolve`] reads only the supplied [`RequestContext`], so concurrent
//! requests never observe each other's values.
use std::{collections::HashMap, fmt};

use tracing::{debug, trace};

use crate::lib::errors::{ConfigSetError, ResolveError};

mod arg;
pub mod normalize;
mod request;

pub use arg::{ConfigArg, ConfigDefault, DefaultProducer, NormalizeFn, Normalized};
pub use request::{EnvView, RequestContext};

/// Tier that produced a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Header,
    Env,
    Default,
}

impl ConfigSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Header => "header",
            ConfigSource::Env => "env",
            ConfigSource::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSource::Header => "HTTP header",
            ConfigSource::Env => "environment variable",
            ConfigSource::Default => "default",
        };
        f.write_str(label)
    }
}

/// Resolved value together with the tier it came from.
///
/// `source` is `None` when an optional argument had no value (the value is empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: String,
    pub source: Option<ConfigSource>,
}

/// Ordered, immutable collection of config arguments keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    args: Vec<ConfigArg>,
    index: HashMap<String, usize>,
}

impl ConfigSet {
    pub fn new(args: impl IntoIterator<Item = ConfigArg>) -> Result<Self, ConfigSetError> {
        let mut set = Self::default();
        for arg in args {
            if arg.name().trim().is_empty() {
                return Err(ConfigSetError::EmptyName);
            }
            if set.index.contains_key(arg.name()) {
                return Err(ConfigSetError::DuplicateName {
                    name: arg.name().to_string(),
                });
            }
            set.index.insert(arg.name().to_string(), set.args.len());
            set.args.push(arg);
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigArg> {
        self.index.get(name).map(|&position| &self.args[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigArg> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Resolve `name`; optional arguments without a value yield an empty string.
    pub fn resolve(&self, name: &str, ctx: &RequestContext) -> Result<String, ResolveError> {
        self.resolve_detailed(name, ctx)
            .map(|resolution| resolution.value)
    }

    /// Resolve `name` and report which tier supplied the value.
    pub fn resolve_detailed(
        &self,
        name: &str,
        ctx: &RequestContext,
    ) -> Result<Resolution, ResolveError> {
        let arg = self.get(name).ok_or_else(|| ResolveError::UnknownConfig {
            name: name.to_string(),
        })?;

        if let Some(header) = arg.header_key() {
            let raw = ctx.header(header).map(str::to_string);
            if let Some(value) = try_source(arg, raw, ConfigSource::Header)? {
                return Ok(found(arg, value, ConfigSource::Header));
            }
        }

        if let Some(env_var) = arg.env_var_name() {
            let raw = ctx.env_var(env_var);
            if let Some(value) = try_source(arg, raw, ConfigSource::Env)? {
                return Ok(found(arg, value, ConfigSource::Env));
            }
        }

        if let Some(default) = arg.default_config() {
            return Ok(found(arg, default.produce(), ConfigSource::Default));
        }

        if arg.is_required() {
            debug!(
                target: "mcp_extensions::config",
                config = arg.name(),
                "Required config has no value in any source"
            );
            return Err(ResolveError::MissingRequired {
                name: arg.name().to_string(),
                sources: arg.describe_sources(),
            });
        }

        Ok(Resolution {
            value: String::new(),
            source: None,
        })
    }

    /// Resolve `name` as a flag. Empty or unrecognized values read as off.
    pub fn resolve_flag(&self, name: &str, ctx: &RequestContext) -> Result<bool, ResolveError> {
        self.resolve(name, ctx)
            .map(|value| normalize::is_truthy(&value))
    }

    /// Resolve `name` as a comma separated list.
    pub fn resolve_list(
        &self,
        name: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<String>, ResolveError> {
        self.resolve(name, ctx)
            .map(|value| normalize::parse_list(&value))
    }
}

/// Apply the normalize contract to one source. `Ok(None)` means fall through.
fn try_source(
    arg: &ConfigArg,
    raw: Option<String>,
    tier: ConfigSource,
) -> Result<Option<String>, ResolveError> {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    match arg.apply_normalize(&raw) {
        Normalized::Value(value) if !value.is_empty() => Ok(Some(value)),
        Normalized::Value(_) | Normalized::NotFound => {
            debug!(
                target: "mcp_extensions::config",
                config = arg.name(),
                source = tier.as_str(),
                "Source value vetoed by normalizer; trying next source"
            );
            Ok(None)
        }
        Normalized::Invalid(reason) => Err(ResolveError::Normalization {
            name: arg.name().to_string(),
            tier,
            reason,
        }),
    }
}

fn found(arg: &ConfigArg, value: String, source: ConfigSource) -> Resolution {
    debug!(
        target: "mcp_extensions::config",
        config = arg.name(),
        source = source.as_str(),
        "Resolved config"
    );
    if !arg.is_sensitive() {
        trace!(
            target: "mcp_extensions::config",
            config = arg.name(),
            value = %value,
            "Resolved config value"
        );
    }
    Resolution {
        value,
        source: Some(source),
    }
}
