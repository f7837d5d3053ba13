use std::{fmt, sync::Arc};

/// Outcome of normalizing a raw source value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Use this value and stop resolving.
    Value(String),
    /// Treat the source as absent and continue with the next one.
    NotFound,
    /// Abort resolution. The reason must not contain the raw input.
    Invalid(String),
}

/// Transforms or vetoes a raw header/environment value.
pub type NormalizeFn = Arc<dyn Fn(&str) -> Normalized + Send + Sync>;

/// Zero-argument producer for a dynamic default.
pub type DefaultProducer = Arc<dyn Fn() -> String + Send + Sync>;

/// Last-resort value for a config argument. Never normalized.
#[derive(Clone)]
pub enum ConfigDefault {
    Static(String),
    /// Invoked on every resolution; the result is never cached.
    Producer(DefaultProducer),
}

impl ConfigDefault {
    pub fn produce(&self) -> String {
        match self {
            ConfigDefault::Static(value) => value.clone(),
            ConfigDefault::Producer(producer) => producer(),
        }
    }
}

impl fmt::Debug for ConfigDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigDefault::Static(_) => f.write_str("Static(..)"),
            ConfigDefault::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// One resolvable configuration value: header, then environment, then default.
#[derive(Clone)]
pub struct ConfigArg {
    name: String,
    header_key: Option<String>,
    env_var: Option<String>,
    default: Option<ConfigDefault>,
    required: bool,
    sensitive: bool,
    normalize: Option<NormalizeFn>,
}

impl ConfigArg {
    /// New required argument with no sources configured.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header_key: None,
            env_var: None,
            default: None,
            required: true,
            sensitive: false,
            normalize: None,
        }
    }

    /// Request header checked first (case-insensitive).
    pub fn header(mut self, key: impl Into<String>) -> Self {
        self.header_key = Some(key.into());
        self
    }

    /// Environment variable checked after the header.
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = Some(name.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(ConfigDefault::Static(value.into()));
        self
    }

    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.default = Some(ConfigDefault::Producer(Arc::new(producer)));
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Shorthand for `required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn normalize<F>(mut self, normalize: F) -> Self
    where
        F: Fn(&str) -> Normalized + Send + Sync + 'static,
    {
        self.normalize = Some(Arc::new(normalize));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header_key(&self) -> Option<&str> {
        self.header_key.as_deref()
    }

    pub fn env_var_name(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    pub fn default_config(&self) -> Option<&ConfigDefault> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Apply the normalizer, or pass the raw value through.
    pub(crate) fn apply_normalize(&self, raw: &str) -> Normalized {
        match &self.normalize {
            Some(normalize) => normalize(raw),
            None => Normalized::Value(raw.to_string()),
        }
    }

    /// Human-readable list of configured sources, used in missing-value errors.
    pub(crate) fn describe_sources(&self) -> String {
        let mut sources = Vec::new();
        if let Some(header) = &self.header_key {
            sources.push(format!("HTTP header '{header}'"));
        }
        if let Some(env_var) = &self.env_var {
            sources.push(format!("environment variable '{env_var}'"));
        }
        if sources.is_empty() {
            return "no sources configured".to_string();
        }
        sources.join(" or ")
    }
}

impl fmt::Debug for ConfigArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigArg")
            .field("name", &self.name)
            .field("header_key", &self.header_key)
            .field("env_var", &self.env_var)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("sensitive", &self.sensitive)
            .field("normalize", &self.normalize.is_some())
            .finish()
    }
}
