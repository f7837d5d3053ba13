//! Per-request snapshot of headers and the environment view.
use std::{collections::HashMap, env, sync::Arc};

use http::request::Parts;

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvView {
    /// Live process environment.
    #[default]
    Process,
    /// Fixed map, for embedding and tests.
    Fixed(Arc<HashMap<String, String>>),
}

impl EnvView {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvView::Fixed(Arc::new(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        ))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            EnvView::Process => env::var(key).ok(),
            EnvView::Fixed(vars) => vars.get(key).cloned(),
        }
    }
}

/// Read-only inputs for resolving config within a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: Vec<(String, String)>,
    env: EnvView,
}

impl RequestContext {
    pub fn new(env: EnvView) -> Self {
        Self {
            headers: Vec::new(),
            env,
        }
    }

    /// Snapshot the headers of an HTTP request. Non-UTF-8 values are skipped.
    pub fn from_http_parts(parts: Option<&Parts>, env: EnvView) -> Self {
        let headers = parts
            .map(|parts| {
                parts
                    .headers
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|value| (name.as_str().to_string(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { headers, env }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive lookup; the first matching header wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name)
    }

    pub fn env(&self) -> &EnvView {
        &self.env
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }
}
