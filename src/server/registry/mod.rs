//! Explicit registration of tools, prompts and resources under module tags.
//!
//! A `Registry` is an owned value: build one per module (or one per crate),
//! then hand it to `McpServerBuilder::register_module`. Nothing here is global.
use std::{collections::BTreeSet, sync::Arc};

use crate::{
    lib::errors::RegistryError,
    server::filters::{ToolDescriptor, ToolHints},
};

mod prompt;
mod resource;
mod tool;

pub use prompt::{PromptDefinition, PromptHandler};
pub use resource::{ResourceDefinition, ResourceHandler};
pub use tool::{NoArguments, ToolCall, ToolDefinition, ToolFuture, ToolHandler};

/// Reduce a module tag to its last path segment (`my_crate::tools::notes` -> `notes`).
pub fn normalize_module(module: &str) -> String {
    let trimmed = module.trim();
    trimmed
        .rsplit("::")
        .next()
        .and_then(|segment| segment.rsplit('.').next())
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Tools, prompts and resources grouped by module tag.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tools: Vec<(String, ToolDefinition)>,
    prompts: Vec<(String, PromptDefinition)>,
    resources: Vec<(String, ResourceDefinition)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tool(
        &mut self,
        module: &str,
        tool: ToolDefinition,
    ) -> Result<&mut Self, RegistryError> {
        let module = checked_module(module)?;
        if self.tools.iter().any(|(_, t)| t.name() == tool.name()) {
            return Err(RegistryError::DuplicateTool {
                name: tool.name().to_string(),
            });
        }
        self.tools.push((module, tool));
        Ok(self)
    }

    pub fn add_prompt(
        &mut self,
        module: &str,
        prompt: PromptDefinition,
    ) -> Result<&mut Self, RegistryError> {
        let module = checked_module(module)?;
        if self.prompts.iter().any(|(_, p)| p.name() == prompt.name()) {
            return Err(RegistryError::DuplicatePrompt {
                name: prompt.name().to_string(),
            });
        }
        self.prompts.push((module, prompt));
        Ok(self)
    }

    pub fn add_resource(
        &mut self,
        module: &str,
        resource: ResourceDefinition,
    ) -> Result<&mut Self, RegistryError> {
        let module = checked_module(module)?;
        if self.resources.iter().any(|(_, r)| r.uri() == resource.uri()) {
            return Err(RegistryError::DuplicateResource {
                uri: resource.uri().to_string(),
            });
        }
        self.resources.push((module, resource));
        Ok(self)
    }

    /// Every module tag that owns at least one asset, sorted.
    pub fn modules(&self) -> Vec<String> {
        let tags: BTreeSet<&String> = self
            .tools
            .iter()
            .map(|(m, _)| m)
            .chain(self.prompts.iter().map(|(m, _)| m))
            .chain(self.resources.iter().map(|(m, _)| m))
            .collect();
        tags.into_iter().cloned().collect()
    }

    pub fn tools_for<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a ToolDefinition> {
        self.tools
            .iter()
            .filter(move |(m, _)| m == module)
            .map(|(_, t)| t)
    }

    pub fn prompts_for<'a>(
        &'a self,
        module: &'a str,
    ) -> impl Iterator<Item = &'a PromptDefinition> {
        self.prompts
            .iter()
            .filter(move |(m, _)| m == module)
            .map(|(_, p)| p)
    }

    pub fn resources_for<'a>(
        &'a self,
        module: &'a str,
    ) -> impl Iterator<Item = &'a ResourceDefinition> {
        self.resources
            .iter()
            .filter(move |(m, _)| m == module)
            .map(|(_, r)| r)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

fn checked_module(module: &str) -> Result<String, RegistryError> {
    let module = normalize_module(module);
    if module.is_empty() {
        return Err(RegistryError::EmptyModule);
    }
    Ok(module)
}

pub type ToolPredicate = Arc<dyn Fn(&ToolDefinition) -> bool + Send + Sync>;
pub type ArgExclusionFn = Arc<dyn Fn(&ToolDefinition) -> Vec<String> + Send + Sync>;

/// Per-module tweaks applied while copying a registry into a server.
#[derive(Clone, Default)]
pub struct RegistrationOptions {
    exclude_args: Vec<String>,
    tool_filter: Option<ToolPredicate>,
    arg_exclusion: Option<ArgExclusionFn>,
}

impl RegistrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments supplied by the server (usually resolved config) and hidden
    /// from every tool's input schema.
    pub fn exclude_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_args.extend(names.into_iter().map(Into::into));
        self
    }

    /// Registration-time predicate; tools it rejects are never registered.
    pub fn tool_filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ToolDefinition) -> bool + Send + Sync + 'static,
    {
        self.tool_filter = Some(Arc::new(predicate));
        self
    }

    /// Per-tool argument exclusions, added to the static list.
    pub fn arg_exclusion<F>(mut self, exclusion: F) -> Self
    where
        F: Fn(&ToolDefinition) -> Vec<String> + Send + Sync + 'static,
    {
        self.arg_exclusion = Some(Arc::new(exclusion));
        self
    }

    /// `None` when the tool is filtered out; otherwise the tool with its
    /// excluded arguments stripped.
    pub(crate) fn apply(&self, tool: &ToolDefinition) -> Option<ToolDefinition> {
        if let Some(predicate) = &self.tool_filter {
            if !predicate(tool) {
                return None;
            }
        }
        let mut excluded = self.exclude_args.clone();
        if let Some(exclusion) = &self.arg_exclusion {
            excluded.extend(exclusion(tool));
        }
        if excluded.is_empty() {
            return Some(tool.clone());
        }
        Some(tool.without_args(&excluded))
    }
}

impl std::fmt::Debug for RegistrationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationOptions")
            .field("exclude_args", &self.exclude_args)
            .field("tool_filter", &self.tool_filter.is_some())
            .field("arg_exclusion", &self.arg_exclusion.is_some())
            .finish()
    }
}

/// A tool as held by a built server: definition plus filter metadata.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    definition: ToolDefinition,
    descriptor: ToolDescriptor,
}

impl RegisteredTool {
    pub fn new(module: &str, definition: ToolDefinition) -> Self {
        let descriptor = ToolDescriptor::new(definition.name())
            .with_module(module)
            .with_hints(definition.hints());
        Self {
            definition,
            descriptor,
        }
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn hints(&self) -> ToolHints {
        self.definition.hints()
    }
}

impl AsRef<ToolDescriptor> for RegisteredTool {
    fn as_ref(&self) -> &ToolDescriptor {
        &self.descriptor
    }
}
