use rmcp::model::{Tool, ToolAnnotations};

/// Boolean capability hints declared when a tool is registered.
///
/// `None` means the hint was not declared; filters decide how to read absence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolHints {
    pub read_only: Option<bool>,
    pub destructive: Option<bool>,
    pub idempotent: Option<bool>,
    pub open_world: Option<bool>,
}

impl ToolHints {
    pub fn from_annotations(annotations: Option<&ToolAnnotations>) -> Self {
        annotations
            .map(|annotations| Self {
                read_only: annotations.read_only_hint,
                destructive: annotations.destructive_hint,
                idempotent: annotations.idempotent_hint,
                open_world: annotations.open_world_hint,
            })
            .unwrap_or_default()
    }

    /// `None` when no hint is declared, so the tool is listed without annotations.
    pub fn to_annotations(&self, title: Option<String>) -> Option<ToolAnnotations> {
        if *self == Self::default() && title.is_none() {
            return None;
        }
        let mut annotations = ToolAnnotations::default();
        annotations.title = title;
        annotations.read_only_hint = self.read_only;
        annotations.destructive_hint = self.destructive;
        annotations.idempotent_hint = self.idempotent;
        annotations.open_world_hint = self.open_world;
        Some(annotations)
    }

    /// Only an explicit `true` counts as read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only == Some(true)
    }

    /// Only an explicit `true` counts as destructive.
    pub fn is_destructive(&self) -> bool {
        self.destructive == Some(true)
    }
}

/// What the visibility filters know about a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    /// Origin module tag supplied at registration.
    pub module: Option<String>,
    pub hints: ToolHints,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            hints: ToolHints::default(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_hints(mut self, hints: ToolHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn from_tool(tool: &Tool, module: Option<&str>) -> Self {
        Self {
            name: tool.name.to_string(),
            module: module.map(str::to_string),
            hints: ToolHints::from_annotations(tool.annotations.as_ref()),
        }
    }
}

impl AsRef<ToolDescriptor> for ToolDescriptor {
    fn as_ref(&self) -> &ToolDescriptor {
        self
    }
}
