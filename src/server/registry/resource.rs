use std::sync::Arc;

use rmcp::model::{AnnotateAble, ErrorData, RawResource, Resource};

pub type ResourceHandler = Arc<dyn Fn() -> Result<String, ErrorData> + Send + Sync>;

/// A static-URI resource waiting to be registered on a server.
#[derive(Clone)]
pub struct ResourceDefinition {
    uri: String,
    name: String,
    description: String,
    mime_type: String,
    handler: ResourceHandler,
}

impl ResourceDefinition {
    pub fn new<F>(
        uri: impl Into<String>,
        description: impl Into<String>,
        mime_type: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn() -> Result<String, ErrorData> + Send + Sync + 'static,
    {
        let uri = uri.into();
        Self {
            name: uri.clone(),
            uri,
            description: description.into(),
            mime_type: mime_type.into(),
            handler: Arc::new(handler),
        }
    }

    /// Display name; defaults to the URI.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_resource(&self) -> Resource {
        let mut raw = RawResource::new(self.uri.clone(), self.name.clone());
        raw.description = Some(self.description.clone());
        raw.mime_type = Some(self.mime_type.clone());
        raw.no_annotation()
    }

    pub fn read(&self) -> Result<String, ErrorData> {
        (self.handler)()
    }
}

impl std::fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("uri", &self.uri)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}
