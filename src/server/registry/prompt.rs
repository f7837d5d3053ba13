use std::sync::Arc;

use rmcp::model::{JsonObject, Prompt, PromptArgument, PromptMessage};

pub type PromptHandler = Arc<dyn Fn(&JsonObject) -> Vec<PromptMessage> + Send + Sync>;

/// A prompt waiting to be registered on a server.
#[derive(Clone)]
pub struct PromptDefinition {
    name: String,
    description: String,
    arguments: Vec<PromptArgument>,
    handler: PromptHandler,
}

impl PromptDefinition {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&JsonObject) -> Vec<PromptMessage> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Arguments advertised in `prompts/list`.
    pub fn arguments(mut self, arguments: Vec<PromptArgument>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Append one advertised argument.
    pub fn argument(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.arguments.push(PromptArgument {
            name: name.into(),
            title: None,
            description: Some(description.into()),
            required: Some(required),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn to_prompt(&self) -> Prompt {
        let arguments = (!self.arguments.is_empty()).then(|| self.arguments.clone());
        Prompt::new(self.name.clone(), Some(self.description.clone()), arguments)
    }

    pub fn render(&self, arguments: &JsonObject) -> Vec<PromptMessage> {
        (self.handler)(arguments)
    }
}

impl std::fmt::Debug for PromptDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::PromptMessageRole;

    use super::*;

    fn echo() -> PromptDefinition {
        PromptDefinition::new("echo", "Echo the topic", |arguments| {
            let topic = arguments
                .get("topic")
                .and_then(|value| value.as_str())
                .unwrap_or("nothing");
            vec![PromptMessage::new_text(PromptMessageRole::User, topic)]
        })
    }

    #[test]
    fn prompt_without_arguments_omits_the_list() {
        assert!(echo().to_prompt().arguments.is_none());
    }

    #[test]
    fn declared_arguments_are_advertised_in_order() {
        let prompt = echo()
            .argument("topic", "What to echo", true)
            .argument("tone", "Optional tone", false)
            .to_prompt();
        let arguments = prompt.arguments.expect("arguments advertised");
        let summary: Vec<_> = arguments
            .iter()
            .map(|arg| (arg.name.as_str(), arg.required))
            .collect();
        assert_eq!(summary, vec![("topic", Some(true)), ("tone", Some(false))]);
    }
}
