//! `notes` module: an in-memory note list with read, write and destructive tools.
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rmcp::model::{CallToolResult, Content, ErrorData, PromptMessage, PromptMessageRole};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    lib::errors::{RegistryError, INVALID_ARGUMENTS_ERROR},
    server::registry::{NoArguments, PromptDefinition, Registry, ResourceDefinition, ToolDefinition},
};

pub const MODULE: &str = "notes";
pub const NOTES_URI: &str = "notes://all";
const MAX_NOTE_LEN: usize = 2000;

/// A stored note.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Note {
    pub id: u64,
    pub text: String,
    pub created_at: String,
}

/// Shared, process-local note storage.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    inner: Arc<Mutex<NoteState>>,
}

#[derive(Debug, Default)]
struct NoteState {
    next_id: u64,
    notes: Vec<Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the list half-written, so recover it.
    fn state(&self) -> MutexGuard<'_, NoteState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, text: &str) -> Note {
        let mut state = self.state();
        state.next_id += 1;
        let note = Note {
            id: state.next_id,
            text: text.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        state.notes.push(note.clone());
        note
    }

    pub fn list(&self) -> Vec<Note> {
        self.state().notes.clone()
    }

    /// Remove every note and return how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.state();
        let removed = state.notes.len();
        state.notes.clear();
        removed
    }
}

/// Input for `list_notes`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListNotesRequest {
    /// Return at most this many of the most recent notes.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Input for `add_note`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddNoteRequest {
    /// Note body (1-2000 characters).
    pub text: String,
}

fn json_result(value: serde_json::Value) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string_pretty(&value)
        .map_err(|err| ErrorData::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn invalid_text(reason: &str) -> ErrorData {
    INVALID_ARGUMENTS_ERROR
        .builder()
        .retryable(false)
        .details(json!({ "field": "text", "reason": reason }))
        .build()
        .unwrap_or_else(|_| ErrorData::invalid_params(INVALID_ARGUMENTS_ERROR.message, None))
}

/// Register the notes tools, prompt and resource under [`MODULE`].
pub fn register(registry: &mut Registry, store: &NoteStore) -> Result<(), RegistryError> {
    let list_store = store.clone();
    let add_store = store.clone();
    let clear_store = store.clone();
    let prompt_store = store.clone();
    let resource_store = store.clone();

    registry
        .add_tool(
            MODULE,
            ToolDefinition::new::<ListNotesRequest, _, _>(
                "list_notes",
                "List stored notes, newest last",
                move |call| {
                    let store = list_store.clone();
                    async move {
                        let request: ListNotesRequest = call.parse()?;
                        let mut notes = store.list();
                        if let Some(limit) = request.limit {
                            let skip = notes.len().saturating_sub(limit);
                            notes.drain(..skip);
                        }
                        json_result(json!({ "count": notes.len(), "notes": notes }))
                    }
                },
            )
            .read_only(true)
            .idempotent(true),
        )?
        .add_tool(
            MODULE,
            ToolDefinition::new::<AddNoteRequest, _, _>(
                "add_note",
                "Store a new note",
                move |call| {
                    let store = add_store.clone();
                    async move {
                        let request: AddNoteRequest = call.parse()?;
                        let text = request.text.trim();
                        if text.is_empty() {
                            return Err(invalid_text("text must not be empty"));
                        }
                        if text.chars().count() > MAX_NOTE_LEN {
                            return Err(invalid_text("text exceeds 2000 characters"));
                        }
                        let note = store.add(text);
                        info!(target: "mcp_extensions::runtime", note_id = note.id, "Stored note");
                        json_result(json!({ "note": note }))
                    }
                },
            ),
        )?
        .add_tool(
            MODULE,
            ToolDefinition::new::<NoArguments, _, _>(
                "clear_notes",
                "Delete every stored note",
                move |_call| {
                    let store = clear_store.clone();
                    async move {
                        let removed = store.clear();
                        info!(target: "mcp_extensions::runtime", removed, "Cleared notes");
                        json_result(json!({ "removed": removed }))
                    }
                },
            )
            .destructive(true)
            .idempotent(true),
        )?
        .add_prompt(
            MODULE,
            PromptDefinition::new(
                "summarize_notes",
                "Ask the model to summarize the stored notes",
                move |arguments| {
                    let style = arguments
                        .get("style")
                        .and_then(|value| value.as_str())
                        .unwrap_or("a short bulleted list");
                    let notes = prompt_store.list();
                    let body = if notes.is_empty() {
                        "There are no notes yet.".to_string()
                    } else {
                        notes
                            .iter()
                            .map(|note| format!("- [{}] {}", note.id, note.text))
                            .collect::<Vec<_>>()
                            .join("\n")
                    };
                    vec![PromptMessage::new_text(
                        PromptMessageRole::User,
                        format!("Summarize these notes as {style}:\n{body}"),
                    )]
                },
            )
            .argument(
                "style",
                "How the summary should be shaped, e.g. \"one paragraph\"",
                false,
            ),
        )?
        .add_resource(
            MODULE,
            ResourceDefinition::new(
                NOTES_URI,
                "Every stored note as JSON",
                "application/json",
                move || {
                    serde_json::to_string_pretty(&resource_store.list())
                        .map_err(|err| ErrorData::internal_error(err.to_string(), None))
                },
            )
            .named("notes"),
        )?;
    Ok(())
}
