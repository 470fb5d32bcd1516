//! Persisted conversation records and the synthetic conversation markers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::Message;
use crate::form::FormFieldData;

/// Default content of the user message injected to bootstrap a conversation.
pub const DEFAULT_START_MESSAGE: &str = "hello, i want to fill the form";

/// Default content of the user message injected to close a conversation.
pub const DEFAULT_END_MESSAGE: &str = "finish";

/// Default token the model appends, in brackets, once the form is complete.
pub const DEFAULT_END_TOKEN: &str = "END";

/// Sentinel strings injected by the calling application rather than typed by
/// the user or generated freely by the model.
///
/// - `start_message`: user turn sent on the user's behalf to open the flow
/// - `end_message`: user turn sent on the user's behalf to close the flow
/// - `end_token`: the model is told to append `[end_token]` to its final reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMarkers {
    /// Synthetic first user message.
    #[serde(default = "default_start_message")]
    pub start_message: String,
    /// Synthetic last user message.
    #[serde(default = "default_end_message")]
    pub end_message: String,
    /// Completion token, without brackets.
    #[serde(default = "default_end_token")]
    pub end_token: String,
}

fn default_start_message() -> String {
    DEFAULT_START_MESSAGE.to_string()
}

fn default_end_message() -> String {
    DEFAULT_END_MESSAGE.to_string()
}

fn default_end_token() -> String {
    DEFAULT_END_TOKEN.to_string()
}

impl Default for ConversationMarkers {
    fn default() -> Self {
        Self {
            start_message: default_start_message(),
            end_message: default_end_message(),
            end_token: default_end_token(),
        }
    }
}

impl ConversationMarkers {
    /// Creates markers from explicit strings.
    pub fn new(
        start_message: impl Into<String>,
        end_message: impl Into<String>,
        end_token: impl Into<String>,
    ) -> Self {
        Self {
            start_message: start_message.into(),
            end_message: end_message.into(),
            end_token: end_token.into(),
        }
    }

    /// The end token as it appears in assistant replies, e.g. `[END]`.
    #[must_use]
    pub fn bracketed_end_token(&self) -> String {
        format!("[{}]", self.end_token)
    }
}

/// Payload handed to a conversation store to create a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversation {
    /// The form this conversation filled in.
    pub form_id: Uuid,
    /// Generated display name.
    pub name: String,
    /// Field values extracted from the conversation.
    pub form_fields_data: FormFieldData,
    /// Sanitized user/assistant turns.
    pub transcript: Vec<Message>,
}

/// A conversation as stored. Records are only ever created, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// The form this conversation filled in.
    pub form_id: Uuid,
    /// Generated display name.
    pub name: String,
    /// Field values extracted from the conversation.
    pub form_fields_data: FormFieldData,
    /// Sanitized user/assistant turns.
    pub transcript: Vec<Message>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Assigns a fresh id and creation time to a new conversation.
    #[must_use]
    pub fn create(new: NewConversation) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id: new.form_id,
            name: new.name,
            form_fields_data: new.form_fields_data,
            transcript: new.transcript,
            created_at: Utc::now(),
        }
    }
}
