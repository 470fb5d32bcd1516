//! Role-tagged chat messages.
//!
//! A conversation is an ordered `Vec<Message>`; the order is the chat turn order
//! and is preserved everywhere it is passed around. Callers own the history and
//! hand the full sequence to every operation.
//!
//! # Roles
//!
//! [`MessageRole`] is a closed set matching the chat-completions wire format:
//!
//! - **System**: instructions steering the model, never shown to the end user
//! - **User**: input from the person filling the form
//! - **Assistant**: model replies
//!
//! Any other role string is rejected when deserializing or parsing.
//!
//! # Examples
//!
//! ```
//! use formchat_common::chat::{Message, MessageRole};
//!
//! let msg: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
//! assert_eq!(msg.role, MessageRole::User);
//!
//! let bad = serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#);
//! assert!(bad.is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The author of a message.
///
/// Serialized to lowercase strings (`"system"`, `"user"`, `"assistant"`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model.
    System,
    /// Input from the end user.
    User,
    /// Replies generated by the model.
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => anyhow::bail!("Unknown message role: {s}"),
        }
    }
}

/// A single chat turn.
///
/// Messages are treated as immutable once sent to the model; transformations
/// such as transcript sanitization produce or edit a separate sequence.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who authored the message.
    pub role: MessageRole,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Creates a message with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Returns `true` if the model authored this message.
    #[must_use]
    pub const fn is_assistant(&self) -> bool {
        matches!(self.role, MessageRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, MessageRole::System);
        assert_eq!(Message::user("u").role, MessageRole::User);

        let msg = Message::assistant("a");
        assert!(msg.is_assistant());
        assert_eq!(msg.content, "a");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("Q1?")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Q1?"}"#);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<Message>(r#"{"role":"function","content":"x"}"#);
        assert!(result.is_err());
        assert!("tool".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_role_round_trips_through_display() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            assert_eq!(role.to_string().parse::<MessageRole>().unwrap(), role);
        }
    }
}
