//! # formchat-common
//!
//! Common types shared by the formchat crates:
//! - Role-tagged chat messages
//! - Form definitions and the field data extracted from a conversation
//! - Persisted conversation records and the synthetic conversation markers
//! - Client configuration for the chat-completions endpoint
//!
//! ## Example
//!
//! ```
//! use formchat_common::{Form, FormField, FieldType, Message};
//!
//! let form = Form::new("Contact details")
//!     .with_field(FormField::new("email", "Email address", FieldType::Email).required());
//!
//! let history = vec![
//!     Message::user("hello, i want to fill the form"),
//!     Message::assistant("What is your email address?"),
//! ];
//!
//! assert_eq!(form.fields.len(), 1);
//! assert_eq!(history.len(), 2);
//! ```

/// Chat message and role types.
pub mod chat;
/// Client configuration for the chat-completions endpoint.
pub mod client;
/// Persisted conversation records and conversation markers.
pub mod conversation;
/// Form definitions and extracted field data.
pub mod form;

pub use chat::{Message, MessageRole};
pub use client::Config;
pub use conversation::{ConversationMarkers, ConversationRecord, NewConversation};
pub use form::{FieldType, Form, FormField, FormFieldData};
