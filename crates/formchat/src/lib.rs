//! # formchat
//!
//! Drives form-filling conversations with an OpenAI-compatible chat model.
//!
//! A [`ConversationService`] is bound to one [`Form`] and composes:
//! - a [`prompt::PromptProvider`] that writes the system prompts
//! - a [`ModelClient`] that talks to the chat-completions endpoint
//! - the transcript sanitizer in [`sanitize`]
//! - a [`store::ConversationStore`] that persists finished conversations
//!
//! ## Quick Start
//!
//! ```rust
//! use formchat::sanitize::sanitize_messages;
//! use formchat::{ConversationMarkers, Message};
//!
//! let mut transcript = vec![
//!     Message::user("hello, i want to fill the form"),
//!     Message::assistant("What is your name?"),
//!     Message::user("Ada"),
//!     Message::assistant("Thank you, Ada![END]"),
//!     Message::user("finish"),
//! ];
//!
//! sanitize_messages(&mut transcript, &ConversationMarkers::default());
//! assert_eq!(transcript.len(), 3);
//! assert_eq!(transcript[2].content, "Thank you, Ada!");
//! ```

pub mod error;
pub mod prompt;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod stream;

pub use formchat_client::*;
pub use formchat_common::*;

pub use error::{ConversationError, StoreError};
pub use service::{ConversationService, NextQuestion};
pub use stream::QuestionStream;
