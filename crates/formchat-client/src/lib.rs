//! # formchat-client
//!
//! Client library for OpenAI-compatible chat-completions endpoints.
//!
//! The [`ModelClient`] trait sends an ordered list of role-tagged messages and
//! returns either a fully materialized response or a stream of text fragments.
//! [`OpenAIClient`] implements it over HTTP, using server-sent events for
//! streamed replies.
//!
//! Requests are sent exactly once: there is no caching and no retry.
//!
//! ## Example
//!
//! ```no_run
//! use formchat_client::{Completion, ModelClient, OpenAIClient};
//! use formchat_common::{Config, Message};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), formchat_client::ClientError> {
//! let config = Config::new("openai", "gpt-4o-mini").with_api_key("sk-...");
//! let client = OpenAIClient::new(config)?;
//!
//! let messages = vec![
//!     Message::system("Ask the user for their name."),
//!     Message::user("hello, i want to fill the form"),
//! ];
//!
//! match client.complete(&messages, true).await? {
//!     Completion::Streaming(mut stream) => {
//!         while let Some(fragment) = stream.next().await {
//!             print!("{}", fragment?);
//!         }
//!     }
//!     Completion::Response(response) => {
//!         println!("{}", response.first_content().unwrap_or_default());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use reqwest_eventsource::retry::RetryPolicy;

use formchat_common::{Config, Message};

pub mod error;
pub mod openai;

pub use error::ClientError;
pub use openai::{ChatCompletionResponse, OpenAIClient};

/// Text fragments of a streamed reply, in generation order.
///
/// The stream is finite and can be consumed once; it ends after the last
/// fragment or after the first error.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Result of [`ModelClient::complete`].
pub enum Completion {
    /// Incrementally delivered reply.
    Streaming(TextStream),
    /// Fully materialized reply.
    Response(ChatCompletionResponse),
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming(_) => f.write_str("Completion::Streaming(..)"),
            Self::Response(response) => {
                f.debug_tuple("Completion::Response").field(response).finish()
            }
        }
    }
}

/// Trait for chat-completion clients.
///
/// Implementations must be thread-safe so one instance can be shared by every
/// conversation in the process.
#[must_use = "ModelClient must be used to make requests"]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Get the client's configuration.
    fn config(&self) -> &Config;

    /// Request a buffered completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, the API answers with a
    /// non-success status, or the body cannot be parsed.
    async fn chat(&self, messages: &[Message]) -> Result<ChatCompletionResponse, ClientError>;

    /// Request a streamed completion.
    ///
    /// The connection is established before this returns, so authentication
    /// and rate-limit failures are reported here rather than inside the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    async fn chat_stream(&self, messages: &[Message]) -> Result<TextStream, ClientError>;

    /// Request a completion, streamed or buffered.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`ModelClient::chat`] or
    /// [`ModelClient::chat_stream`].
    async fn complete(
        &self,
        messages: &[Message],
        stream: bool,
    ) -> Result<Completion, ClientError> {
        if stream {
            self.chat_stream(messages).await.map(Completion::Streaming)
        } else {
            self.chat(messages).await.map(Completion::Response)
        }
    }
}

/// Event-source retry policy that never reconnects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetryPolicy;

impl RetryPolicy for NoRetryPolicy {
    fn retry(
        &self,
        _error: &reqwest_eventsource::Error,
        _last_retry: Option<(usize, Duration)>,
    ) -> Option<Duration> {
        None
    }

    fn set_reconnection_time(&mut self, _duration: Duration) {}
}
