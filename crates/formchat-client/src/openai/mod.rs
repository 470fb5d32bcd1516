//! OpenAI chat-completions wire types and client implementation.
//!
//! These types follow the OpenAI chat completions API and work with any
//! compatible endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

use formchat_common::chat::{Message, MessageRole};
use formchat_common::client::Config;

pub mod client;
pub use client::OpenAIClient;

/// OpenAI-compatible message format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct OpenAIMessage {
    /// The role of the message author.
    pub role: MessageRole,
    /// The text content (may be null in responses).
    #[builder(default)]
    #[serde(default)]
    pub content: Option<String>,
    /// Fields this crate does not model, such as `refusal` or `tool_calls`.
    #[builder(default)]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&Message> for OpenAIMessage {
    fn from(message: &Message) -> Self {
        Self::builder()
            .role(message.role)
            .content(Some(message.content.clone()))
            .build()
    }
}

/// Request body for `POST /chat/completions`.
///
/// # Examples
///
/// ```
/// use formchat_client::openai::ChatCompletionRequest;
///
/// let request = ChatCompletionRequest::builder()
///     .model("gpt-4o-mini".to_string())
///     .messages(vec![])
///     .temperature(Some(0.2))
///     .build();
///
/// assert_eq!(request.stream, Some(false));
/// ```
#[derive(Debug, Clone, Serialize, TypedBuilder)]
pub struct ChatCompletionRequest {
    /// The model identifier.
    pub model: String,
    /// The conversation messages in OpenAI format.
    pub messages: Vec<OpenAIMessage>,
    /// Maximum tokens to generate.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature 0.0 to 2.0.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Whether to stream the response.
    #[builder(default = Some(false))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    /// Builds a request for `messages` using the model and defaults in `config`.
    #[must_use]
    pub fn new(config: &Config, messages: &[Message], stream: bool) -> Self {
        Self::builder()
            .model(config.model.clone())
            .messages(messages.iter().map(OpenAIMessage::from).collect())
            .max_tokens(config.max_tokens)
            .temperature(config.temperature)
            .stream(Some(stream))
            .build()
    }
}

/// A single choice from a chat completion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    /// The index of this choice in the response array.
    #[serde(default)]
    pub index: u32,
    /// The generated message for this choice.
    pub message: OpenAIMessage,
    /// Why generation stopped for this choice.
    ///
    /// Common values: "stop", "length", "content_filter"
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Undeclared fields, such as `logprobs`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token usage statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated.
    pub completion_tokens: u32,
    /// Prompt plus completion.
    pub total_tokens: u32,
    /// Provider-specific breakdowns.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response from a buffered chat completion request.
///
/// Fields without a typed counterpart (`system_fingerprint`, `service_tier`,
/// and so on) are kept in `extra`, so the response serializes back to what
/// the API sent.
///
/// # Examples
///
/// ```
/// # use formchat_client::openai::ChatCompletionResponse;
/// let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
///     "id": "chatcmpl-1",
///     "object": "chat.completion",
///     "created": 1_677_652_288,
///     "model": "gpt-4o-mini",
///     "choices": [{
///         "index": 0,
///         "message": { "role": "assistant", "content": "What is your name?" },
///         "finish_reason": "stop"
///     }]
/// })).unwrap();
///
/// assert_eq!(response.first_content(), Some("What is your name?"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Unique identifier for this completion.
    #[serde(default)]
    pub id: String,
    /// Object type, typically "chat.completion".
    #[serde(default)]
    pub object: String,
    /// Unix timestamp of when the completion was created.
    #[serde(default)]
    pub created: u64,
    /// The model that generated this completion.
    pub model: String,
    /// Generated completions.
    pub choices: Vec<ChatChoice>,
    /// Token usage statistics, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Undeclared top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatCompletionResponse {
    /// The first choice's message content, if present.
    #[must_use]
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Incremental message update in a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAIMessageDelta {
    /// The role (only present in the first chunk).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    /// Text added by this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A single choice from a streamed chunk.
#[derive(Debug, Deserialize)]
pub struct ChatStreamChoice {
    /// The index of this choice in the response array.
    #[serde(default)]
    pub index: u32,
    /// Incremental message delta.
    #[serde(default)]
    pub delta: OpenAIMessageDelta,
    /// Why generation stopped (final chunk only).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    /// Identifier shared by all chunks of the stream.
    #[serde(default)]
    pub id: String,
    /// The model generating this stream.
    #[serde(default)]
    pub model: String,
    /// Delta choices.
    #[serde(default)]
    pub choices: Vec<ChatStreamChoice>,
}

impl ChatCompletionChunk {
    /// The non-empty text carried by the first choice, if any.
    #[must_use]
    pub fn content_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_request_from_config() {
        let config = Config::new("openai", "gpt-4o")
            .with_temperature(0.3)
            .with_max_tokens(256);
        let messages = vec![Message::system("be brief"), Message::user("hi")];

        let request = ChatCompletionRequest::new(&config, &messages, true);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_request_omits_unset_options() {
        let request = ChatCompletionRequest::new(&Config::default(), &[], false);
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_keeps_undeclared_fields() {
        let body = serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_677_652_288,
            "model": "gpt-4o-mini",
            "system_fingerprint": "fp_1",
            "service_tier": "default",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Q?", "refusal": null },
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 5,
                "completion_tokens": 2,
                "total_tokens": 7,
                "completion_tokens_details": { "reasoning_tokens": 0 }
            }
        });

        let response: ChatCompletionResponse = serde_json::from_value(body.clone()).unwrap();

        assert_eq!(response.first_content(), Some("Q?"));
        assert_eq!(response.extra["system_fingerprint"], "fp_1");
        assert_eq!(serde_json::to_value(&response).unwrap(), body);
    }

    #[test]
    fn test_request_message_has_no_extra_keys() {
        let message = OpenAIMessage::from(&Message::user("hi"));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hi" }));
    }

    #[test]
    fn test_first_content_without_choices() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"model":"m","choices":[]}"#).unwrap();
        assert_eq!(response.first_content(), None);
    }

    #[test]
    fn test_chunk_content_delta_skips_empty() {
        let role_only: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#,
        )
        .unwrap();
        assert_eq!(role_only.content_delta(), None);

        let text: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{"content":"Hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(text.content_delta(), Some("Hi"));

        let finished: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(finished.content_delta(), None);
    }
}
