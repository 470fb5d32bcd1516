//! OpenAI-compatible client implementation.
//!
//! # Examples
//!
//! ```no_run
//! use formchat_client::{ModelClient, OpenAIClient};
//! use formchat_common::{Config, Message};
//!
//! # async fn example() -> Result<(), formchat_client::ClientError> {
//! let config = Config::new("openai", "gpt-4o-mini")
//!     .with_api_key("sk-...")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let client = OpenAIClient::new(config)?;
//! let response = client.chat(&[Message::user("Hello!")]).await?;
//! println!("{}", response.first_content().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - **Authentication errors (401)**: invalid or missing API keys
//! - **Rate limiting (429)**: reported with the `Retry-After` hint, never retried
//! - **Server errors (5xx)**: reported as `ServiceUnavailable`
//! - **Invalid responses**: malformed bodies or stream chunks
//!
//! # Security
//!
//! API keys are held in a `SecretString` and only exposed when building the
//! `Authorization` header.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, warn};
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};

use formchat_common::chat::Message;
use formchat_common::client::Config;

use crate::error::{ClientError, parse_retry_after};
use crate::openai::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use crate::{ModelClient, NoRetryPolicy, TextStream};

/// Client for OpenAI-compatible chat-completions APIs.
///
/// Cheap to clone; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: Arc<SecretString>,
    endpoint: String,
    config: Arc<Config>,
}

// Custom Debug implementation to avoid exposing API key
impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a new client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing, the base URL does not
    /// parse, or the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ClientError::ConfigurationError("API key is required".to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url());
        url::Url::parse(&endpoint).map_err(|e| {
            ClientError::ConfigurationError(format!("Invalid URL '{endpoint}': {e}"))
        })?;

        // None means no timeout
        let client = match config.timeout() {
            Some(timeout) => reqwest::Client::builder().timeout(timeout).build()?,
            None => reqwest::Client::builder().build()?,
        };

        Ok(Self {
            client,
            api_key: Arc::new(api_key),
            endpoint,
            config: Arc::new(config),
        })
    }

    fn request_builder(&self, body: &ChatCompletionRequest) -> reqwest::RequestBuilder {
        self.client
            .post(&self.endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(body)
    }

    /// Converts an event-source failure into a client error, reading the
    /// response body for non-success statuses.
    async fn event_source_error(err: reqwest_eventsource::Error) -> ClientError {
        match err {
            reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
                let retry_after = parse_retry_after(response.headers());
                let body = response.text().await.unwrap_or_default();
                ClientError::from_status(status.as_u16(), body, retry_after)
            }
            reqwest_eventsource::Error::Transport(e) => ClientError::NetworkError(e),
            other => ClientError::EventSourceError(other),
        }
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn config(&self) -> &Config {
        &self.config
    }

    async fn chat(&self, messages: &[Message]) -> Result<ChatCompletionResponse, ClientError> {
        let body = ChatCompletionRequest::new(&self.config, messages, false);

        debug!(
            "Sending chat completion request: model={}, messages={}",
            body.model,
            body.messages.len()
        );

        let response = self.request_builder(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers());
            let error_text = response.text().await.map_err(|e| {
                warn!("Failed to read error response body: {e}");
                ClientError::NetworkError(e)
            })?;

            error!(
                "API request failed with status {}: {}",
                status.as_u16(),
                error_text
            );

            return Err(ClientError::from_status(
                status.as_u16(),
                error_text,
                retry_after,
            ));
        }

        let response_text = response.text().await?;
        debug!("Raw API response: {response_text}");

        Ok(serde_json::from_str(&response_text)?)
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<TextStream, ClientError> {
        let body = ChatCompletionRequest::new(&self.config, messages, true);

        let mut event_source = EventSource::new(self.request_builder(&body)).map_err(|e| {
            ClientError::ConfigurationError(format!("Failed to create event source: {e}"))
        })?;
        event_source.set_retry_policy(Box::new(NoRetryPolicy));

        // Wait for the connection so request failures reach the caller directly
        match event_source.next().await {
            Some(Ok(Event::Open)) => debug!("Stream connection opened"),
            Some(Ok(Event::Message(message))) => {
                warn!("Received stream data before open: {}", message.data);
            }
            Some(Err(e)) => {
                event_source.close();
                let err = Self::event_source_error(e).await;
                error!("Failed to open stream: {err}");
                return Err(err);
            }
            None => {
                return Err(ClientError::InvalidResponse(
                    "Stream closed before opening".to_string(),
                ));
            }
        }

        let stream = futures::stream::unfold(Some(event_source), |state| async move {
            let mut source = state?;
            loop {
                match source.next().await {
                    None => return None,
                    Some(Ok(Event::Open)) => {}
                    Some(Ok(Event::Message(message))) => {
                        // OpenAI sends [DONE] to signal completion
                        if message.data == "[DONE]" {
                            debug!("Stream completed with [DONE] marker");
                            source.close();
                            return None;
                        }

                        match serde_json::from_str::<ChatCompletionChunk>(&message.data) {
                            Ok(chunk) => {
                                if let Some(content) = chunk.content_delta() {
                                    return Some((Ok(content.to_string()), Some(source)));
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse streaming chunk: {e}");
                                debug!("Problematic chunk data: {}", message.data);
                                source.close();
                                return Some((Err(ClientError::SerializationError(e)), None));
                            }
                        }
                    }
                    Some(Err(reqwest_eventsource::Error::StreamEnded)) => {
                        debug!("Stream ended normally");
                        return None;
                    }
                    Some(Err(e)) => {
                        source.close();
                        let err = Self::event_source_error(e).await;
                        error!("Stream error: {err}");
                        return Some((Err(err), None));
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use formchat_common::chat::MessageRole;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(base_url: &str) -> Config {
        Config::new("openai", "gpt-4")
            .with_api_key("test-key")
            .with_base_url(base_url)
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_677_652_288,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 20,
                "total_tokens": 30
            }
        })
    }

    fn sse_body(fragments: &[&str]) -> String {
        let mut body = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            let delta = if i == 0 {
                serde_json::json!({ "role": "assistant", "content": fragment })
            } else {
                serde_json::json!({ "content": fragment })
            };
            let chunk = serde_json::json!({
                "id": "chatcmpl-123",
                "object": "chat.completion.chunk",
                "created": 1_677_652_288,
                "model": "gpt-4",
                "choices": [{ "index": 0, "delta": delta, "finish_reason": null }]
            });
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[test]
    fn test_missing_api_key() {
        let config = Config::new("openai", "gpt-4");
        let err = OpenAIClient::new(config).unwrap_err();
        assert!(matches!(err, ClientError::ConfigurationError(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = Config::new("openai", "gpt-4")
            .with_api_key("k")
            .with_base_url("not a url");
        let err = OpenAIClient::new(config).unwrap_err();
        assert!(matches!(err, ClientError::ConfigurationError(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = OpenAIClient::new(create_test_config("http://localhost:1")).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-key"));
    }

    #[tokio::test]
    async fn test_successful_chat_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "stream": false,
                "messages": [{ "role": "user", "content": "Hello" }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("Hello! How can I help you today?")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let response = client.chat(&[Message::user("Hello")]).await.unwrap();

        assert_eq!(response.model, "gpt-4");
        assert_eq!(
            response.first_content(),
            Some("Hello! How can I help you today?")
        );
        assert_eq!(response.choices[0].message.role, MessageRole::Assistant);
        assert_eq!(response.usage.unwrap().total_tokens, 30);
    }

    #[tokio::test]
    async fn test_authentication_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Invalid API key",
                    "type": "invalid_request_error",
                    "code": "invalid_api_key"
                }
            })))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let err = client.chat(&[Message::user("Hello")]).await.unwrap_err();

        assert!(err.is_authentication_error());
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_rate_limit_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "20")
                    .set_body_json(serde_json::json!({
                        "error": { "message": "Rate limit exceeded", "type": "rate_limit_error" }
                    })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let err = client.chat(&[Message::user("Hello")]).await.unwrap_err();

        assert!(err.is_rate_limit_error());
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(20)));
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "Internal server error", "type": "server_error" }
            })))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let err = client.chat(&[Message::user("Hello")]).await.unwrap_err();

        assert!(matches!(err, ClientError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_response_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let err = client.chat(&[Message::user("Hello")]).await.unwrap_err();

        assert!(matches!(err, ClientError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_streaming_chat_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse_body(&["What ", "is your ", "name?"]), "text/event-stream"),
            )
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let stream = client.chat_stream(&[Message::user("Hello")]).await.unwrap();

        let fragments: Vec<String> = stream.map(|f| f.expect("fragment")).collect().await;
        assert_eq!(fragments, vec!["What ", "is your ", "name?"]);
    }

    #[tokio::test]
    async fn test_streaming_auth_error_surfaces_from_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid API key" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let Err(err) = client.chat_stream(&[Message::user("Hello")]).await else {
            unreachable!("stream should not open");
        };

        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn test_streaming_malformed_chunk_ends_stream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: {oops\n\n",
                "text/event-stream",
            ))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new(create_test_config(&mock_server.uri())).unwrap();
        let results: Vec<Result<String, ClientError>> = client
            .chat_stream(&[Message::user("Hello")])
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "Hi");
        assert!(matches!(results[1], Err(ClientError::SerializationError(_))));
    }
}
