use std::fmt;
use std::sync::Arc;

use log::{debug, error, info};

use formchat_client::{ChatCompletionResponse, Completion, ModelClient};
use formchat_common::{
    ConversationMarkers, ConversationRecord, Form, FormFieldData, Message, NewConversation,
};

use crate::error::{ConversationError, PersistenceFailure, ResponseShapeError};
use crate::prompt::{FormPromptBuilder, PromptProvider};
use crate::sanitize::sanitize_messages;
use crate::store::ConversationStore;
use crate::stream::QuestionStream;

/// The assistant's next turn, as returned by
/// [`ConversationService::get_next_question`].
pub enum NextQuestion {
    /// Fragments delivered as the model generates them.
    Streaming(QuestionStream),
    /// The model's response, unmodified.
    Response(ChatCompletionResponse),
}

impl fmt::Debug for NextQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming(stream) => {
                f.debug_tuple("NextQuestion::Streaming").field(stream).finish()
            }
            Self::Response(response) => {
                f.debug_tuple("NextQuestion::Response").field(response).finish()
            }
        }
    }
}

/// Drives a form-filling conversation against a chat-completions model.
///
/// Stateless between calls: every operation receives the full message
/// history. One service can serve any number of conversations for its form.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use formchat::{ConversationService, NextQuestion, store::MemoryStore};
/// use formchat_client::OpenAIClient;
/// use formchat_common::{Config, FieldType, Form, FormField, Message};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let form = Form::new("Contact")
///     .with_field(FormField::new("email", "Email", FieldType::Email).required());
/// let client = OpenAIClient::new(Config::new("openai", "gpt-4o-mini").with_api_key("sk-..."))?;
///
/// let service = ConversationService::new(
///     Arc::new(form),
///     Arc::new(client),
///     Arc::new(MemoryStore::new()),
/// );
///
/// let history = vec![Message::user("hello, i want to fill the form")];
/// if let NextQuestion::Streaming(mut stream) = service.get_next_question(&history, true).await? {
///     while let Some(fragment) = stream.next().await {
///         print!("{}", fragment?);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConversationService {
    form: Arc<Form>,
    client: Arc<dyn ModelClient>,
    store: Arc<dyn ConversationStore>,
    prompts: Option<Arc<dyn PromptProvider>>,
    markers: ConversationMarkers,
}

impl fmt::Debug for ConversationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationService")
            .field("form", &self.form.name)
            .field("model", &self.client.config().model)
            .field("custom_prompts", &self.prompts.is_some())
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

impl ConversationService {
    /// Creates a service with the default markers and prompts.
    pub fn new(
        form: Arc<Form>,
        client: Arc<dyn ModelClient>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            form,
            client,
            store,
            prompts: None,
            markers: ConversationMarkers::default(),
        }
    }

    /// Uses different conversation markers.
    ///
    /// The default prompts pick these up; a custom provider is responsible
    /// for its own wording.
    #[must_use]
    pub fn with_markers(mut self, markers: ConversationMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Replaces the default [`FormPromptBuilder`].
    #[must_use]
    pub fn with_prompts(mut self, prompts: Arc<dyn PromptProvider>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    #[must_use]
    pub fn form(&self) -> &Form {
        &self.form
    }

    #[must_use]
    pub const fn markers(&self) -> &ConversationMarkers {
        &self.markers
    }

    fn prompts(&self) -> Arc<dyn PromptProvider> {
        self.prompts.clone().unwrap_or_else(|| {
            Arc::new(FormPromptBuilder::new(
                Arc::clone(&self.form),
                self.markers.clone(),
            ))
        })
    }

    /// Asks the model for the assistant's next turn.
    ///
    /// The flow prompt is prepended to `messages`. With `stream` the reply is
    /// delivered fragment by fragment; otherwise the response is returned
    /// exactly as the API sent it.
    ///
    /// # Errors
    ///
    /// Transport faults are returned unchanged as [`ConversationError::Client`].
    pub async fn get_next_question(
        &self,
        messages: &[Message],
        stream: bool,
    ) -> Result<NextQuestion, ConversationError> {
        let request = with_system_prompt(self.prompts().conversation_flow_prompt(), messages);
        debug!(
            "Requesting next question for form {} ({} messages, stream={stream})",
            self.form.id,
            messages.len()
        );

        match self.client.complete(&request, stream).await {
            Ok(Completion::Streaming(upstream)) => {
                Ok(NextQuestion::Streaming(QuestionStream::forward(upstream)))
            }
            Ok(Completion::Response(response)) => Ok(NextQuestion::Response(response)),
            Err(e) => {
                error!("Failed to get next question: {e}");
                Err(e.into())
            }
        }
    }

    /// Extracts the field values collected in a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ExtractionFailed`] if the request fails or
    /// the reply is empty, and [`ConversationError::ParseFailed`] if the reply
    /// is not a JSON object.
    pub async fn get_form_fields_data_from_conversation(
        &self,
        messages: &[Message],
    ) -> Result<FormFieldData, ConversationError> {
        let request = with_system_prompt(self.prompts().form_fields_data_prompt(), messages);

        let response = self.client.chat(&request).await.map_err(|e| {
            error!("Form data extraction request failed: {e}");
            ConversationError::ExtractionFailed(e.into())
        })?;

        let content = response.first_content().ok_or_else(|| {
            error!("Form data extraction returned no content");
            ConversationError::ExtractionFailed(ResponseShapeError::MissingContent.into())
        })?;

        serde_json::from_str::<FormFieldData>(content).map_err(|e| {
            error!("Failed to parse form data from model output: {e}");
            debug!("Unparsable form data: {content}");
            ConversationError::ParseFailed(e)
        })
    }

    /// Asks the model for a short display name.
    ///
    /// Only the naming prompt is sent; the transcript is not.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::NamingFailed`] on any request failure or
    /// an empty reply.
    pub async fn generate_conversation_name(
        &self,
        form_field_data: &FormFieldData,
    ) -> Result<String, ConversationError> {
        let request = [self.prompts().conversation_name_prompt(form_field_data)];

        let response = self.client.chat(&request).await.map_err(|e| {
            error!("Conversation naming request failed: {e}");
            ConversationError::NamingFailed(e.into())
        })?;

        response
            .first_content()
            .map(ToString::to_string)
            .ok_or_else(|| {
                error!("Conversation naming returned no content");
                ConversationError::NamingFailed(ResponseShapeError::MissingContent.into())
            })
    }

    /// Strips the conversation markers from a transcript.
    ///
    /// See [`crate::sanitize::sanitize_messages`] for the rules.
    #[must_use]
    pub fn sanitize_conversation_messages(&self, mut messages: Vec<Message>) -> Vec<Message> {
        sanitize_messages(&mut messages, &self.markers);
        messages
    }

    /// Extracts, names, sanitizes and stores a finished conversation.
    ///
    /// Each call creates a new record, even for an identical transcript.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::PersistenceFailed`] if any step fails;
    /// nothing is stored in that case.
    pub async fn save_conversation(
        &self,
        messages: Vec<Message>,
    ) -> Result<ConversationRecord, ConversationError> {
        match self.try_save(messages).await {
            Ok(record) => {
                info!(
                    "Saved conversation {} for form {}",
                    record.id, record.form_id
                );
                Ok(record)
            }
            Err(e) => {
                error!("Failed to save conversation: {e}");
                Err(ConversationError::PersistenceFailed(e))
            }
        }
    }

    async fn try_save(
        &self,
        messages: Vec<Message>,
    ) -> Result<ConversationRecord, PersistenceFailure> {
        let form_fields_data = self.get_form_fields_data_from_conversation(&messages).await?;
        let name = self.generate_conversation_name(&form_fields_data).await?;
        let transcript = self.sanitize_conversation_messages(messages);

        let record = self
            .store
            .create(NewConversation {
                form_id: self.form.id,
                name,
                form_fields_data,
                transcript,
            })
            .await?;

        Ok(record)
    }
}

fn with_system_prompt(system: Message, messages: &[Message]) -> Vec<Message> {
    let mut request = Vec::with_capacity(messages.len() + 1);
    request.push(system);
    request.extend_from_slice(messages);
    request
}
