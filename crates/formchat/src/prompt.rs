//! System prompts for the three model calls a conversation makes.

use std::fmt::Write as _;
use std::sync::Arc;

use formchat_common::{ConversationMarkers, Form, FormFieldData, Message};

/// Produces the system message prepended to each model call.
///
/// Implementations are synchronous and must not fail; a host that loads
/// prompts from elsewhere should do so before constructing the provider.
pub trait PromptProvider: Send + Sync {
    /// Instructions for continuing the form-filling conversation.
    fn conversation_flow_prompt(&self) -> Message;

    /// Instructions for extracting field data as a JSON object.
    fn form_fields_data_prompt(&self) -> Message;

    /// Instructions for naming a conversation from its extracted data.
    fn conversation_name_prompt(&self, form_field_data: &FormFieldData) -> Message;
}

/// Default [`PromptProvider`] built from a form definition.
///
/// # Examples
///
/// ```
/// use formchat::prompt::{FormPromptBuilder, PromptProvider};
/// use formchat_common::{ConversationMarkers, FieldType, Form, FormField, MessageRole};
///
/// let form = Form::new("Newsletter signup")
///     .with_field(FormField::new("email", "Email", FieldType::Email).required());
/// let prompts = FormPromptBuilder::new(form.into(), ConversationMarkers::default());
///
/// let message = prompts.conversation_flow_prompt();
/// assert_eq!(message.role, MessageRole::System);
/// assert!(message.content.contains("[END]"));
/// ```
#[derive(Debug, Clone)]
pub struct FormPromptBuilder {
    form: Arc<Form>,
    markers: ConversationMarkers,
}

impl FormPromptBuilder {
    #[must_use]
    pub const fn new(form: Arc<Form>, markers: ConversationMarkers) -> Self {
        Self { form, markers }
    }

    fn field_list(&self) -> String {
        let mut out = String::new();
        for field in &self.form.fields {
            let requirement = if field.required { "required" } else { "optional" };
            let _ = write!(
                out,
                "- {} (id: `{}`, type: {}, {})",
                field.label, field.id, field.field_type, requirement
            );
            if let Some(description) = &field.description {
                let _ = write!(out, ": {description}");
            }
            if !field.options.is_empty() {
                let _ = write!(out, " Options: {}.", field.options.join(", "));
            }
            out.push('\n');
        }
        out
    }

    fn form_heading(&self) -> String {
        match &self.form.description {
            Some(description) => format!("\"{}\" ({description})", self.form.name),
            None => format!("\"{}\"", self.form.name),
        }
    }
}

impl PromptProvider for FormPromptBuilder {
    fn conversation_flow_prompt(&self) -> Message {
        let content = format!(
            "You are a friendly assistant helping a user fill in the form {heading}.\n\
             The conversation starts when the user says \"{start}\".\n\n\
             Fields to collect:\n{fields}\n\
             Ask for one field at a time, in the order listed, and keep each question short. \
             If an answer is unclear or does not fit the field type, ask again. \
             Optional fields may be skipped if the user declines.\n\
             Once every required field has been collected, thank the user and end your \
             message with {end_token}. Never write {end_token} before that point.",
            heading = self.form_heading(),
            start = self.markers.start_message,
            fields = self.field_list(),
            end_token = self.markers.bracketed_end_token(),
        );
        Message::system(content)
    }

    fn form_fields_data_prompt(&self) -> Message {
        let content = format!(
            "Read the conversation that follows, in which a user filled in the form {heading}.\n\n\
             Fields:\n{fields}\n\
             Reply with a single JSON object and nothing else: no prose and no code fences. \
             Use the field ids as keys. Use null for any field the user did not provide.",
            heading = self.form_heading(),
            fields = self.field_list(),
        );
        Message::system(content)
    }

    fn conversation_name_prompt(&self, form_field_data: &FormFieldData) -> Message {
        let data = serde_json::Value::Object(form_field_data.clone());
        let content = format!(
            "Write a short title, at most six words, for a submission of the form \"{name}\" \
             with the following data:\n{data:#}\n\n\
             Reply with the title only, without quotes.",
            name = self.form.name,
        );
        Message::system(content)
    }
}
