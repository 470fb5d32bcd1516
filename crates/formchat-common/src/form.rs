//! Form definitions and the field data extracted from a conversation.
//!
//! A [`Form`] lists the fields a conversation is meant to elicit. The
//! orchestrator only reads it to build prompts and to stamp the `form_id` on
//! the saved record; field types and options are hints for the model, not
//! validation rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field values extracted from a conversation, keyed by field id.
///
/// The model is asked for a JSON object; anything else fails to parse.
pub type FormFieldData = serde_json::Map<String, serde_json::Value>;

/// The kind of value a field collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text.
    #[default]
    Text,
    /// A number.
    Number,
    /// An email address.
    Email,
    /// A calendar date.
    Date,
    /// Yes or no.
    Boolean,
    /// One of a fixed list of options.
    Choice,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Email => write!(f, "email"),
            Self::Date => write!(f, "date"),
            Self::Boolean => write!(f, "boolean"),
            Self::Choice => write!(f, "choice"),
        }
    }
}

/// A single field of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Key used for this field in [`FormFieldData`].
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Extra guidance about what the field should contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Expected value kind.
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Whether the conversation must collect this field before finishing.
    #[serde(default)]
    pub required: bool,
    /// Allowed values for [`FieldType::Choice`] fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormField {
    /// Creates an optional field with no description or options.
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            field_type,
            required: false,
            options: Vec::new(),
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the field description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the allowed options.
    #[must_use]
    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// A form whose fields a conversation collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Unique identifier, copied onto saved conversation records.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// What the form is for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions, in the order they should be asked about.
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl Form {
    /// Creates an empty form with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by id.
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Iterates over the required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|f| f.required)
    }
}
