//! Error types for conversation orchestration and persistence.
//!
//! Callers only see coarse messages; the underlying cause stays reachable
//! through [`std::error::Error::source`] for logging.

use thiserror::Error;

use formchat_client::ClientError;

/// Why a model reply carried no usable text.
#[derive(Debug, Error)]
pub enum ResponseShapeError {
    /// The response had an empty `choices` array or a null content field.
    #[error("response contained no message content")]
    MissingContent,
}

/// Failure inside a conversation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("Record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No record exists under the requested id.
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// The store refused the write.
    #[error("Store rejected the record: {0}")]
    Rejected(String),
}

/// Cause attached to an extraction or naming failure.
#[derive(Debug, Error)]
pub enum ModelFailure {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Shape(#[from] ResponseShapeError),
}

/// Cause attached to [`ConversationError::PersistenceFailed`].
#[derive(Debug, Error)]
pub enum PersistenceFailure {
    #[error(transparent)]
    Conversation(Box<ConversationError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ConversationError> for PersistenceFailure {
    fn from(err: ConversationError) -> Self {
        Self::Conversation(Box::new(err))
    }
}

/// Errors returned by [`crate::ConversationService`].
#[derive(Debug, Error)]
pub enum ConversationError {
    /// Transport fault while asking for the next question, passed through.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The extraction request failed or returned no content.
    #[error("Unable to get form data from conversation")]
    ExtractionFailed(#[source] ModelFailure),

    /// The extraction reply was not a JSON object.
    #[error("Unable to get form data from conversation")]
    ParseFailed(#[source] serde_json::Error),

    /// The naming request failed or returned no content.
    #[error("Unable to generate conversation name")]
    NamingFailed(#[source] ModelFailure),

    /// Saving the conversation failed at any step.
    #[error("Unable to save conversation")]
    PersistenceFailed(#[source] PersistenceFailure),
}

impl ConversationError {
    /// The root cause of this error, for logging.
    ///
    /// Walks the `source()` chain to its end.
    #[must_use]
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut current: &(dyn std::error::Error + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_display_hides_cause() {
        let parse = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ConversationError::ParseFailed(parse);

        assert_eq!(err.to_string(), "Unable to get form data from conversation");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err = ConversationError::from(ClientError::AuthenticationError("bad key".into()));
        assert_eq!(err.to_string(), "Authentication error: bad key");
    }

    #[test]
    fn test_root_cause_through_persistence() {
        let inner = ConversationError::NamingFailed(ResponseShapeError::MissingContent.into());
        let err = ConversationError::PersistenceFailed(inner.into());

        assert_eq!(err.to_string(), "Unable to save conversation");
        assert_eq!(
            err.root_cause().to_string(),
            "response contained no message content"
        );
    }

    #[test]
    fn test_store_error_wrapped() {
        let err = ConversationError::PersistenceFailed(
            StoreError::Rejected("disk full".to_string()).into(),
        );
        assert_eq!(err.root_cause().to_string(), "Store rejected the record: disk full");
    }
}
