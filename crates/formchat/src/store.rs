//! Durable storage for finished conversations.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use formchat_common::{ConversationRecord, NewConversation};

use crate::error::StoreError;

/// Append-only store of conversation records.
///
/// Every successful `create` adds exactly one record; records are never
/// updated in place.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persists a new conversation and returns the created record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written; nothing is
    /// stored in that case.
    async fn create(&self, conversation: NewConversation)
    -> Result<ConversationRecord, StoreError>;

    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids, or a read error.
    async fn get(&self, id: Uuid) -> Result<ConversationRecord, StoreError>;

    /// Lists every record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    async fn list(&self) -> Result<Vec<ConversationRecord>, StoreError>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ConversationRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(
        &self,
        conversation: NewConversation,
    ) -> Result<ConversationRecord, StoreError> {
        let record = ConversationRecord::create(conversation);
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<ConversationRecord, StoreError> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }
}
