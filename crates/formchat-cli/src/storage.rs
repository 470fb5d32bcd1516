//! Conversation records on disk.
//!
//! Records are stored as pretty-printed JSON in
//! `~/.local/share/formchat/conversations/<uuid>.json` unless another data
//! directory is configured.
//!
//! ## File Layout
//!
//! ```text
//! ~/.local/share/formchat/
//! └── conversations/
//!     ├── abc12345-6789-....json
//!     └── def67890-abcd-....json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use formchat::store::ConversationStore;
use formchat::{ConversationRecord, NewConversation, StoreError};
use tracing::{debug, instrument};
use uuid::Uuid;

/// [`ConversationStore`] backed by one JSON file per record.
///
/// Cheap to clone; clones share the same directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    conversations_dir: PathBuf,
}

impl FileStore {
    /// Opens the store under `data_dir`, creating the directory if needed.
    ///
    /// On Unix the directories are created owner-only.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn new(data_dir: &Path) -> Result<Self, StoreError> {
        let conversations_dir = data_dir.join("conversations");

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&conversations_dir)?;

        Ok(Self { conversations_dir })
    }

    /// Runs a synchronous closure on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking task panics or the closure fails.
    pub async fn run<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Self) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(&this))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(format!("Task join error: {e}"))))?
    }

    /// Writes a record to disk.
    ///
    /// Uses atomic write (write to temp file, then rename).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails.
    #[instrument(
        skip(self, record),
        fields(conversation_id = %record.id, message_count = record.transcript.len())
    )]
    pub fn save_record(&self, record: &ConversationRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.id);
        let json = serde_json::to_string_pretty(record)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, &path)?;

        debug!(
            conversation_id = %record.id,
            path = %path.display(),
            size_bytes = json.len(),
            "Saved conversation"
        );

        Ok(())
    }

    /// Reads a record from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - Deserialization fails
    #[instrument(skip(self), fields(conversation_id = %id))]
    pub fn load_record(&self, id: &Uuid) -> Result<ConversationRecord, StoreError> {
        let path = self.record_path(id);

        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let json = fs::read_to_string(&path)?;
        let record: ConversationRecord = serde_json::from_str(&json)?;

        debug!(
            conversation_id = %id,
            message_count = record.transcript.len(),
            "Loaded conversation"
        );

        Ok(record)
    }

    /// Lists the ids of all stored records.
    ///
    /// Files whose name is not a UUID are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if directory reading fails.
    pub fn list_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.conversations_dir)? {
            let path = entry?.path();

            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(id) = Uuid::parse_str(stem)
            {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    /// Loads every record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be read.
    pub fn load_all(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        let mut records = self
            .list_ids()?
            .iter()
            .map(|id| self.load_record(id))
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.conversations_dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn create(
        &self,
        conversation: NewConversation,
    ) -> Result<ConversationRecord, StoreError> {
        let record = ConversationRecord::create(conversation);
        self.run(move |store| {
            store.save_record(&record)?;
            Ok(record)
        })
        .await
    }

    async fn get(&self, id: Uuid) -> Result<ConversationRecord, StoreError> {
        self.run(move |store| store.load_record(&id)).await
    }

    async fn list(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        self.run(Self::load_all).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Duration;
    use formchat::{FormFieldData, Message};
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn new_conversation(name: &str) -> NewConversation {
        let mut data = FormFieldData::new();
        data.insert("email".to_string(), serde_json::json!("ada@example.com"));
        NewConversation {
            form_id: Uuid::new_v4(),
            name: name.to_string(),
            form_fields_data: data,
            transcript: vec![
                Message::assistant("What is your email?"),
                Message::user("ada@example.com"),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, store) = setup();

        let record = store.create(new_conversation("Ada")).await.unwrap();
        let loaded = store.get(record.id).await.unwrap();

        assert_eq!(loaded, record);
        assert_eq!(loaded.form_fields_data["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let (_dir, store) = setup();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (dir, store) = setup();
        let record = ConversationRecord::create(new_conversation("Ada"));

        store.save_record(&record).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("conversations"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![format!("{}.json", record.id)]);
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let (dir, store) = setup();
        let record = ConversationRecord::create(new_conversation("Ada"));
        store.save_record(&record).unwrap();

        let conversations = dir.path().join("conversations");
        fs::write(conversations.join("notes.txt"), "hi").unwrap();
        fs::write(conversations.join("not-a-uuid.json"), "{}").unwrap();

        assert_eq!(store.list_ids().unwrap(), vec![record.id]);
    }

    #[test]
    fn test_load_all_sorted_by_creation() {
        let (_dir, store) = setup();

        let mut older = ConversationRecord::create(new_conversation("older"));
        older.created_at -= Duration::hours(1);
        let newer = ConversationRecord::create(new_conversation("newer"));

        store.save_record(&newer).unwrap();
        store.save_record(&older).unwrap();

        let names: Vec<_> = store.load_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["older", "newer"]);
    }

    #[tokio::test]
    async fn test_corrupt_record() {
        let (dir, store) = setup();
        let id = Uuid::new_v4();
        fs::write(
            dir.path().join("conversations").join(format!("{id}.json")),
            "{ not json",
        )
        .unwrap();

        let err = store.get(id).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, _store) = setup();
        let mode = fs::metadata(dir.path().join("conversations"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
