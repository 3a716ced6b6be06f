//! Chat history repository.

use chrono::{DateTime, Local};
use kreo_types::{ChatRecord, Message, RecencyBucket};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::json_file::JsonFile;

/// Leading line of the cross-chat context block.
pub const RECENT_CONTEXT_HEADER: &str =
    "RECENT CONVERSATION HISTORY (for context only - do not mention unless relevant):";

/// Characters of a past user message quoted in the recent context.
const RECENT_SNIPPET_CHARS: usize = 150;

/// Storage of chat records keyed by id.
pub trait ChatRepository: Send + Sync {
    /// All chats, newest first.
    fn list(&self) -> Result<Vec<ChatRecord>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<ChatRecord>, StoreError>;

    /// Create and persist an empty chat.
    fn create(&self, first_message: &str) -> Result<ChatRecord, StoreError>;

    /// Replace the messages of a stored chat, bumping `updated_at`. Other
    /// fields are left as stored. Returns `false` when the chat does not
    /// exist.
    fn update_messages(&self, id: &str, messages: &[Message]) -> Result<bool, StoreError>;

    /// Returns `false` when the chat does not exist.
    fn update_title(&self, id: &str, title: &str) -> Result<bool, StoreError>;

    /// Returns `false` when the chat does not exist.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Chats grouped into recency buckets, in display order. Empty buckets
    /// are kept so the presentation can render fixed headings.
    fn grouped(
        &self,
        now: DateTime<Local>,
    ) -> Result<Vec<(RecencyBucket, Vec<ChatRecord>)>, StoreError> {
        let mut groups: Vec<(RecencyBucket, Vec<ChatRecord>)> = RecencyBucket::ALL
            .iter()
            .map(|bucket| (*bucket, Vec::new()))
            .collect();
        for chat in self.list()? {
            let bucket = chat.bucket(now);
            if let Some((_, chats)) = groups.iter_mut().find(|(b, _)| *b == bucket) {
                chats.push(chat);
            }
        }
        Ok(groups)
    }

    /// Summary of the last user question in up to `limit` other recent chats.
    /// Empty when there is nothing to report.
    fn recent_context(&self, current_id: Option<&str>, limit: usize) -> Result<String, StoreError> {
        let mut chats: Vec<ChatRecord> = self
            .list()?
            .into_iter()
            .filter(|c| Some(c.id.as_str()) != current_id && !c.messages.is_empty())
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let lines: Vec<String> = chats
            .iter()
            .take(limit)
            .filter_map(|chat| {
                let last = chat.last_user_message()?;
                let date = chat.updated_at.with_timezone(&Local).format("%Y-%m-%d");
                let snippet: String = last
                    .content
                    .chars()
                    .take(RECENT_SNIPPET_CHARS)
                    .collect::<String>()
                    .replace('\n', " ");
                let title = if chat.title.is_empty() {
                    "Untitled"
                } else {
                    chat.title.as_str()
                };
                Some(format!(
                    "- [{}] Topic: \"{}\". User asked: \"{}...\"",
                    date, title, snippet
                ))
            })
            .collect();

        if lines.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}\n{}\n", RECENT_CONTEXT_HEADER, lines.join("\n")))
    }
}

/// JSON-file chat repository holding the list in memory behind a mutex.
pub struct ChatStore {
    file: JsonFile,
    chats: Mutex<Vec<ChatRecord>>,
}

impl ChatStore {
    /// Open (or lazily create) the chat list at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::at(path);
        let chats: Vec<ChatRecord> = file.load()?;
        debug!(count = chats.len(), path = ?file.path(), "chat store opened");
        Ok(Self {
            file,
            chats: Mutex::new(chats),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            file: JsonFile::memory(),
            chats: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ChatRecord>>, StoreError> {
        self.chats.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ChatRepository for ChatStore {
    fn list(&self) -> Result<Vec<ChatRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn get(&self, id: &str) -> Result<Option<ChatRecord>, StoreError> {
        Ok(self.lock()?.iter().find(|c| c.id == id).cloned())
    }

    fn create(&self, first_message: &str) -> Result<ChatRecord, StoreError> {
        let chat = ChatRecord::new(first_message);
        let mut chats = self.lock()?;
        chats.insert(0, chat.clone());
        self.file.save(&chats)?;
        debug!(chat_id = %chat.id, "chat created");
        Ok(chat)
    }

    fn update_messages(&self, id: &str, messages: &[Message]) -> Result<bool, StoreError> {
        let mut chats = self.lock()?;
        let Some(chat) = chats.iter_mut().find(|c| c.id == id) else {
            warn!(chat_id = id, "message update for unknown chat");
            return Ok(false);
        };
        chat.messages = messages.to_vec();
        chat.touch();
        self.file.save(&chats)?;
        Ok(true)
    }

    fn update_title(&self, id: &str, title: &str) -> Result<bool, StoreError> {
        let mut chats = self.lock()?;
        let Some(chat) = chats.iter_mut().find(|c| c.id == id) else {
            warn!(chat_id = id, "title update for unknown chat");
            return Ok(false);
        };
        chat.title = title.to_string();
        chat.touch();
        self.file.save(&chats)?;
        Ok(true)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut chats = self.lock()?;
        let before = chats.len();
        chats.retain(|c| c.id != id);
        if chats.len() == before {
            return Ok(false);
        }
        self.file.save(&chats)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chats.json");

        let store = ChatStore::open(&path).unwrap();
        let mut chat = store.create("capital of France").unwrap();
        chat.messages.push(Message::user("capital of France"));
        assert!(store.update_messages(&chat.id, &chat.messages).unwrap());

        let reopened = ChatStore::open(&path).unwrap();
        let loaded = reopened.get(&chat.id).unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.title, "capital of France");
    }

    #[test]
    fn test_newest_first_and_delete() {
        let store = ChatStore::in_memory();
        let first = store.create("one").unwrap();
        let second = store.create("two").unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

        assert!(store.delete(&first.id).unwrap());
        assert!(!store.delete(&first.id).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_update_title() {
        let store = ChatStore::in_memory();
        let chat = store.create("hello there").unwrap();
        assert!(store.update_title(&chat.id, "Greeting").unwrap());
        assert_eq!(store.get(&chat.id).unwrap().unwrap().title, "Greeting");
        assert!(!store.update_title("missing", "x").unwrap());
    }

    #[test]
    fn test_update_messages_keeps_title() {
        let store = ChatStore::in_memory();
        let chat = store.create("first question").unwrap();
        store.update_title(&chat.id, "Generated Title").unwrap();

        // `chat` still carries the title from creation.
        let messages = vec![Message::user("first question"), Message::assistant("answer")];
        assert!(store.update_messages(&chat.id, &messages).unwrap());

        let stored = store.get(&chat.id).unwrap().unwrap();
        assert_eq!(stored.title, "Generated Title");
        assert_eq!(stored.messages.len(), 2);
    }

    #[test]
    fn test_update_messages_does_not_recreate_deleted_chat() {
        let store = ChatStore::in_memory();
        let chat = store.create("short lived").unwrap();
        assert!(store.delete(&chat.id).unwrap());

        assert!(!store.update_messages(&chat.id, &[Message::user("late")]).unwrap());
        assert!(store.get(&chat.id).unwrap().is_none());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_grouped_keeps_all_buckets() {
        let store = ChatStore::in_memory();
        let mut old = store.create("old").unwrap();
        old.updated_at = Utc::now() - Duration::days(40);
        // Write directly to keep the old timestamp.
        store.lock().unwrap()[0] = old.clone();
        store.create("new").unwrap();

        let groups = store.grouped(Local::now()).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].0, RecencyBucket::Today);
        assert_eq!(groups[0].1.len(), 1);
        assert_eq!(groups[3].1[0].id, old.id);
    }

    #[test]
    fn test_recent_context_excludes_current() {
        let store = ChatStore::in_memory();
        let mut a = store.create("rust lifetimes").unwrap();
        a.messages.push(Message::user("explain\nrust lifetimes"));
        a.messages.push(Message::assistant("..."));
        store.update_messages(&a.id, &a.messages).unwrap();

        let mut b = store.create("pasta").unwrap();
        b.messages.push(Message::user("best pasta shape"));
        store.update_messages(&b.id, &b.messages).unwrap();

        let context = store.recent_context(Some(b.id.as_str()), 5).unwrap();
        assert!(context.starts_with(RECENT_CONTEXT_HEADER));
        assert!(context.contains("explain rust lifetimes"));
        assert!(!context.contains("pasta shape"));
    }

    #[test]
    fn test_recent_context_empty() {
        let store = ChatStore::in_memory();
        store.create("no messages yet").unwrap();
        assert_eq!(store.recent_context(None, 5).unwrap(), "");
    }
}
