//! Persistence for Kreo.
//!
//! Two stores live here:
//!
//! - [`ChatStore`] keeps every [`ChatRecord`](kreo_types::ChatRecord) in a
//!   single JSON list, newest first.
//! - [`KnowledgeBase`] keeps user-taught (question, answer) pairs and answers
//!   fuzzy queries over them.
//!
//! Both are reached through the [`ChatRepository`] and [`KnowledgeStore`]
//! traits so callers can swap in in-memory stores for tests.

mod chats;
mod error;
pub mod fuzzy;
mod json_file;
mod knowledge;
pub mod paths;

pub use chats::{ChatRepository, ChatStore, RECENT_CONTEXT_HEADER};
pub use error::StoreError;
pub use knowledge::{KnowledgeBase, KnowledgeStore, ScoredEntry};

/// File name of the chat list inside the data directory.
pub const CHATS_FILE: &str = "chats.json";

/// File name of the knowledge list inside the data directory.
pub const KNOWLEDGE_FILE: &str = "knowledge.json";
