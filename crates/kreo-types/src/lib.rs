//! # Kreo Types
//!
//! The data model shared by every Kreo crate: chats, messages, knowledge
//! entries, search results and model settings.
//!
//! All types serialize with `serde` so that the same structures are used for
//! on-disk persistence, the HTTP surface and the CLI's JSON output.

mod chat;
mod knowledge;
mod message;
mod search;
mod settings;

pub use chat::{ChatRecord, RecencyBucket};
pub use knowledge::KnowledgeEntry;
pub use message::{Attachment, FileAttachment, FileKind, Message, MessageStatus, Role};
pub use search::SearchResult;
pub use settings::{ModelSettings, SettingsError};
