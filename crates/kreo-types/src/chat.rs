//! Chat records and recency grouping.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, Role};

/// Max characters of the first message kept in a fallback title.
const FALLBACK_TITLE_CHARS: usize = 40;

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    pub fallback_title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatRecord {
    /// Create an empty chat titled after its first message.
    pub fn new(first_message: &str) -> Self {
        let now = Utc::now();
        let fallback_title = fallback_title(first_message);
        Self {
            id: format!("chat_{}", Uuid::new_v4().simple()),
            title: fallback_title.clone(),
            fallback_title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Recency bucket relative to `now`.
    pub fn bucket(&self, now: DateTime<Local>) -> RecencyBucket {
        RecencyBucket::of(self.updated_at, now)
    }
}

fn fallback_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    let mut title: String = trimmed.chars().take(FALLBACK_TITLE_CHARS).collect();
    if trimmed.chars().count() > FALLBACK_TITLE_CHARS {
        title.push_str("...");
    }
    if title.is_empty() {
        title = "New Chat".to_string();
    }
    title
}

/// Sidebar grouping of chats by last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecencyBucket {
    Today,
    Yesterday,
    #[serde(rename = "Previous 7 Days")]
    PreviousWeek,
    Older,
}

impl RecencyBucket {
    /// All buckets in display order.
    pub const ALL: [RecencyBucket; 4] = [
        RecencyBucket::Today,
        RecencyBucket::Yesterday,
        RecencyBucket::PreviousWeek,
        RecencyBucket::Older,
    ];

    /// Classify a timestamp against local-midnight boundaries of `now`.
    pub fn of(updated_at: DateTime<Utc>, now: DateTime<Local>) -> Self {
        let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
        let today = Local
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or(now)
            .with_timezone(&Utc);
        let yesterday = today - Duration::days(1);
        let week_ago = today - Duration::days(7);

        if updated_at >= today {
            RecencyBucket::Today
        } else if updated_at >= yesterday {
            RecencyBucket::Yesterday
        } else if updated_at >= week_ago {
            RecencyBucket::PreviousWeek
        } else {
            RecencyBucket::Older
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecencyBucket::Today => "Today",
            RecencyBucket::Yesterday => "Yesterday",
            RecencyBucket::PreviousWeek => "Previous 7 Days",
            RecencyBucket::Older => "Older",
        }
    }
}
