//! Chat messages and turn attachments.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Wire name used by the inference runtime.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Progress marker for an assistant message that is still being produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    None,
    Thinking,
    Routing,
    Searching,
}

impl MessageStatus {
    /// Whether the message is still in flight.
    pub fn is_active(&self) -> bool {
        !matches!(self, MessageStatus::None)
    }
}

/// Kind of an inlined file attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    File,
}

/// A file whose content was inlined into the model-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

/// Attachment supplied together with a user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    /// Image as raw base64 or a `data:` URL.
    Image { data: String },
    /// Source or plain-text file, inlined inside a code fence.
    Text { name: String, content: String },
    /// Any other document with extracted text.
    File { name: String, content: String },
}

impl Attachment {
    /// Display name for logs and fallback chat titles.
    pub fn name(&self) -> &str {
        match self {
            Attachment::Image { .. } => "image",
            Attachment::Text { name, .. } | Attachment::File { name, .. } => name,
        }
    }
}

/// A single message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    /// Text shown to the user.
    pub content: String,
    /// Text sent to the model when it differs from `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_content: Option<String>,
    /// Base64 image payload (no data-URL prefix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Create a finished user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), MessageStatus::None)
    }

    /// Create a finished assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), MessageStatus::None)
    }

    /// Create an empty assistant placeholder in the `thinking` state.
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, String::new(), MessageStatus::Thinking)
    }

    fn new(role: Role, content: String, status: MessageStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            model_content: None,
            image: None,
            file: None,
            status,
        }
    }

    /// Set the model-facing content.
    pub fn with_model_content(mut self, content: impl Into<String>) -> Self {
        self.model_content = Some(content.into());
        self
    }

    /// Content the model should see for this message.
    pub fn for_model(&self) -> &str {
        self.model_content.as_deref().unwrap_or(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_model_prefers_model_content() {
        let msg = Message::user("shown").with_model_content("sent");
        assert_eq!(msg.for_model(), "sent");
        assert_eq!(Message::user("plain").for_model(), "plain");
    }

    #[test]
    fn test_placeholder_is_active() {
        let msg = Message::placeholder();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.status.is_active());
        assert!(!Message::assistant("done").status.is_active());
    }

    #[test]
    fn test_attachment_tagged_json() {
        let json = r#"{"type":"text","name":"main.rs","content":"fn main() {}"}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(attachment.name(), "main.rs");
        assert!(matches!(attachment, Attachment::Text { .. }));
    }
}
