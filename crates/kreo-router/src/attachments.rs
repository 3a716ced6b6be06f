//! Folding turn attachments into the user message.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kreo_types::{Attachment, FileAttachment, FileKind, Message};

use crate::error::RouterError;

/// A user message ready to be stored, plus the image to send with it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTurn {
    pub message: Message,
    /// Base64 image payload for the model request.
    pub image: Option<String>,
}

/// Build the user message for `text` and an optional attachment.
///
/// Images keep the typed text for display and tell the model an image is
/// attached. Files are inlined in full into the model-facing text, inside a
/// code fence for text files.
pub fn prepare_user_message(
    text: &str,
    attachment: Option<&Attachment>,
) -> Result<PreparedTurn, RouterError> {
    let Some(attachment) = attachment else {
        return Ok(PreparedTurn {
            message: Message::user(text),
            image: None,
        });
    };

    let turn = match attachment {
        Attachment::Image { data } => {
            let image = clean_image(data)?;
            let model_content = if text.is_empty() {
                "[Image attached]".to_string()
            } else {
                format!("[Image attached]\n\n{}", text)
            };
            let mut message = Message::user(text).with_model_content(model_content);
            message.image = Some(image.clone());
            PreparedTurn {
                message,
                image: Some(image),
            }
        }
        Attachment::Text { name, content } => {
            let model_content = format!(
                "Here is the content of file \"{}\":\n\n```\n{}\n```\n\n{}",
                name, content, text
            );
            PreparedTurn {
                message: with_file(text, model_content, name, content, FileKind::Text),
                image: None,
            }
        }
        Attachment::File { name, content } => {
            let model_content = format!(
                "Here is the content of file \"{}\":\n\n{}\n\n{}",
                name, content, text
            );
            PreparedTurn {
                message: with_file(text, model_content, name, content, FileKind::File),
                image: None,
            }
        }
    };
    Ok(turn)
}

fn with_file(text: &str, model_content: String, name: &str, content: &str, kind: FileKind) -> Message {
    let mut message = Message::user(text).with_model_content(model_content);
    message.file = Some(FileAttachment {
        name: name.to_string(),
        content: content.to_string(),
        kind,
    });
    message
}

/// Strip a `data:` URL prefix and whitespace, then check the payload decodes.
pub fn clean_image(data: &str) -> Result<String, RouterError> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if payload.is_empty() {
        return Err(RouterError::InvalidImage("empty image payload".into()));
    }
    STANDARD
        .decode(&payload)
        .map_err(|e| RouterError::InvalidImage(e.to_string()))?;
    Ok(payload)
}
