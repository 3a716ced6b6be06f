//! Background work after a turn: chat titles and correction learning.
//!
//! Both tasks run detached. Failures are logged and otherwise ignored.

use kreo_ollama::{ChatRequest, ModelGateway, RequestOptions, ResponseFormat, WireMessage};
use kreo_store::{ChatRepository, KnowledgeStore};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const TITLE_PROMPT: &str = "You are a title generator. Generate a very short, concise title (max 5-6 words) that captures the essence of the user's question or topic. Respond with ONLY the title, no quotes, no punctuation at the end, no explanation.";

const TITLE_INPUT_CHARS: usize = 200;
const TITLE_MAX_CHARS: usize = 50;

const CORRECTION_PROMPT: &str = "You are a Supervisor AI. Your job is to check if the User is correcting the Bot's previous answer.

Analyze this conversation triplet:
1. Original Question
2. Bot Answer
3. User Reply

IF the User Reply is correcting the Bot Answer (stating it is wrong, providing the right fact, etc.):
- Extract the FACT based on the user's correction.
- Return a JSON object: { \"isCorrection\": true, \"question\": \"The original question\", \"answer\": \"The CORRECTED answer based on user's reply\" }

IF the User Reply is NOT a correction (just a follow-up, a new question, or agreement):
- Return JSON: { \"isCorrection\": false }

RESPONSE FORMAT: JSON ONLY. No markdown.";

const CORRECTION_KEYWORDS: [&str; 10] = [
    "wrong",
    "incorrect",
    "no",
    "actually",
    "false",
    "mistake",
    "error",
    "not true",
    "stop",
    "bad",
];

/// Replies longer than this without a keyword are not checked.
const CORRECTION_MAX_PLAIN_CHARS: usize = 50;

/// Ask the model for a short title. `None` when the model fails or returns
/// nothing usable.
pub async fn generate_title(gateway: &dyn ModelGateway, model: &str, message: &str) -> Option<String> {
    let excerpt: String = message.chars().take(TITLE_INPUT_CHARS).collect();
    let request = ChatRequest::new(model)
        .system(TITLE_PROMPT)
        .message(WireMessage::user(format!(
            "Generate a short title for this conversation: \"{}\"",
            excerpt
        )))
        .options(RequestOptions {
            temperature: Some(0.3),
            ..Default::default()
        });

    match gateway.complete(request).await {
        Ok(raw) => clean_title(&raw),
        Err(e) => {
            warn!(error = %e, "title generation failed");
            None
        }
    }
}

/// Strip one leading and one trailing quote and cap the length.
pub fn clean_title(raw: &str) -> Option<String> {
    let mut title = raw.trim();
    if let Some(rest) = title.strip_prefix(is_quote) {
        title = rest;
    }
    if let Some(rest) = title.strip_suffix(is_quote) {
        title = rest;
    }
    let title: String = title.chars().take(TITLE_MAX_CHARS).collect();
    let title = title.trim().to_string();
    (!title.is_empty()).then_some(title)
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Generate a title for a new chat and store it.
pub fn spawn_title_task(
    gateway: Arc<dyn ModelGateway>,
    chats: Arc<dyn ChatRepository>,
    chat_id: String,
    model: String,
    message: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(title) = generate_title(gateway.as_ref(), &model, &message).await else {
            return;
        };
        match chats.update_title(&chat_id, &title) {
            Ok(true) => info!(chat_id = %chat_id, title = %title, "chat titled"),
            Ok(false) => debug!(chat_id = %chat_id, "chat gone before title arrived"),
            Err(e) => warn!(chat_id = %chat_id, error = %e, "failed to store chat title"),
        }
    })
}

/// Cheap check for whether a reply might correct the previous answer.
pub fn may_be_correction(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    CORRECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
        || reply.chars().count() <= CORRECTION_MAX_PLAIN_CHARS
}

/// A fact extracted from a user's correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CorrectionVerdict {
    #[serde(default)]
    is_correction: bool,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

/// Ask the model whether `reply` corrects `previous_answer`.
pub async fn detect_correction(
    gateway: &dyn ModelGateway,
    model: &str,
    previous_question: &str,
    previous_answer: &str,
    reply: &str,
) -> Option<Correction> {
    if !may_be_correction(reply) {
        return None;
    }

    let request = ChatRequest::new(model)
        .system(CORRECTION_PROMPT)
        .message(WireMessage::user(format!(
            "Original Question: \"{}\"\nBot Answer: \"{}\"\nUser Reply: \"{}\"",
            previous_question, previous_answer, reply
        )))
        .options(RequestOptions::short(0.0, 256))
        .format(ResponseFormat::Json);

    let raw = match gateway.complete(request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "correction detection failed");
            return None;
        }
    };

    let verdict: CorrectionVerdict = match serde_json::from_str(raw.trim()) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(error = %e, "correction verdict was not valid JSON");
            return None;
        }
    };

    match verdict {
        CorrectionVerdict {
            is_correction: true,
            question: Some(question),
            answer: Some(answer),
        } if !question.trim().is_empty() && !answer.trim().is_empty() => {
            Some(Correction { question, answer })
        }
        _ => None,
    }
}

/// Check a reply for a correction and learn it.
pub fn spawn_correction_task(
    gateway: Arc<dyn ModelGateway>,
    knowledge: Arc<dyn KnowledgeStore>,
    model: String,
    previous_question: String,
    previous_answer: String,
    reply: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let correction = detect_correction(
            gateway.as_ref(),
            &model,
            &previous_question,
            &previous_answer,
            &reply,
        )
        .await;

        if let Some(Correction { question, answer }) = correction {
            match knowledge.learn(&question, &answer) {
                Ok(_) => info!(question = %question, "learned from user correction"),
                Err(e) => warn!(error = %e, "failed to store correction"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use kreo_store::{ChatStore, KnowledgeBase};

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("\"Rust Async Basics\"").as_deref(), Some("Rust Async Basics"));
        assert_eq!(clean_title("  'Trip to Paris'\n").as_deref(), Some("Trip to Paris"));
        assert_eq!(clean_title(&"x".repeat(80)).unwrap().len(), 50);
        assert!(clean_title("\"\"").is_none());
    }

    #[test]
    fn test_correction_heuristic() {
        assert!(may_be_correction("No, it's Canberra"));
        assert!(may_be_correction("That is wrong, the capital of Australia is Canberra and has been for ages"));
        assert!(!may_be_correction("Thanks! Could you also tell me about the history of the city and its founding"));
    }

    #[tokio::test]
    async fn test_title_task_updates_chat() {
        let model = Arc::new(ScriptedModel::default().with_completion("\"Capital Cities\""));
        let chats = Arc::new(ChatStore::in_memory());
        let chat = chats.create("what is the capital of australia").unwrap();

        spawn_title_task(
            model.clone(),
            chats.clone(),
            chat.id.clone(),
            "m".into(),
            "what is the capital of australia".into(),
        )
        .await
        .unwrap();

        assert_eq!(chats.get(&chat.id).unwrap().unwrap().title, "Capital Cities");
        let request = model.last_request().unwrap();
        assert_eq!(request.options.temperature, Some(0.3));
    }

    #[tokio::test]
    async fn test_title_failure_keeps_fallback() {
        let model = Arc::new(ScriptedModel::default().failing());
        let chats = Arc::new(ChatStore::in_memory());
        let chat = chats.create("hello world").unwrap();

        spawn_title_task(model, chats.clone(), chat.id.clone(), "m".into(), "hello world".into())
            .await
            .unwrap();
        assert_eq!(chats.get(&chat.id).unwrap().unwrap().title, "hello world");
    }

    #[tokio::test]
    async fn test_correction_learned() {
        let model = Arc::new(ScriptedModel::default().with_completion(
            r#"{"isCorrection": true, "question": "capital of Australia", "answer": "Canberra"}"#,
        ));
        let knowledge = Arc::new(KnowledgeBase::in_memory());

        spawn_correction_task(
            model.clone(),
            knowledge.clone(),
            "m".into(),
            "capital of Australia?".into(),
            "Sydney".into(),
            "No, it's Canberra".into(),
        )
        .await
        .unwrap();

        let entries = knowledge.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].answer, "Canberra");
        let request = model.last_request().unwrap();
        assert_eq!(request.format, Some(ResponseFormat::Json));
        assert_eq!(request.options.num_predict, Some(256));
    }

    #[tokio::test]
    async fn test_non_correction_not_learned() {
        let model = Arc::new(ScriptedModel::default().with_completion(r#"{"isCorrection": false}"#));
        let knowledge = Arc::new(KnowledgeBase::in_memory());
        let found = detect_correction(model.as_ref(), "m", "q", "a", "ok thanks").await;
        assert!(found.is_none());
        assert!(knowledge.entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_long_plain_reply_skips_model() {
        let model = Arc::new(ScriptedModel::default());
        let reply = "Great, then tell me more about the history of the city and its founding years";
        assert!(detect_correction(model.as_ref(), "m", "q", "a", reply).await.is_none());
        assert_eq!(model.complete_calls(), 0);
    }
}
