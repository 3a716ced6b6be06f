//! Orchestrator - runs one chat turn from user text to stored reply.

use chrono::Local;
use kreo_ollama::{ChatRequest, ModelGateway, RequestOptions, WireMessage};
use kreo_search::SearchGateway;
use kreo_store::{ChatRepository, KnowledgeStore, StoreError};
use kreo_types::{Attachment, Message, MessageStatus, ModelSettings, Role};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::attachments::{prepare_user_message, PreparedTurn};
use crate::classifier::{Classification, Classifier, Route, RouteInput};
use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::prompt::{instructions, knowledge_block, search_block, PromptBuilder};
use crate::side_tasks::{spawn_correction_task, spawn_title_task};
use crate::stream::{relay, RelayOutcome};
use crate::verify::{verify, Verification};

/// One user turn.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    /// Existing chat to continue; a new chat is created when `None`.
    pub chat_id: Option<String>,
    pub text: String,
    pub attachment: Option<Attachment>,
    pub settings: ModelSettings,
}

impl TurnRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Progress of a turn, published to the presentation as it happens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TurnEvent {
    /// The chat the turn belongs to.
    Chat { id: String },
    Status { status: MessageStatus },
    Token { text: String },
    /// The stored assistant message. Always the last event.
    Done { message: Message },
    Error { message: String },
}

impl TurnEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            TurnEvent::Chat { .. } => "chat",
            TurnEvent::Status { .. } => "status",
            TurnEvent::Token { .. } => "token",
            TurnEvent::Done { .. } => "done",
            TurnEvent::Error { .. } => "error",
        }
    }
}

/// How the answer stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnFinish {
    Completed,
    Cancelled,
    Failed,
}

/// Result of a finished turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub chat_id: String,
    pub route: Route,
    pub finish: TurnFinish,
    /// The stored assistant message.
    pub message: Message,
    /// Detached side tasks started by the turn.
    pub background: Vec<JoinHandle<()>>,
}

/// Marks a chat as having a turn in flight until dropped.
struct InFlightGuard<'a> {
    turns: &'a Mutex<HashSet<String>>,
    chat_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(turns: &'a Mutex<HashSet<String>>, chat_id: &str) -> Result<Self, RouterError> {
        let mut active = turns.lock().map_err(|_| StoreError::Poisoned)?;
        if !active.insert(chat_id.to_string()) {
            return Err(RouterError::TurnInProgress(chat_id.to_string()));
        }
        Ok(Self {
            turns,
            chat_id: chat_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.turns.lock() {
            active.remove(&self.chat_id);
        }
    }
}

fn emit(events: &UnboundedSender<TurnEvent>, event: TurnEvent) {
    // A closed receiver only means nobody is watching.
    events.send(event).ok();
}

/// Routes turns, augments prompts and streams answers into chats.
pub struct Orchestrator {
    config: RouterConfig,
    model: Arc<dyn ModelGateway>,
    search: Arc<dyn SearchGateway>,
    chats: Arc<dyn ChatRepository>,
    knowledge: Arc<dyn KnowledgeStore>,
    classifier: Classifier,
    in_flight: Mutex<HashSet<String>>,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ModelGateway>,
        search: Arc<dyn SearchGateway>,
        chats: Arc<dyn ChatRepository>,
        knowledge: Arc<dyn KnowledgeStore>,
    ) -> Self {
        let config = RouterConfig::default();
        Self {
            classifier: Classifier::new(model.clone(), &config),
            config,
            model,
            search,
            chats,
            knowledge,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the configuration, rebuilding the standard classifier.
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.classifier = Classifier::new(self.model.clone(), &config);
        self.config = config;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<dyn ModelGateway> {
        &self.model
    }

    pub fn search(&self) -> &Arc<dyn SearchGateway> {
        &self.search
    }

    pub fn chats(&self) -> &Arc<dyn ChatRepository> {
        &self.chats
    }

    pub fn knowledge(&self) -> &Arc<dyn KnowledgeStore> {
        &self.knowledge
    }

    /// Classify `text` without running a turn.
    pub async fn classify(&self, text: &str, history: &[Message], model: &str) -> Classification {
        let input = RouteInput {
            text,
            history,
            model,
        };
        self.classifier.classify(&input, &|_| {}).await
    }

    /// Run one turn.
    ///
    /// Progress is published on `events`. Firing `cancel` stops generation,
    /// keeping the partial reply. Model failures end up in the stored
    /// message; only problems that prevent the turn from starting, or from
    /// being stored, are returned as errors.
    pub async fn run_turn(
        &self,
        request: TurnRequest,
        events: &UnboundedSender<TurnEvent>,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, RouterError> {
        let TurnRequest {
            chat_id,
            text,
            attachment,
            settings,
        } = request;

        // 1. Validate input
        settings.validate()?;
        let text = text.trim().to_string();
        if text.is_empty() && attachment.is_none() {
            return Err(RouterError::EmptyTurn);
        }
        let PreparedTurn {
            message: user_message,
            image,
        } = prepare_user_message(&text, attachment.as_ref())?;

        // 2. Claim the chat, then read it
        let (_guard, mut chat) = match chat_id {
            Some(id) => {
                let guard = InFlightGuard::acquire(&self.in_flight, &id)?;
                let chat = self
                    .chats
                    .get(&id)?
                    .ok_or_else(|| RouterError::ChatNotFound(id.clone()))?;
                (guard, chat)
            }
            None => {
                let first = match &attachment {
                    Some(a) if text.is_empty() => a.name().to_string(),
                    _ => text.clone(),
                };
                let chat = self.chats.create(&first)?;
                (InFlightGuard::acquire(&self.in_flight, &chat.id)?, chat)
            }
        };
        let is_new = chat.messages.is_empty();
        emit(events, TurnEvent::Chat { id: chat.id.clone() });
        info!(chat_id = %chat.id, is_new, "turn started");

        let history = chat.messages.clone();
        let mut background = Vec::new();

        // 3. Learn from corrections of the previous answer
        if let (None, [.., question, answer]) = (&attachment, history.as_slice()) {
            if question.role == Role::User && answer.role == Role::Assistant && !text.is_empty() {
                background.push(spawn_correction_task(
                    self.model.clone(),
                    self.knowledge.clone(),
                    settings.model.clone(),
                    question.content.clone(),
                    answer.content.clone(),
                    text.clone(),
                ));
            }
        }

        // 4. Store the user message and the placeholder
        chat.messages.push(user_message);
        chat.messages.push(Message::placeholder());
        let user_idx = chat.messages.len() - 2;
        let reply_idx = chat.messages.len() - 1;
        if !self.chats.update_messages(&chat.id, &chat.messages)? {
            return Err(RouterError::ChatNotFound(chat.id));
        }

        // 5. Classify
        let status_events = events.clone();
        let on_status = move |status: MessageStatus| emit(&status_events, TurnEvent::Status { status });
        let input = RouteInput {
            text: &text,
            history: &history,
            model: &settings.model,
        };
        let Classification {
            route,
            model_content,
            ..
        } = self.classifier.classify(&input, &on_status).await;

        if attachment.is_none() {
            if let Some(content) = model_content {
                chat.messages[user_idx].model_content = Some(content);
            }
        }

        // 6. Gather context
        let context = match &route {
            Route::Search { query } => {
                chat.messages[reply_idx].status = MessageStatus::Searching;
                emit(events, TurnEvent::Status { status: MessageStatus::Searching });
                let results = self.search.search(query).await;
                let verification = verify(query, &results);
                info!(
                    query = %query,
                    results = results.len(),
                    verified = !matches!(verification, Verification::NotFound(_)),
                    "web context gathered"
                );
                Some(search_block(&results, &verification))
            }
            Route::Knowledge { query } => match self.knowledge.search(query) {
                Ok(hits) => {
                    debug!(hits = hits.len(), "knowledge context gathered");
                    knowledge_block(&hits)
                }
                Err(e) => {
                    warn!(error = %e, "knowledge lookup failed");
                    None
                }
            },
            Route::Direct => None,
        };
        chat.messages[reply_idx].status = MessageStatus::Thinking;
        emit(events, TurnEvent::Status { status: MessageStatus::Thinking });

        let recent = match self
            .chats
            .recent_context(Some(chat.id.as_str()), self.config.recent_context_limit)
        {
            Ok(recent) => Some(recent),
            Err(e) => {
                warn!(error = %e, "recent context unavailable");
                None
            }
        };

        // 7. Build the request
        let base = if settings.system_prompt.trim().is_empty() {
            ModelSettings::default().system_prompt
        } else {
            settings.system_prompt.clone()
        };
        let system_prompt = PromptBuilder::new(base, instructions(&settings.user_name, Local::now()))
            .context(context)
            .recent(recent)
            .budget(self.config.prompt_budget(settings.num_ctx))
            .build();

        let mut wire: Vec<WireMessage> = chat.messages[..=user_idx]
            .iter()
            .map(|m| WireMessage::new(m.role.as_str(), m.for_model()))
            .collect();
        if let (Some(image), Some(last)) = (image, wire.last_mut()) {
            last.images = Some(vec![image]);
        }
        let request = ChatRequest::new(settings.model.as_str())
            .system(system_prompt)
            .messages(wire)
            .options(RequestOptions::from_settings(&settings))
            .streaming(true);

        // 8. Stream the answer
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => RelayOutcome::Cancelled(String::new()),
            started = self.model.stream_chat(request) => match started {
                Ok(stream) => {
                    let token_events = events.clone();
                    relay(stream, &cancel, move |delta| {
                        emit(&token_events, TurnEvent::Token { text: delta.to_string() })
                    })
                    .await
                }
                Err(error) => {
                    warn!(error = %error, "could not start generation");
                    RelayOutcome::Failed { partial: String::new(), error }
                }
            },
        };

        // 9. Store the reply
        let finish = match &outcome {
            RelayOutcome::Completed(_) => TurnFinish::Completed,
            RelayOutcome::Cancelled(_) => TurnFinish::Cancelled,
            RelayOutcome::Failed { .. } => TurnFinish::Failed,
        };
        let reply = &mut chat.messages[reply_idx];
        reply.content = outcome.content();
        reply.status = MessageStatus::None;
        let message = reply.clone();

        let stored = match self.chats.update_messages(&chat.id, &chat.messages) {
            Ok(stored) => stored,
            Err(e) => {
                emit(events, TurnEvent::Error { message: e.to_string() });
                return Err(e.into());
            }
        };
        if !stored {
            info!(chat_id = %chat.id, "chat deleted during turn, reply dropped");
        }
        if let RelayOutcome::Failed { error, .. } = &outcome {
            emit(events, TurnEvent::Error { message: error.to_string() });
        }
        emit(events, TurnEvent::Done { message: message.clone() });
        info!(chat_id = %chat.id, route = route.label(), finish = outcome.label(), "turn finished");

        // 10. Title new chats
        if stored && is_new && finish == TurnFinish::Completed && !text.is_empty() {
            background.push(spawn_title_task(
                self.model.clone(),
                self.chats.clone(),
                chat.id.clone(),
                settings.model.clone(),
                text,
            ));
        }

        Ok(TurnOutcome {
            chat_id: chat.id,
            route,
            finish,
            message,
            background,
        })
    }
}
