//! Turn classification as a chain of strategies.
//!
//! Strategies run in order and the first one that decides wins:
//!
//! 1. [`ExplicitCommand`]: `/web`, `search for ...` and friends.
//! 2. [`HighRiskEntity`]: named researchers and papers.
//! 3. [`FastPath`]: coding and creative requests, answered directly.
//! 4. [`ModelRouter`]: a YES/NO question to the model.
//! 5. [`DefaultRoute`]: knowledge lookup for anything longer than a greeting.

use async_trait::async_trait;
use kreo_ollama::{ChatRequest, ModelGateway, RequestOptions, WireMessage};
use kreo_types::{Message, MessageStatus, Role};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::trigger;

/// How a turn is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Route {
    /// Generate from the conversation alone.
    Direct,
    /// Look up taught facts before generating.
    Knowledge { query: String },
    /// Search the web before generating.
    Search { query: String },
}

impl Route {
    pub fn label(&self) -> &'static str {
        match self {
            Route::Direct => "direct",
            Route::Knowledge { .. } => "knowledge",
            Route::Search { .. } => "search",
        }
    }
}

/// What a strategy decided.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub route: Route,
    /// Replacement for the model-facing text of the user turn.
    pub model_content: Option<String>,
}

impl Decision {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            model_content: None,
        }
    }
}

/// Final classification of a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub route: Route,
    pub model_content: Option<String>,
    /// Name of the strategy that decided.
    pub strategy: &'static str,
}

/// Input visible to every strategy.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    /// Raw text of the turn.
    pub text: &'a str,
    /// Messages before this turn, oldest first.
    pub history: &'a [Message],
    /// Model used for any classification request.
    pub model: &'a str,
}

/// One link of the classifier chain.
#[async_trait]
pub trait RouteStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Status to show while this strategy works, when it does slow work for
    /// `input`.
    fn status(&self, _input: &RouteInput<'_>) -> Option<MessageStatus> {
        None
    }

    /// Decide the route, or pass to the next strategy.
    async fn decide(&self, input: &RouteInput<'_>) -> Option<Decision>;
}

/// Explicit search commands, including contextual re-use of the previous
/// question ("search over net").
pub struct ExplicitCommand;

#[async_trait]
impl RouteStrategy for ExplicitCommand {
    fn name(&self) -> &'static str {
        "explicit-command"
    }

    async fn decide(&self, input: &RouteInput<'_>) -> Option<Decision> {
        let rest = trigger::strip_search_command(input.text)?;

        if !trigger::is_generic_filler(rest) {
            return Some(Decision {
                route: Route::Search {
                    query: rest.to_string(),
                },
                model_content: Some(rest.to_string()),
            });
        }

        let previous = input
            .history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim().to_string());

        match previous {
            Some(query) => {
                info!(query = %query, "contextual search re-uses previous question");
                Some(Decision {
                    model_content: Some(format!("(Searching web for: \"{}\")", query)),
                    route: Route::Search { query },
                })
            }
            None => Some(Decision::new(Route::Search {
                query: rest.to_string(),
            })),
        }
    }
}

/// Queries about specific people or papers are always searched.
pub struct HighRiskEntity;

#[async_trait]
impl RouteStrategy for HighRiskEntity {
    fn name(&self) -> &'static str {
        "high-risk-entity"
    }

    async fn decide(&self, input: &RouteInput<'_>) -> Option<Decision> {
        trigger::is_high_risk(input.text).then(|| {
            Decision::new(Route::Search {
                query: input.text.trim().to_string(),
            })
        })
    }
}

/// Coding and creative requests skip the router and answer directly.
pub struct FastPath;

#[async_trait]
impl RouteStrategy for FastPath {
    fn name(&self) -> &'static str {
        "fast-path"
    }

    async fn decide(&self, input: &RouteInput<'_>) -> Option<Decision> {
        trigger::is_fast_path(input.text).then(|| Decision::new(Route::Direct))
    }
}

const ROUTER_PROMPT: &str = "You are a helper that decides if a user question needs live web search.

Rules:
- Say YES if the user EXPLICITLY asks to search (e.g., \"search for\", \"check online\", \"google this\").
- Say YES for: news, stocks, weather, sports scores, recent events (2024+), specific unknown entities.
- Say NO for: math, code, translations, greetings, general knowledge, physics, history (before 2023).

Reply with ONLY: YES or NO";

/// Asks the model whether the turn needs live data.
pub struct ModelRouter {
    gateway: Arc<dyn ModelGateway>,
    min_chars: usize,
    probe_chars: usize,
}

impl ModelRouter {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &RouterConfig) -> Self {
        Self {
            gateway,
            min_chars: config.router_min_chars,
            probe_chars: config.router_probe_chars,
        }
    }

    fn applies(&self, input: &RouteInput<'_>) -> bool {
        input.text.trim().chars().count() > self.min_chars
    }
}

#[async_trait]
impl RouteStrategy for ModelRouter {
    fn name(&self) -> &'static str {
        "model-router"
    }

    fn status(&self, input: &RouteInput<'_>) -> Option<MessageStatus> {
        self.applies(input).then_some(MessageStatus::Routing)
    }

    async fn decide(&self, input: &RouteInput<'_>) -> Option<Decision> {
        if !self.applies(input) {
            return None;
        }

        let text = input.text.trim();
        let probe: String = text.chars().take(self.probe_chars).collect();
        let request = ChatRequest::new(input.model)
            .system(ROUTER_PROMPT)
            .message(WireMessage::user(probe))
            .options(RequestOptions::short(0.0, 3));

        match self.gateway.complete(request).await {
            Ok(answer) => {
                let answer = answer.trim().to_uppercase();
                debug!(answer = %answer, "router decision");
                answer.starts_with("YES").then(|| {
                    Decision::new(Route::Search {
                        query: text.to_string(),
                    })
                })
            }
            Err(e) => {
                warn!(error = %e, "router classification failed, not searching");
                None
            }
        }
    }
}

/// Anything longer than a greeting checks the knowledge base.
pub struct DefaultRoute {
    min_chars: usize,
}

impl DefaultRoute {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            min_chars: config.knowledge_min_chars,
        }
    }
}

#[async_trait]
impl RouteStrategy for DefaultRoute {
    fn name(&self) -> &'static str {
        "default"
    }

    async fn decide(&self, input: &RouteInput<'_>) -> Option<Decision> {
        let text = input.text.trim();
        let route = if text.chars().count() > self.min_chars {
            Route::Knowledge {
                query: text.to_string(),
            }
        } else {
            Route::Direct
        };
        Some(Decision::new(route))
    }
}

/// Ordered chain of strategies.
pub struct Classifier {
    strategies: Vec<Box<dyn RouteStrategy>>,
    min_query_chars: usize,
}

impl Classifier {
    /// The standard chain.
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &RouterConfig) -> Self {
        Self::with_strategies(
            vec![
                Box::new(ExplicitCommand),
                Box::new(HighRiskEntity),
                Box::new(FastPath),
                Box::new(ModelRouter::new(gateway, config)),
                Box::new(DefaultRoute::new(config)),
            ],
            config,
        )
    }

    pub fn with_strategies(strategies: Vec<Box<dyn RouteStrategy>>, config: &RouterConfig) -> Self {
        Self {
            strategies,
            min_query_chars: config.min_query_chars,
        }
    }

    /// Classify a turn. `on_status` is told when a strategy starts slow work.
    pub async fn classify(
        &self,
        input: &RouteInput<'_>,
        on_status: &(dyn Fn(MessageStatus) + Send + Sync),
    ) -> Classification {
        for strategy in &self.strategies {
            if let Some(status) = strategy.status(input) {
                on_status(status);
            }
            if let Some(decision) = strategy.decide(input).await {
                let classification = self.finish(decision, strategy.name());
                info!(
                    route = classification.route.label(),
                    strategy = classification.strategy,
                    "turn classified"
                );
                return classification;
            }
        }

        Classification {
            route: Route::Direct,
            model_content: None,
            strategy: "none",
        }
    }

    /// Apply the minimum query length to search decisions.
    fn finish(&self, decision: Decision, strategy: &'static str) -> Classification {
        let route = match decision.route {
            Route::Search { query } if query.trim().chars().count() <= self.min_query_chars => {
                debug!(query = %query, "search query too short, answering directly");
                Route::Direct
            }
            route => route,
        };
        Classification {
            route,
            model_content: decision.model_content,
            strategy,
        }
    }
}
