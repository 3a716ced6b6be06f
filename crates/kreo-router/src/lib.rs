//! # Kreo Router
//!
//! Runs chat turns for Kreo. A turn is classified (direct answer, taught
//! knowledge, or live web search), its system prompt is augmented with the
//! matching context, and the model's reply is streamed into the stored chat.
//!
//! ```text
//! user text ──► Classifier ──► context (search / knowledge) ──► PromptBuilder
//!                                                                   │
//!     chat store ◄── relay ◄── model stream ◄── ChatRequest ◄───────┘
//! ```
//!
//! Title generation and correction learning run as detached side tasks.

pub mod attachments;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod side_tasks;
pub mod stream;
pub mod trigger;
pub mod verify;

#[cfg(test)]
mod testing;

pub use classifier::{Classification, Classifier, Decision, Route, RouteInput, RouteStrategy};
pub use config::{RouterConfig, RouterConfigBuilder};
pub use engine::{Orchestrator, TurnEvent, TurnFinish, TurnOutcome, TurnRequest};
pub use error::RouterError;
pub use stream::{RelayOutcome, STOPPED_MARKER};
pub use verify::Verification;
