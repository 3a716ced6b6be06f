//! Ollama model gateway for Kreo.
//!
//! The gateway forwards chat requests to a locally running Ollama server.
//! Streaming replies arrive as JSON lines (`{"message":{"content":..},
//! "done":false}`) and are exposed as a [`DeltaStream`] of content deltas.
//!
//! The orchestration layer talks to the runtime only through the
//! [`ModelGateway`] trait so it can be exercised against a scripted model in
//! tests.

mod client;
mod decode;
mod error;
mod gateway;
mod wire;

pub use client::OllamaClient;
pub use decode::{delta_stream, Decoded, LineDecoder};
pub use error::OllamaError;
pub use gateway::{DeltaStream, ModelGateway};
pub use wire::{ChatRequest, ModelInfo, RequestOptions, ResponseFormat, WireMessage};

/// Default Ollama server URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model used when settings do not name one.
pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// How long a warmed-up model stays resident.
pub const WARM_KEEP_ALIVE: &str = "30m";
