//! CLI commands.

pub mod ask;
pub mod chats;
pub mod info;
pub mod knowledge;
pub mod model;
pub mod route;
pub mod serve;

use kreo_server::{AppState, KreoConfig, KreoConfigBuilder};
use std::path::PathBuf;

/// Read the environment, then apply command-line overrides.
pub(crate) fn load_config(
    ollama_url: Option<String>,
    data_dir: Option<PathBuf>,
) -> miette::Result<KreoConfig> {
    let config = KreoConfig::from_env().map_err(|e| miette::miette!("Invalid configuration: {}", e))?;
    let mut builder = KreoConfigBuilder::from_config(config);
    if let Some(url) = ollama_url {
        builder = builder.ollama_url(url);
    }
    if let Some(dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    Ok(builder.build())
}

/// Open the stores and gateways described by `config`.
pub(crate) fn open_state(config: KreoConfig) -> miette::Result<AppState> {
    AppState::open(config).map_err(|e| miette::miette!("Failed to open Kreo data: {}", e))
}
