//! Info command - show configuration and store information.

use kreo_store::{paths, ChatRepository, KnowledgeStore};
use kreo_server::KreoConfig;

use super::open_state;

pub(crate) fn run(config: KreoConfig) -> miette::Result<()> {
    println!("Kreo");
    println!("====");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Configuration:");
    println!("  Ollama:        {}", config.ollama_url);
    println!("  Default model: {}", config.default_model);
    println!("  Backend bind:  {}", config.bind);
    println!("  Warm on start: {}", config.warm_on_start);
    println!("  Search limit:  {}s", config.search_timeout.as_secs());
    println!();

    println!("Data:");
    println!("  Chats:     {}", paths::chats_path(&config.data_dir).display());
    println!("  Knowledge: {}", paths::knowledge_path(&config.data_dir).display());

    let state = open_state(config)?;
    let chats = state
        .orchestrator
        .chats()
        .list()
        .map_err(|e| miette::miette!("Failed to read chats: {}", e))?;
    let entries = state
        .orchestrator
        .knowledge()
        .entries()
        .map_err(|e| miette::miette!("Failed to read knowledge: {}", e))?;
    println!("  {} chats, {} knowledge entries", chats.len(), entries.len());
    println!();

    println!("Environment: KREO_OLLAMA_URL, KREO_BIND, KREO_DATA_DIR, KREO_MODEL,");
    println!("             KREO_WARM, KREO_SEARCH_TIMEOUT, KREO_LOG");
    Ok(())
}
