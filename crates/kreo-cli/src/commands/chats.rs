//! Chat history commands.

use chrono::Local;
use kreo_store::ChatRepository;
use kreo_server::KreoConfig;

use super::open_state;

/// List chats grouped by recency.
pub(crate) fn list(config: KreoConfig) -> miette::Result<()> {
    let state = open_state(config)?;
    let groups = state
        .orchestrator
        .chats()
        .grouped(Local::now())
        .map_err(|e| miette::miette!("Failed to read chats: {}", e))?;

    let mut any = false;
    for (bucket, chats) in groups {
        if chats.is_empty() {
            continue;
        }
        any = true;
        println!("{}", bucket.label());
        for chat in chats {
            println!("  {}  {} ({} messages)", chat.id, chat.title, chat.messages.len());
        }
        println!();
    }
    if !any {
        println!("No chats yet. Start one with: kreo ask <message>");
    }
    Ok(())
}

/// Print every message of a chat.
pub(crate) fn show(config: KreoConfig, id: &str) -> miette::Result<()> {
    let state = open_state(config)?;
    let chat = state
        .orchestrator
        .chats()
        .get(id)
        .map_err(|e| miette::miette!("Failed to read chats: {}", e))?
        .ok_or_else(|| miette::miette!("Chat not found: {}", id))?;

    println!("{}", chat.title);
    println!("{}", "=".repeat(chat.title.chars().count()));
    for message in &chat.messages {
        println!();
        println!("{}:", message.role.as_str());
        if let Some(file) = &message.file {
            println!("  [file: {}]", file.name);
        }
        if message.image.is_some() {
            println!("  [image]");
        }
        println!("{}", message.content);
    }
    Ok(())
}

/// Delete a chat.
pub(crate) fn delete(config: KreoConfig, id: &str) -> miette::Result<()> {
    let state = open_state(config)?;
    let deleted = state
        .orchestrator
        .chats()
        .delete(id)
        .map_err(|e| miette::miette!("Failed to delete chat: {}", e))?;
    if !deleted {
        return Err(miette::miette!("Chat not found: {}", id));
    }
    println!("Deleted {}", id);
    Ok(())
}
