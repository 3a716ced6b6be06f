//! Model commands.

use kreo_ollama::{ModelGateway, OllamaClient};
use kreo_server::KreoConfig;

/// List models pulled on the Ollama server.
pub(crate) async fn list(config: KreoConfig) -> miette::Result<()> {
    let client = OllamaClient::with_url(config.ollama_url.as_str());
    let models = client
        .list_models()
        .await
        .map_err(|e| miette::miette!("Failed to list models: {}", e))?;

    if models.is_empty() {
        println!("No models pulled.");
        println!();
        println!("To pull the default model, run:");
        println!("  ollama pull {}", config.default_model);
        return Ok(());
    }

    println!("Models on {}:", client.base_url());
    for model in models {
        println!("  - {:<32} {:>6.1} GB", model.name, model.size as f64 / 1e9);
    }
    Ok(())
}

/// Load a model into memory so the first answer starts quickly.
pub(crate) async fn warm(config: KreoConfig, model: Option<String>) -> miette::Result<()> {
    let model = model.unwrap_or_else(|| config.default_model.clone());
    let client = OllamaClient::with_url(config.ollama_url.as_str());

    client
        .check_availability(&model)
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    println!("Warming up {}...", model);
    client
        .warm(&model)
        .await
        .map_err(|e| miette::miette!("Warm-up failed: {}", e))?;
    println!("{} is loaded.", model);
    Ok(())
}
