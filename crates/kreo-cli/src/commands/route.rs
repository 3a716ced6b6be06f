//! Route command - show how a message would be answered.

use kreo_router::Route;
use kreo_server::KreoConfig;

use super::open_state;

pub(crate) async fn run(config: KreoConfig, text: &str, model: Option<String>) -> miette::Result<()> {
    let model = model.unwrap_or_else(|| config.default_model.clone());
    let state = open_state(config)?;
    let classification = state.orchestrator.classify(text, &[], &model).await;

    println!("Route:    {}", classification.route.label());
    match &classification.route {
        Route::Search { query } | Route::Knowledge { query } => println!("Query:    {}", query),
        Route::Direct => {}
    }
    println!("Decided:  {}", classification.strategy);
    if let Some(content) = &classification.model_content {
        println!("Sent as:  {}", content);
    }
    Ok(())
}
