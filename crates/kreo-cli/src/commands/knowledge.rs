//! Knowledge commands.

use kreo_store::KnowledgeStore;
use kreo_server::KreoConfig;

use super::open_state;

/// Teach a fact.
pub(crate) fn learn(config: KreoConfig, question: &str, answer: &str) -> miette::Result<()> {
    let state = open_state(config)?;
    let entry = state
        .orchestrator
        .knowledge()
        .learn(question, answer)
        .map_err(|e| miette::miette!("Failed to learn: {}", e))?;
    println!("Learned: \"{}\" -> \"{}\"", entry.question, entry.answer);
    Ok(())
}

/// Show the entries closest to `query`.
pub(crate) fn recall(config: KreoConfig, query: &str) -> miette::Result<()> {
    let state = open_state(config)?;
    let hits = state
        .orchestrator
        .knowledge()
        .search(query)
        .map_err(|e| miette::miette!("Failed to search knowledge: {}", e))?;

    if hits.is_empty() {
        println!("Nothing recalled for \"{}\".", query);
        return Ok(());
    }
    for hit in hits {
        println!(
            "  [{:.2}] \"{}\" -> \"{}\"",
            hit.score, hit.entry.question, hit.entry.answer
        );
    }
    Ok(())
}
