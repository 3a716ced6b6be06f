use async_trait::async_trait;
use kreo_types::SearchResult;

/// Anything that can answer a web query.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Up to [`crate::MAX_RESULTS`] results, best first. Failures yield an
    /// empty list.
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}
