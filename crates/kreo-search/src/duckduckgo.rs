//! DuckDuckGo HTML search backend.

use async_trait::async_trait;
use futures_util::future::join_all;
use kreo_types::SearchResult;
use reqwest::header;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::gateway::SearchGateway;
use crate::parse::{extract_paragraphs, parse_results};
use crate::ENRICH_COUNT;

/// HTML endpoint that accepts form posts.
pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Scraping client for DuckDuckGo's HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    client: reqwest::Client,
    endpoint: String,
    search_timeout: Duration,
    fetch_timeout: Duration,
    enrich: bool,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            search_timeout: SEARCH_TIMEOUT,
            fetch_timeout: FETCH_TIMEOUT,
            enrich: true,
        }
    }

    /// Point at a different endpoint (used with a local test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Enable or disable fetching page content for the top results.
    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Search, reporting why the engine could not be queried.
    ///
    /// A form POST is tried first; any failure falls back to a plain GET.
    pub async fn try_search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let html = match self.post_form(query).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "search POST failed, trying GET fallback");
                self.get_query(query).await?
            }
        };

        let mut results = parse_results(&html);
        info!(query, count = results.len(), "web search finished");

        if self.enrich {
            self.enrich_top(&mut results).await;
        }
        Ok(results)
    }

    async fn post_form(&self, query: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.search_timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(header::ORIGIN, "https://html.duckduckgo.com")
            .header(header::REFERER, "https://html.duckduckgo.com/")
            .form(&[("q", query)])
            .send()
            .await?;
        read_html(response).await
    }

    async fn get_query(&self, query: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.search_timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .query(&[("q", query)])
            .send()
            .await?;
        read_html(response).await
    }

    async fn fetch_page(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let html = resp.text().await.ok()?;
                extract_paragraphs(&html)
            }
            Ok(resp) => {
                debug!(url, status = %resp.status(), "page fetch skipped");
                None
            }
            Err(e) => {
                debug!(url, error = %e, "page fetch failed");
                None
            }
        }
    }

    /// Replace `content` of the leading results with page text, concurrently.
    async fn enrich_top(&self, results: &mut [SearchResult]) {
        let top = results.len().min(ENRICH_COUNT);
        let pages = join_all(results[..top].iter().map(|r| self.fetch_page(&r.url))).await;
        for (result, page) in results.iter_mut().zip(pages) {
            if let Some(content) = page {
                result.content = content;
            }
        }
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_html(response: reqwest::Response) -> Result<String, SearchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status(status));
    }
    Ok(response.text().await?)
}

#[async_trait]
impl SearchGateway for DuckDuckGo {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "web search failed");
                Vec::new()
            }
        }
    }
}
