//! Web search results.

use serde::{Deserialize, Serialize};

/// One web search hit. Produced per request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Page text when the result was enriched, otherwise the snippet.
    #[serde(default)]
    pub content: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        let snippet = snippet.into();
        Self {
            title: title.into(),
            url: url.into(),
            content: snippet.clone(),
            snippet,
        }
    }

    /// Lower-cased `title snippet content`, used for entity verification.
    pub fn haystack(&self) -> String {
        format!("{} {} {}", self.title, self.snippet, self.content).to_lowercase()
    }
}
