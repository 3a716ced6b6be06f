//! Web search for Kreo.
//!
//! [`DuckDuckGo`] scrapes the HTML endpoint of DuckDuckGo and enriches the
//! best hits with paragraph text from the linked pages. Callers depend on the
//! [`SearchGateway`] trait, which never fails: an unreachable or blocked
//! search engine yields an empty result list.

mod duckduckgo;
mod error;
mod gateway;
pub mod parse;

pub use duckduckgo::DuckDuckGo;
pub use error::SearchError;
pub use gateway::SearchGateway;

/// Maximum number of results returned per query.
pub const MAX_RESULTS: usize = 5;

/// Number of leading results whose pages are fetched for extra content.
pub const ENRICH_COUNT: usize = 2;
