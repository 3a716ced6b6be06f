//! Checking that named people and papers actually appear in search results.

use kreo_types::SearchResult;
use lazy_static::lazy_static;
use regex::Regex;

/// Paper titles must be longer than this to be checked.
const MIN_PAPER_TITLE_CHARS: usize = 10;
/// Characters of a paper title reported back to the model.
const PAPER_TITLE_REPORT_CHARS: usize = 30;
/// Leading words of a paper title that must appear in the results.
const PAPER_PROBE_WORDS: usize = 4;

lazy_static! {
    static ref PERSON: Regex =
        Regex::new(r"(?i)(?:Dr\.|Professor|Prof\.)\s+([A-Z][a-z]+(?:\s+[A-Z]\.?)?\s+[A-Z][a-z]+)")
            .unwrap_or_else(|_| unreachable!());
    static ref PAPER: Regex = Regex::new(
        r#"(?i)(?:paper|titled|called)\s+["']?([^"']+?)["']?(?:\s+(?:authored|by|from)|\s*$)"#
    )
    .unwrap_or_else(|_| unreachable!());
}

/// An entity named in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Lower-cased form reported to the model.
    pub label: String,
    /// Lower-cased text searched for in the results.
    pub probe: String,
}

/// Extract people (`Dr. Jane Smith`) and a paper title from `query`.
pub fn extract_entities(query: &str) -> Vec<Entity> {
    let mut entities: Vec<Entity> = PERSON
        .captures_iter(query)
        .filter_map(|caps| caps.get(1))
        .map(|name| {
            let name = name.as_str().to_lowercase();
            Entity {
                label: name.clone(),
                probe: name,
            }
        })
        .collect();

    if let Some(title) = PAPER.captures(query).and_then(|caps| caps.get(1)) {
        let title = title.as_str().trim().to_lowercase();
        if title.chars().count() > MIN_PAPER_TITLE_CHARS {
            entities.push(Entity {
                label: title.chars().take(PAPER_TITLE_REPORT_CHARS).collect(),
                probe: title
                    .split(' ')
                    .take(PAPER_PROBE_WORDS)
                    .collect::<Vec<_>>()
                    .join(" "),
            });
        }
    }
    entities
}

/// Outcome of checking a query's entities against search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The query names nothing specific.
    NoEntities,
    /// At least one entity appears in the results.
    Found,
    /// Entities were named but none appears. Holds their labels.
    NotFound(Vec<String>),
}

/// Check whether any entity named in `query` occurs in `results`.
pub fn verify(query: &str, results: &[SearchResult]) -> Verification {
    let entities = extract_entities(query);
    if entities.is_empty() {
        return Verification::NoEntities;
    }

    let haystack = results
        .iter()
        .map(SearchResult::haystack)
        .collect::<Vec<_>>()
        .join(" ");

    if entities.iter().any(|e| haystack.contains(&e.probe)) {
        Verification::Found
    } else {
        Verification::NotFound(entities.into_iter().map(|e| e.label).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_person() {
        let entities = extract_entities("What did Dr. Jane Smith say about sleep?");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].probe, "jane smith");
    }

    #[test]
    fn test_extract_person_with_initial() {
        let entities = extract_entities("Summarize Professor Alan M. Turing's work");
        assert_eq!(entities[0].probe, "alan m. turing");
    }

    #[test]
    fn test_extract_paper_title() {
        let entities =
            extract_entities("Explain the paper titled \"Quantum Ethics in Practice and Theory\"");
        let paper = entities.last().unwrap();
        assert_eq!(paper.label, "quantum ethics in practice and");
        assert_eq!(paper.probe, "quantum ethics in practice");
    }

    #[test]
    fn test_short_paper_title_ignored() {
        assert!(extract_entities("read the paper Ethics").is_empty());
    }

    #[test]
    fn test_verify_found() {
        let results = vec![SearchResult::new(
            "Jane Smith - Sleep Lab",
            "https://example.org",
            "Profile of researcher Jane Smith.",
        )];
        assert_eq!(verify("Who is Dr. Jane Smith?", &results), Verification::Found);
    }

    #[test]
    fn test_verify_not_found() {
        let results = vec![SearchResult::new("Sleep", "https://example.org", "General advice.")];
        assert_eq!(
            verify("Who is Dr. Jane Smith?", &results),
            Verification::NotFound(vec!["jane smith".into()])
        );
    }

    #[test]
    fn test_verify_without_entities() {
        assert_eq!(verify("weather in Pune", &[]), Verification::NoEntities);
    }
}
