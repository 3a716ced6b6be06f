//! Knowledge base of user-taught facts.

use kreo_types::KnowledgeEntry;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::fuzzy::{item_score, FuzzyOptions};
use crate::json_file::JsonFile;

/// Weight of the question field in fuzzy ranking.
pub const QUESTION_WEIGHT: f64 = 0.7;
/// Weight of the answer field in fuzzy ranking.
pub const ANSWER_WEIGHT: f64 = 0.3;
/// Maximum number of entries returned by a search.
pub const MAX_RESULTS: usize = 3;

/// A search hit with its fuzzy score (lower is better).
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
    pub score: f64,
}

/// Append-only store of knowledge entries.
pub trait KnowledgeStore: Send + Sync {
    /// Append and persist a new entry.
    fn learn(&self, question: &str, answer: &str) -> Result<KnowledgeEntry, StoreError>;

    /// Best matches for `query`, at most [`MAX_RESULTS`], best first.
    fn search(&self, query: &str) -> Result<Vec<ScoredEntry>, StoreError>;

    /// Every entry in insertion order.
    fn entries(&self) -> Result<Vec<KnowledgeEntry>, StoreError>;
}

/// JSON-file knowledge base.
pub struct KnowledgeBase {
    file: JsonFile,
    entries: Mutex<Vec<KnowledgeEntry>>,
    options: FuzzyOptions,
}

impl KnowledgeBase {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::at(path);
        let entries: Vec<KnowledgeEntry> = file.load()?;
        debug!(count = entries.len(), path = ?file.path(), "knowledge base opened");
        Ok(Self {
            file,
            entries: Mutex::new(entries),
            options: FuzzyOptions::default(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            file: JsonFile::memory(),
            entries: Mutex::new(Vec::new()),
            options: FuzzyOptions::default(),
        }
    }

    /// Override the fuzzy matching options.
    pub fn with_options(mut self, options: FuzzyOptions) -> Self {
        self.options = options;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<KnowledgeEntry>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KnowledgeStore for KnowledgeBase {
    fn learn(&self, question: &str, answer: &str) -> Result<KnowledgeEntry, StoreError> {
        let (question, answer) = (question.trim(), answer.trim());
        if question.is_empty() || answer.is_empty() {
            return Err(StoreError::EmptyEntry);
        }

        let entry = KnowledgeEntry::new(question, answer);
        let mut entries = self.lock()?;
        entries.push(entry.clone());
        if let Err(e) = self.file.save(&entries) {
            // Keep memory and disk in step: the append did not happen.
            entries.pop();
            return Err(e);
        }
        info!(question = %entry.question, "learned new fact");
        Ok(entry)
    }

    fn search(&self, query: &str) -> Result<Vec<ScoredEntry>, StoreError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entries = self.lock()?;
        let mut hits: Vec<ScoredEntry> = entries
            .iter()
            .filter_map(|entry| {
                let fields = [
                    (entry.question.as_str(), QUESTION_WEIGHT),
                    (entry.answer.as_str(), ANSWER_WEIGHT),
                ];
                item_score(query, &fields, &self.options)
                    .filter(|score| *score <= self.options.threshold)
                    .map(|score| ScoredEntry {
                        entry: entry.clone(),
                        score,
                    })
            })
            .collect();

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(MAX_RESULTS);
        debug!(query, hits = hits.len(), "knowledge search");
        Ok(hits)
    }

    fn entries(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Ok(self.lock()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_learn_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        let kb = KnowledgeBase::open(&path).unwrap();
        kb.learn("favorite color", "blue").unwrap();

        let reopened = KnowledgeBase::open(&path).unwrap();
        let entries = reopened.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].answer, "blue");
    }

    #[test]
    fn test_learn_rejects_empty() {
        let kb = KnowledgeBase::in_memory();
        assert!(matches!(kb.learn("  ", "x"), Err(StoreError::EmptyEntry)));
        assert!(kb.entries().unwrap().is_empty());
    }

    #[test]
    fn test_search_close_match() {
        let kb = KnowledgeBase::in_memory();
        kb.learn("favorite color", "blue").unwrap();
        let hits = kb.search("favourite colour").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score <= 0.4);
    }

    #[test]
    fn test_search_distant_query_omitted() {
        let kb = KnowledgeBase::in_memory();
        kb.learn("favorite color", "blue").unwrap();
        assert!(kb.search("what color do I like").unwrap().is_empty());
    }

    #[test]
    fn test_search_caps_and_threshold() {
        let kb = KnowledgeBase::in_memory();
        for i in 0..6 {
            kb.learn(&format!("rust tip {}", i), "use clippy").unwrap();
        }
        kb.learn("unrelated", "nothing").unwrap();

        let hits = kb.search("rust tip").unwrap();
        assert_eq!(hits.len(), MAX_RESULTS);
        assert!(hits.iter().all(|h| h.score <= 0.4));
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_search_empty_query() {
        let kb = KnowledgeBase::in_memory();
        kb.learn("a", "b").unwrap();
        assert!(kb.search("   ").unwrap().is_empty());
    }
}
