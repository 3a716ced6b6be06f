//! System prompt assembly.

use chrono::{DateTime, Local};
use kreo_store::ScoredEntry;
use kreo_types::SearchResult;

use crate::verify::Verification;

const PERSONA: &str = "
You are Kreo, a friendly and intelligent AI assistant.

PERSONALITY:
- Be warm, conversational, and personable
- Vary your responses and never repeat the same phrases
- For casual chat (greetings, how are you, etc.) be friendly and natural like a helpful colleague
- For technical questions be precise and professional

CONTEXT MANAGEMENT:
- STRICTLY EVALUATE each new query independently if the topic seems different.
- If the user asks a completely new question (e.g., switches from coding to cooking), DO NOT relate it to the previous conversation.
- Treat topic changes as a fresh start.

CRITICAL THINKING & REASONING VERIFICATION:
- Before answering, internally verify your logic
- For DATE COMPARISONS: Carefully check which year is earlier/later (smaller year = earlier)
- EXAMPLE: 1945 comes BEFORE 1949. If X was founded in 1945 and Y in 1949, X came FIRST.
- Double-check your conclusion matches the facts you stated
- Think step-by-step for math or logic problems
- If you catch yourself making a mistake, correct it immediately

FACT VERIFICATION (CRITICAL - ANTI-HALLUCINATION):
- Your training data has a cutoff date and may be outdated
- If asked about a SPECIFIC person, paper, or research you DON'T RECOGNIZE:
  -> Say: 'I don't have verified information about [name/paper]. This might not exist or could be spelled differently.'
  -> DO NOT make up details about people or papers you don't know!
- If web search results are provided [LIVE WEB RESEARCH], use ONLY that data
- If web search found nothing, say: 'I searched but couldn't find verified information.'
- NEVER fabricate facts, names, dates, or paper titles
- When citing web sources, mention the source number [1], [2] etc.

RESPONSE STYLE (CONCISE & DIRECT):
- Keep answers SHORT and to the point
- For simple questions: 1-3 sentences max
- For factual questions: State the answer first, then brief explanation if needed
- Use bullet points for lists instead of long paragraphs
- Don't add unnecessary pleasantries like 'Great question!' every time
- Technical answers: Be precise, skip the preamble
";

const TRUNCATION_MARK: &str = "\n[...]";

/// Fixed behavioural instructions, ending with the user and date line.
pub fn instructions(user_name: &str, now: DateTime<Local>) -> String {
    let user_name = if user_name.trim().is_empty() {
        "User"
    } else {
        user_name.trim()
    };
    format!(
        "{}\nUSER: {} | DATE: {} (mention only if asked)\n",
        PERSONA,
        user_name,
        now.format("%A, %-d %B %Y, %H:%M")
    )
}

/// A context block whose framing survives the prompt budget.
///
/// `head` and `tail` carry the instructions and are always kept whole; only
/// `body` is cut when the budget runs short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBlock {
    pub head: String,
    pub body: String,
    pub tail: String,
}

impl ContextBlock {
    pub fn new(head: impl Into<String>, body: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            body: body.into(),
            tail: tail.into(),
        }
    }

    /// A block with nothing pinned.
    pub fn plain(body: impl Into<String>) -> Self {
        Self::new("", body, "")
    }

    pub fn is_empty(&self) -> bool {
        self.head.trim().is_empty() && self.body.trim().is_empty() && self.tail.trim().is_empty()
    }

    fn is_plain(&self) -> bool {
        self.head.is_empty() && self.tail.is_empty()
    }

    pub fn render(&self) -> String {
        format!("{}{}{}", self.head, self.body, self.tail)
    }
}

/// Context block for web results, shaped by the verification outcome.
pub fn search_block(results: &[SearchResult], verification: &Verification) -> ContextBlock {
    if results.is_empty() {
        return ContextBlock::new(
            "[WEB SEARCH RETURNED NO RESULTS]\nThe user asked about something specific, but web search found nothing. Say: \"I couldn't find any verified information about this. The person or paper may not exist.\"",
            "",
            "",
        );
    }

    let sources = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("SOURCE {} [{}] ({}):\n{}\n", i + 1, r.title, r.url, r.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    match verification {
        Verification::NotFound(entities) => {
            let entities = entities.join(", ");
            ContextBlock::new(
                format!(
                    "[WEB SEARCH VERIFICATION FAILED]
I searched the web for: {entities}
RESULT: The specific person, paper, or entity was NOT FOUND in any web source.

Web results returned generic/unrelated information:
"
                ),
                sources,
                format!(
                    "

CRITICAL INSTRUCTION: The user asked about \"{entities}\" but this EXACT entity does NOT appear in any search result. This likely means the person or paper does not exist, the name is misspelled, or it is a trap question.

YOU MUST SAY: \"I searched the web but could not find any verified information about [the specific name/paper]. This person or paper may not exist, or the details provided may be inaccurate. I cannot provide information I haven't verified.\"

DO NOT fabricate an answer based on unrelated search results!"
                ),
            )
        }
        Verification::Found | Verification::NoEntities => ContextBlock::new(
            format!("[LIVE WEB RESEARCH from {} SOURCES]:\n", results.len()),
            sources,
            "\n\nINSTRUCTIONS: Use ONLY the information from these sources. Cite as [1], [2], etc.",
        ),
    }
}

/// Context block for recalled knowledge. `None` when nothing matched.
pub fn knowledge_block(hits: &[ScoredEntry]) -> Option<ContextBlock> {
    if hits.is_empty() {
        return None;
    }
    let facts = hits
        .iter()
        .map(|h| {
            format!(
                "* User previously taught: \"{}\" -> \"{}\"",
                h.entry.question, h.entry.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(ContextBlock::new(
        "[RELEVANT RECALLED KNOWLEDGE]:\n",
        facts,
        "\n(Use this knowledge to answer if relevant)",
    ))
}

const BLOCK_SEPARATOR: &str = "\n\n";

/// Builds the final system prompt within a character budget.
///
/// The base prompt, the instructions and the pinned parts of the context
/// block are always kept whole, even past the budget. Block bodies are
/// fitted into what is left, the recent-context block giving way before the
/// knowledge or search context.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    base: String,
    instructions: String,
    context: Option<ContextBlock>,
    recent: Option<ContextBlock>,
    budget: usize,
}

impl PromptBuilder {
    pub fn new(base: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            instructions: instructions.into(),
            context: None,
            recent: None,
            budget: usize::MAX,
        }
    }

    /// Knowledge or search context.
    pub fn context(mut self, block: Option<ContextBlock>) -> Self {
        self.context = block.filter(|b| !b.is_empty());
        self
    }

    /// Summary of other recent chats.
    pub fn recent(mut self, block: Option<String>) -> Self {
        self.recent = block.map(ContextBlock::plain).filter(|b| !b.is_empty());
        self
    }

    /// Maximum prompt length in characters.
    pub fn budget(mut self, chars: usize) -> Self {
        self.budget = chars;
        self
    }

    pub fn build(self) -> String {
        let mut prompt = format!("{}{}", self.base, self.instructions);
        let mut remaining = self.budget.saturating_sub(prompt.chars().count());

        for block in [self.context, self.recent].into_iter().flatten() {
            let pinned = BLOCK_SEPARATOR.chars().count()
                + block.head.chars().count()
                + block.tail.chars().count();
            let room = remaining.saturating_sub(pinned);
            let body = fit(&block.body, room);
            if block.is_plain() && body.is_none() {
                remaining = 0;
                continue;
            }
            let body = body.unwrap_or_default();
            remaining = room.saturating_sub(body.chars().count());
            prompt.push_str(BLOCK_SEPARATOR);
            prompt.push_str(&block.head);
            prompt.push_str(&body);
            prompt.push_str(&block.tail);
        }
        prompt
    }
}

/// `text` cut to at most `max` characters, marking any cut.
fn fit(text: &str, max: usize) -> Option<String> {
    let len = text.chars().count();
    if len <= max {
        return Some(text.to_string());
    }
    let mark = TRUNCATION_MARK.chars().count();
    if max <= mark + 2 {
        return None;
    }
    let mut kept: String = text.chars().take(max - mark).collect();
    kept.push_str(TRUNCATION_MARK);
    Some(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kreo_types::KnowledgeEntry;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_instructions_carry_user_and_date() {
        let text = instructions("Asha", now());
        assert!(text.contains("You are Kreo"));
        assert!(text.ends_with("USER: Asha | DATE: Friday, 15 March 2024, 09:30 (mention only if asked)\n"));
        assert!(instructions("  ", now()).contains("USER: User |"));
    }

    #[test]
    fn test_builder_unbounded_keeps_everything() {
        let prompt = PromptBuilder::new("BASE", "INSTR")
            .context(Some(ContextBlock::plain("CTX")))
            .recent(Some("RECENT".into()))
            .build();
        assert_eq!(prompt, "BASEINSTR\n\nCTX\n\nRECENT");
    }

    #[test]
    fn test_builder_drops_recent_before_context() {
        let context = "C".repeat(50);
        let prompt = PromptBuilder::new("BASE", "INSTR")
            .context(Some(ContextBlock::plain(context.clone())))
            .recent(Some("R".repeat(50)))
            .budget(9 + 52)
            .build();
        assert_eq!(prompt, format!("BASEINSTR\n\n{}", context));
    }

    #[test]
    fn test_builder_truncates_context_but_never_base() {
        let base = "B".repeat(100);
        let prompt = PromptBuilder::new(base.clone(), "")
            .context(Some(ContextBlock::plain("C".repeat(100))))
            .budget(130)
            .build();
        assert!(prompt.starts_with(&base));
        assert!(prompt.ends_with(TRUNCATION_MARK));
        assert_eq!(prompt.chars().count(), 130);

        let tiny = PromptBuilder::new(base.clone(), "")
            .context(Some(ContextBlock::plain("C")))
            .budget(50)
            .build();
        assert_eq!(tiny, base);
    }

    #[test]
    fn test_search_block_variants() {
        let results = vec![SearchResult::new("Title", "https://a.example", "snippet")];
        let ok = search_block(&results, &Verification::Found).render();
        assert!(ok.starts_with("[LIVE WEB RESEARCH from 1 SOURCES]"));
        assert!(ok.contains("SOURCE 1 [Title] (https://a.example):\nsnippet"));

        let failed =
            search_block(&results, &Verification::NotFound(vec!["jane smith".into()])).render();
        assert!(failed.starts_with("[WEB SEARCH VERIFICATION FAILED]"));
        assert!(failed.contains("I searched the web for: jane smith"));

        let empty = search_block(&[], &Verification::NoEntities).render();
        assert!(empty.starts_with("[WEB SEARCH RETURNED NO RESULTS]"));
    }

    #[test]
    fn test_knowledge_block() {
        assert!(knowledge_block(&[]).is_none());
        let hit = ScoredEntry {
            entry: KnowledgeEntry::new("favorite color", "blue"),
            score: 0.01,
        };
        let block = knowledge_block(&[hit]).unwrap().render();
        assert!(block.contains("* User previously taught: \"favorite color\" -> \"blue\""));
    }

    fn enriched_results() -> Vec<SearchResult> {
        (1..=5)
            .map(|i| {
                let content = if i <= 2 { "x".repeat(1500) } else { format!("snippet {}", i) };
                SearchResult::new(format!("Result {}", i), format!("https://{}.example", i), content)
            })
            .collect()
    }

    #[test]
    fn test_verification_instructions_survive_tight_budget() {
        let config = crate::config::RouterConfig::default();
        let block = search_block(
            &enriched_results(),
            &Verification::NotFound(vec!["elena marsh".into()]),
        );
        let prompt = PromptBuilder::new("", instructions("Asha", now()))
            .context(Some(block))
            .recent(Some("RECENT CONVERSATION HISTORY".into()))
            .budget(config.prompt_budget(2048))
            .build();

        assert!(prompt.contains("[WEB SEARCH VERIFICATION FAILED]"));
        assert!(prompt.contains("CRITICAL INSTRUCTION"));
        assert!(prompt.contains("YOU MUST SAY:"));
        assert!(prompt.ends_with("DO NOT fabricate an answer based on unrelated search results!"));
        assert!(prompt.contains(TRUNCATION_MARK));
        assert!(!prompt.contains("RECENT CONVERSATION HISTORY"));
        assert!(prompt.chars().count() <= config.prompt_budget(2048));
    }

    #[test]
    fn test_pinned_instructions_kept_past_budget() {
        let config = crate::config::RouterConfig::default();
        let budget = config.prompt_budget(512);
        let base = instructions("Asha", now());
        assert!(base.chars().count() > budget);

        let failed = PromptBuilder::new("", base.clone())
            .context(Some(search_block(
                &enriched_results(),
                &Verification::NotFound(vec!["elena marsh".into()]),
            )))
            .budget(budget)
            .build();
        assert!(failed.contains("YOU MUST SAY:"));
        assert!(!failed.contains("SOURCE 1"));

        let empty = PromptBuilder::new("", base)
            .context(Some(search_block(&[], &Verification::NoEntities)))
            .budget(budget)
            .build();
        assert!(empty.ends_with("The person or paper may not exist.\""));
    }
}
