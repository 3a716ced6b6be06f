//! Text patterns that steer routing without a model call.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Leading search command: `/web`, `/search` or a phrase such as
    /// "search for", "google", "look up", "check online about".
    static ref SEARCH_TRIGGER: Regex = Regex::new(
        r"(?i)^(?:/(?:web|search)|(?:please\s+)?(?:search(?:\s+(?:for|over|on|about|this))?|google|look\s+up|find\s+(?:more\s+)?info(?:rmation)?\s+on|check\s+online(?:\s+(?:for|about))?))\b\s*"
    )
    .unwrap_or_else(|_| unreachable!());

    /// A remainder that names no topic ("over net", "the web", "this").
    static ref GENERIC_FILLER: Regex = Regex::new(
        r"(?i)^(?:(?:on|over|in|the|this|that|it)\s*)*(?:web|net|internet|online|here|page|site)?$"
    )
    .unwrap_or_else(|_| unreachable!());

    /// Named people, papers and studies where an unverified answer is
    /// likely to be invented.
    static ref HIGH_RISK_ENTITY: Regex = Regex::new(
        r"(?i)\b(?:Dr\.\s+\w+|Professor\s+\w+|researcher\s+\w+|paper\s+(?:on|by|titled|called)|study\s+(?:by|on)|research\s+by|published\s+(?:in|by)|ethicist|economist\s+\w+|scientist\s+\w+|author\s+of|wrote\s+the\s+paper|20(?:18|19|20|21|22|23|24)\s+paper)\b"
    )
    .unwrap_or_else(|_| unreachable!());

    /// Coding and creative requests that never need the web.
    static ref FAST_PATH: Regex = Regex::new(
        r"(?i)\b(?:write|create|code|function|class|debug|fix|explain|summarize|translate|poem|story|joke|email|const|var|let|import|return)\b"
    )
    .unwrap_or_else(|_| unreachable!());
}

/// Strip a leading search command. Returns the trimmed remainder, or `None`
/// when `text` is not a command.
pub fn strip_search_command(text: &str) -> Option<&str> {
    let text = text.trim();
    let found = SEARCH_TRIGGER.find(text)?;
    Some(text[found.end()..].trim())
}

/// Whether a command remainder is empty or names no topic.
pub fn is_generic_filler(rest: &str) -> bool {
    GENERIC_FILLER.is_match(rest.trim())
}

pub fn is_high_risk(text: &str) -> bool {
    HIGH_RISK_ENTITY.is_match(text)
}

pub fn is_fast_path(text: &str) -> bool {
    FAST_PATH.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_commands() {
        assert_eq!(strip_search_command("/web rust 1.80 release"), Some("rust 1.80 release"));
        assert_eq!(strip_search_command("/search"), Some(""));
        assert_eq!(strip_search_command("/websites"), None);
    }

    #[test]
    fn test_natural_language_triggers() {
        assert_eq!(strip_search_command("Please search for tokio docs"), Some("tokio docs"));
        assert_eq!(strip_search_command("google weather in Pune"), Some("weather in Pune"));
        assert_eq!(strip_search_command("look up axum"), Some("axum"));
        assert_eq!(
            strip_search_command("find more information on serde"),
            Some("serde")
        );
        assert_eq!(strip_search_command("check online about it"), Some("it"));
        assert_eq!(strip_search_command("search over net"), Some("net"));
    }

    #[test]
    fn test_words_sharing_a_prefix_are_not_commands() {
        assert_eq!(strip_search_command("searching is hard"), None);
        assert_eq!(strip_search_command("googled it already"), None);
        assert_eq!(strip_search_command("what is a search tree"), None);
    }

    #[test]
    fn test_generic_filler() {
        for rest in ["", "net", "over the internet", "on web", "this", "the web", "it"] {
            assert!(is_generic_filler(rest), "{:?} should be filler", rest);
        }
        assert!(!is_generic_filler("rust news"));
        assert!(!is_generic_filler("then"));
    }

    #[test]
    fn test_high_risk_entities() {
        assert!(is_high_risk("What did Dr. Smith discover?"));
        assert!(is_high_risk("summarize the 2021 paper on attention"));
        assert!(is_high_risk("who is the author of Dune"));
        assert!(!is_high_risk("how do I sort a vector"));
    }

    #[test]
    fn test_fast_path() {
        assert!(is_fast_path("write a function that reverses a string"));
        assert!(is_fast_path("Tell me a joke"));
        assert!(!is_fast_path("latest cricket score"));
    }
}
