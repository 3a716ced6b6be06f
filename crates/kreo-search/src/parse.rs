//! HTML extraction for search result pages and linked articles.

use kreo_types::SearchResult;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::MAX_RESULTS;

/// Paragraphs shorter than this are navigation or boilerplate.
const MIN_PARAGRAPH_CHARS: usize = 50;

/// Longest page excerpt kept per result.
pub const MAX_CONTENT_CHARS: usize = 1500;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!())
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract result blocks from a DuckDuckGo HTML page.
///
/// Blocks without a title or link are skipped.
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let result_sel = selector(".result");
    let title_sel = selector(".result__title a");
    let snippet_sel = selector(".result__snippet");

    doc.select(&result_sel)
        .filter_map(|block| {
            let anchor = block.select(&title_sel).next()?;
            let title = text_of(anchor);
            let href = anchor.value().attr("href")?.trim();
            if title.is_empty() || href.is_empty() {
                return None;
            }
            let snippet = block.select(&snippet_sel).next().map(text_of).unwrap_or_default();
            Some(SearchResult::new(title, resolve_link(href), snippet))
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Turn a DuckDuckGo redirect (`//duckduckgo.com/l/?uddg=...`) into the
/// target URL. Other links are returned with a scheme added when missing.
pub fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    if let Ok(url) = Url::parse(&absolute) {
        let is_redirect = url.domain().is_some_and(|d| d.ends_with("duckduckgo.com"))
            && url.path().starts_with("/l/");
        if is_redirect {
            if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
                return target.into_owned();
            }
        }
    }
    absolute
}

/// Join the substantial `<p>` texts of an article, cut to
/// [`MAX_CONTENT_CHARS`] with a trailing `...`. `None` when nothing qualifies.
pub fn extract_paragraphs(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let p_sel = selector("p");

    let text = doc
        .select(&p_sel)
        .map(text_of)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return None;
    }
    if text.chars().count() > MAX_CONTENT_CHARS {
        let mut cut: String = text.chars().take(MAX_CONTENT_CHARS).collect();
        cut.push_str("...");
        Some(cut)
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result">
            <h2 class="result__title"><a href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=x">Rust   Programming Language</a></h2>
            <a class="result__snippet">A language empowering everyone.</a>
          </div>
          <div class="result">
            <h2 class="result__title"><a href="">No link</a></h2>
          </div>
          <div class="result">
            <h2 class="result__title"><a href="https://doc.rust-lang.org/book/">The Book</a></h2>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_results() {
        let results = parse_results(RESULTS_PAGE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(results[0].snippet, "A language empowering everyone.");
        assert_eq!(results[0].content, results[0].snippet);
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_parse_results_capped() {
        let block = r#"<div class="result"><h2 class="result__title"><a href="https://a.example">A</a></h2></div>"#;
        let html = format!("<html><body>{}</body></html>", block.repeat(8));
        assert_eq!(parse_results(&html).len(), MAX_RESULTS);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>blocked</body></html>").is_empty());
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(resolve_link("https://example.com/x"), "https://example.com/x");
        assert_eq!(resolve_link("//example.com/x"), "https://example.com/x");
    }

    #[test]
    fn test_extract_paragraphs() {
        let long = "This paragraph is comfortably longer than fifty characters in total.";
        let html = format!("<p>short</p><p>{}</p><p>{}</p>", long, long);
        assert_eq!(extract_paragraphs(&html).unwrap(), format!("{} {}", long, long));
        assert!(extract_paragraphs("<p>tiny</p>").is_none());
    }

    #[test]
    fn test_extract_paragraphs_truncated() {
        let para = format!("<p>{}</p>", "word ".repeat(100));
        let html = para.repeat(10);
        let text = extract_paragraphs(&html).unwrap();
        assert_eq!(text.chars().count(), MAX_CONTENT_CHARS + 3);
        assert!(text.ends_with("..."));
    }
}
