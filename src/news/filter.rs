//! Relevance filters and duplicate detection for collected news.

use std::collections::HashSet;

/// Keywords identifying stock-market and financial-results coverage.
pub const FINANCE_KEYWORDS: &[&str] = &[
    "stock price",
    "share price",
    "stock market",
    "nasdaq",
    "nyse",
    "market cap",
    "earnings report",
    "quarterly earnings",
    "fiscal quarter",
    "investor",
    "shareholders",
    "dividend",
    "eps",
    "revenue forecast",
    "stock analysis",
    "buy rating",
    "sell rating",
    "hold rating",
    "price target",
    "analyst rating",
    "market outlook",
    "trading volume",
    "stock split",
    "ipo",
    "market value",
    "equity research",
    "wall street",
    "hedge fund",
    "mutual fund",
    "etf",
    "bull market",
    "bear market",
    "stock performance",
    "valuation",
    "p/e ratio",
    "market capitalization",
    "stock forecast",
    "financial results",
    "quarterly results",
    "annual report",
    "sec filing",
    "10-k",
    "10-q",
    "earnings call",
    "guidance",
];

/// Title word-overlap ratio above which two titles are duplicates.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Check whether an article is about stocks or financial results.
///
/// Keywords are matched as case-insensitive substrings of the title and description.
pub fn is_finance_news(title: &str, description: Option<&str>) -> bool {
    let text = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();
    FINANCE_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Lower-case a title and drop punctuation, keeping word characters and whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Word-set overlap of two titles relative to the larger set.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a_norm = normalize_title(a);
    let b_norm = normalize_title(b);
    let a_words: HashSet<&str> = a_norm.split_whitespace().collect();
    let b_words: HashSet<&str> = b_norm.split_whitespace().collect();

    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }

    let overlap = a_words.intersection(&b_words).count();
    overlap as f64 / a_words.len().max(b_words.len()) as f64
}

/// Check whether `title` duplicates any of `existing`.
pub fn is_similar_title<'a>(title: &str, existing: impl IntoIterator<Item = &'a str>) -> bool {
    existing
        .into_iter()
        .any(|other| title_similarity(title, other) > SIMILARITY_THRESHOLD)
}

/// Search terms for a competitor: its name, plus the first word of multi-word names.
pub fn search_terms(name: &str) -> Vec<String> {
    let mut terms = vec![name.to_string()];
    let mut words = name.split_whitespace();
    if let (Some(first), Some(_)) = (words.next(), words.next()) {
        terms.push(first.to_string());
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_news_detected() {
        assert!(is_finance_news("Keysight stock price jumps 5%", None));
        assert!(is_finance_news("Q3 results", Some("The earnings call covered GUIDANCE")));
        assert!(is_finance_news("Trading at a 25x P/E ratio", None));
        assert!(is_finance_news("Company files 10-K with regulators", None));
        assert!(is_finance_news("NASDAQ: KEYS rises", None));
    }

    #[test]
    fn test_finance_keywords_match_inside_words() {
        assert!(is_finance_news("Investors cheer Megger results", None));
        assert!(is_finance_news("Megger IPOs next year", None));
        assert!(is_finance_news("Annual investor day", None));
        assert!(!is_finance_news("New thermal camera launched", Some("Ships in March")));
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Hello, World! It's new."), "hello world its new");
    }

    #[test]
    fn test_title_similarity() {
        assert_eq!(title_similarity("a b c d e", "a b c d e"), 1.0);
        assert!((title_similarity("a b c d", "a b c e") - 0.75).abs() < f64::EPSILON);
        assert_eq!(title_similarity("", "a"), 0.0);
        assert_eq!(title_similarity("!!!", "a"), 0.0);
    }

    #[test]
    fn test_is_similar_title() {
        let existing = [
            "Keysight launches new oscilloscope line",
            "Unrelated headline here",
        ];
        assert!(is_similar_title(
            "Keysight Launches New Oscilloscope Line!",
            existing.iter().copied()
        ));
        // 4/5 = 0.8 is not above the threshold
        assert!(!is_similar_title(
            "Keysight launches new oscilloscope",
            ["Keysight launches new oscilloscope today"]
        ));
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms("Megger"), vec!["Megger"]);
        assert_eq!(
            search_terms("Keysight Technologies"),
            vec!["Keysight Technologies", "Keysight"]
        );
    }
}
