//! Text extraction, hashing and diffing of monitored pages.

use scraper::{ElementRef, Html, Node, Selector};
use sha2::{Digest, Sha256};
use similar::TextDiff;

use crate::fetch::truncate_chars;

/// Elements whose subtrees never contribute page text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
];

/// Elements rendered on their own line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "body", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre",
    "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Candidate content roots, in order of preference.
const CONTENT_ROOTS: &[&str] = &[
    "main",
    "article",
    "div.content",
    "div.main-content",
    "div.page-content",
    "body",
];

/// Maximum number of lines listed per section of a change summary.
const SUMMARY_MAX_LINES: usize = 10;

/// Maximum characters shown per summarized line.
const SUMMARY_LINE_CHARS: usize = 100;

/// Extract readable text from an HTML document.
///
/// Lines are trimmed and empty lines dropped.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = CONTENT_ROOTS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).find(|el| !inside_skipped(*el)))
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    collect_text(root, &mut raw);

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether an element sits in a subtree that contributes no text.
fn inside_skipped(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| SKIPPED_TAGS.contains(&ancestor.value().name()))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child_ref, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// SHA-256 hex digest of whitespace-normalised text.
pub fn content_hash(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{:x}", digest)
}

/// Unified diff between two texts with three lines of context.
///
/// Returns an empty string when the texts are equal line by line.
pub fn unified_diff(old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header("previous", "current")
        .to_string()
}

/// Human-readable summary of a unified diff.
pub fn summarize_changes(diff: &str) -> String {
    if diff.is_empty() {
        return "No changes detected".to_string();
    }

    let mut added = Vec::new();
    let mut removed = Vec::new();
    for line in diff.lines() {
        if let Some(rest) = line.strip_prefix('+') {
            if !line.starts_with("+++") && !rest.trim().is_empty() {
                added.push(rest.trim());
            }
        } else if let Some(rest) = line.strip_prefix('-') {
            if !line.starts_with("---") && !rest.trim().is_empty() {
                removed.push(rest.trim());
            }
        }
    }

    let mut parts = Vec::new();
    summarize_section(&mut parts, "Added", '+', &added);
    summarize_section(&mut parts, "Removed", '-', &removed);

    if parts.is_empty() {
        "Minor formatting changes only".to_string()
    } else {
        parts.join("\n\n")
    }
}

fn summarize_section(parts: &mut Vec<String>, label: &str, marker: char, lines: &[&str]) {
    if lines.is_empty() {
        return;
    }

    let listed = lines
        .iter()
        .take(SUMMARY_MAX_LINES)
        .map(|line| format!("  {} {}", marker, truncate_chars(line, SUMMARY_LINE_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");
    parts.push(format!("{} ({} lines):\n{}", label, lines.len(), listed));

    if lines.len() > SUMMARY_MAX_LINES {
        parts.push(format!(
            "  ... and {} more lines",
            lines.len() - SUMMARY_MAX_LINES
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_prefers_main() {
        let html = r#"
<html>
  <head><title>Ignored</title><style>body { color: red; }</style></head>
  <body>
    <header><h1>Site header</h1></header>
    <nav><a href="/">Home</a></nav>
    <main>
      <h2>Pricing</h2>
      <p>Pro plan:   <b>$49</b> per month</p>
      <script>var x = 1;</script>
      <ul><li>Feature A</li><li>Feature B</li></ul>
    </main>
    <footer>Copyright</footer>
  </body>
</html>"#;

        let text = extract_text(html);
        assert_eq!(text, "Pricing\nPro plan:   $49 per month\nFeature A\nFeature B");
    }

    #[test]
    fn test_extract_text_content_div() {
        let html = r#"<html><body><div class="sidebar">Side</div>
            <div class="main-content"><p>Important</p></div></body></html>"#;
        assert_eq!(extract_text(html), "Important");
    }

    #[test]
    fn test_extract_text_falls_back_to_body() {
        let html = "<html><body><aside>Ads</aside><p>One</p><p>Two</p></body></html>";
        assert_eq!(extract_text(html), "One\nTwo");
    }

    #[test]
    fn test_extract_text_ignores_roots_in_skipped_subtrees() {
        let html = r#"<body><aside><div class="content">Sponsored ad</div></aside><p>Real pricing text</p></body>"#;
        assert_eq!(extract_text(html), "Real pricing text");

        let html = "<body><header><main>Banner</main></header><article>Launch news</article></body>";
        assert_eq!(extract_text(html), "Launch news");
    }

    #[test]
    fn test_extract_text_skips_nested_noise() {
        let html = "<main><div>Kept<noscript>Enable JS</noscript><svg><text>Logo</text></svg></div></main>";
        assert_eq!(extract_text(html), "Kept");
    }

    #[test]
    fn test_content_hash_normalizes_whitespace() {
        let a = content_hash("Hello   world\n\nagain");
        let b = content_hash("Hello world again");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash("Hello world, again"));
    }

    #[test]
    fn test_unified_diff_identical_is_empty() {
        assert_eq!(unified_diff("a\nb\n", "a\nb\n"), "");
    }

    #[test]
    fn test_unified_diff_has_headers() {
        let diff = unified_diff("a\nb\n", "a\nc\n");
        assert!(diff.starts_with("--- previous\n+++ current\n"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }

    #[test]
    fn test_summarize_no_diff() {
        assert_eq!(summarize_changes(""), "No changes detected");
    }

    #[test]
    fn test_summarize_added_and_removed() {
        let diff = unified_diff("Price: $49\nStable\n", "Price: $59\nStable\nNew model X200\n");
        let summary = summarize_changes(&diff);
        assert_eq!(
            summary,
            "Added (2 lines):\n  + Price: $59\n  + New model X200\n\nRemoved (1 lines):\n  - Price: $49"
        );
    }

    #[test]
    fn test_summarize_truncates_long_lists() {
        let new: String = (0..15).map(|i| format!("line {i}\n")).collect();
        let summary = summarize_changes(&unified_diff("", &new));
        assert!(summary.starts_with("Added (15 lines):\n  + line 0\n"));
        assert!(summary.contains("  + line 9"));
        assert!(!summary.contains("  + line 10"));
        assert!(summary.ends_with("\n\n  ... and 5 more lines"));
    }

    #[test]
    fn test_summarize_truncates_long_lines() {
        let long = "x".repeat(150);
        let summary = summarize_changes(&unified_diff("", &format!("{long}\n")));
        assert!(summary.contains(&format!("  + {}", "x".repeat(100))));
        assert!(!summary.contains(&"x".repeat(101)));
    }

    #[test]
    fn test_summarize_whitespace_only_changes() {
        let diff = "--- previous\n+++ current\n@@ -1,2 +1,2 @@\n-  \n+\t\n";
        assert_eq!(summarize_changes(diff), "Minor formatting changes only");
    }
}
