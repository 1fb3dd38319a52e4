//! Regex-based markup reduction for feed bodies.
//!
//! Feed descriptions and ATS posting bodies arrive as HTML fragments.
//! This reduces them to plain text good enough for extraction heuristics
//! and AI prompts.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCRIPT: Regex = Regex::new(r"(?s)<script[^>]*>.*?</script>").unwrap();
    static ref STYLE: Regex = Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap();
    static ref BREAKS: Regex = Regex::new(r"(?i)<(?:br\s*/?|/p|/div|/li|/h[1-6])>").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"(?i)<li[^>]*>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref MULTI_NEWLINE: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Reduce an HTML fragment to plain text.
///
/// Block-closing tags become newlines, list items become dashes, every
/// other tag is dropped and entities are decoded.
pub fn strip_markup(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = BREAKS.replace_all(&text, "\n");
    let text = LIST_ITEM.replace_all(&text, "- ");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = MULTI_NEWLINE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Decode the HTML entities that actually occur in feeds.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup_basic() {
        let html = "<p>We are <b>hiring</b>.</p><ul><li>Rust</li><li>Tokio</li></ul>";
        let text = strip_markup(html);

        assert!(text.contains("We are hiring."));
        assert!(text.contains("- Rust"));
        assert!(text.contains("- Tokio"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_scripts_and_styles_removed() {
        let html = "<script>alert(1)</script><style>p{}</style>Visible";
        assert_eq!(strip_markup(html), "Visible");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(decode_entities("R&amp;D &lt;team&gt;"), "R&D <team>");
    }
}
