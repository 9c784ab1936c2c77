//! Small text helpers used by the parser, the mailer and the logs.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// char boundary, with an ellipsis and the number of dropped bytes appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits, otherwise the kept prefix followed by
/// `"…(+N bytes)"`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse every run of whitespace (including non-breaking spaces) into a
/// single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Reduce an HTML fragment to its visible text.
///
/// Tags are dropped, entities decoded and whitespace collapsed. Use this for
/// fields that carry markup, such as an RSS `<description>`. Text that is
/// already plain must not go through here: a literal `<up>` would be read as
/// a tag and lost.
///
/// # Arguments
///
/// * `raw` - An HTML fragment, e.g. `<a href="…">Title</a>&nbsp;Source`
///
/// # Returns
///
/// The concatenated text nodes with whitespace collapsed.
pub fn clean_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// Host part of a URL, without a leading `www.`.
///
/// # Returns
///
/// `None` when `link` does not parse as a URL or has no host.
pub fn host_of(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        // "ü" is two bytes; cutting at 1 would split it.
        let result = truncate_for_log("üüü", 1);
        assert_eq!(result, "…(+6 bytes)");
        let result = truncate_for_log("üüü", 3);
        assert_eq!(result, "ü…(+4 bytes)");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0}b"), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_clean_text_strips_tags_and_entities() {
        let raw = r##"<a href="https://example.com">Ilkyar wins award</a>&nbsp;&nbsp;<font color="#6f6f6f">Daily Sabah</font>"##;
        assert_eq!(clean_text(raw), "Ilkyar wins award Daily Sabah");
    }

    #[test]
    fn test_clean_text_plain_text() {
        assert_eq!(clean_text("Weather   update"), "Weather update");
        assert_eq!(clean_text("Tom &amp; Jerry"), "Tom & Jerry");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://www.reuters.com/world/"),
            Some("reuters.com".to_string())
        );
        assert_eq!(host_of("not a url"), None);
    }
}
