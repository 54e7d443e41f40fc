//! Line-oriented parsing of free-form model output.

use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    // Leading numbering (`1.`, `2)`), bullets, dashes, arrows and quote markers.
    // Digits alone are content, not numbering.
    static ref LIST_MARKER: Regex =
        Regex::new(r"^(?:\s*(?:\d+[.)](?:\s+|$)|[.\-*•⁃⦁◦▪□▫–—⁌→>]))+\s*").unwrap();
}

/// A line split at its first colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeled<'a> {
    pub label: Option<&'a str>,
    pub body: &'a str,
}

pub struct OutputParser;

impl OutputParser {
    /// Removes a leading list marker from a single line.
    pub fn strip_marker(line: &str) -> &str {
        match LIST_MARKER.find(line) {
            Some(m) => line[m.end()..].trim(),
            None => line.trim(),
        }
    }

    /// Non-empty lines with list markers stripped, in order.
    pub fn items(text: &str) -> Vec<String> {
        text.lines()
            .map(Self::strip_marker)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Splits `"Label: body"` at the first colon. Without a colon the whole
    /// line is the body and `label` is `None`.
    pub fn split_label(line: &str) -> Labeled<'_> {
        match line.split_once(':') {
            Some((label, body)) => Labeled { label: Some(label.trim()), body: body.trim() },
            None => Labeled { label: None, body: line.trim() },
        }
    }

    /// Lines of `text` containing any of `keywords`, case-insensitively.
    pub fn lines_mentioning<'a>(text: &'a str, keywords: &[&str]) -> Vec<&'a str> {
        text.lines()
            .map(str::trim)
            .filter(|line| {
                let lowered = line.to_lowercase();
                !line.is_empty() && keywords.iter().any(|k| lowered.contains(k))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_marker_variants() {
        assert_eq!(OutputParser::strip_marker("1. Hello there"), "Hello there");
        assert_eq!(OutputParser::strip_marker("- I agree."), "I agree.");
        assert_eq!(OutputParser::strip_marker("• ¿Qué tal?"), "¿Qué tal?");
        assert_eq!(OutputParser::strip_marker("  → > Next"), "Next");
        assert_eq!(OutputParser::strip_marker("No marker"), "No marker");
        assert_eq!(OutputParser::strip_marker("3) Fine"), "Fine");
    }

    #[test]
    fn test_leading_numbers_in_content_are_kept() {
        assert_eq!(OutputParser::strip_marker("2 tickets, please."), "2 tickets, please.");
        assert_eq!(OutputParser::strip_marker("1. 2 tickets, please."), "2 tickets, please.");
        assert_eq!(OutputParser::strip_marker("1.5 kilos of apples"), "1.5 kilos of apples");
    }

    #[test]
    fn test_items_skip_blank_and_marker_only_lines() {
        let text = "1. First idea\n\n2.\n - Second idea\n*   Third idea  ";
        assert_eq!(
            OutputParser::items(text),
            vec!["First idea", "Second idea", "Third idea"]
        );
    }

    #[test]
    fn test_split_label() {
        let labeled = OutputParser::split_label("Lesson 1: Practice the past tense");
        assert_eq!(labeled.label, Some("Lesson 1"));
        assert_eq!(labeled.body, "Practice the past tense");

        let plain = OutputParser::split_label("Practice greetings");
        assert_eq!(plain.label, None);
        assert_eq!(plain.body, "Practice greetings");

        let nested = OutputParser::split_label("Tip: ratio 2:1");
        assert_eq!(nested.body, "ratio 2:1");
    }

    #[test]
    fn test_lines_mentioning() {
        let analysis = "Level: beginner\nThe user needs more vocabulary.\n\nAreas for Improvement: tenses";
        let found = OutputParser::lines_mentioning(analysis, &["improvement", "needs"]);
        assert_eq!(found, vec!["The user needs more vocabulary.", "Areas for Improvement: tenses"]);
    }
}
