//! Text helpers for shaping model replies

use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    static ref DANGLING_LIST_ITEM: Regex = Regex::new(r"(?:^|\s)\d+\.\s*$").unwrap();
    static ref REPEATED_TERMINATOR: Regex = Regex::new(r"([.!?])[.!?]+").unwrap();
    static ref UNSPEAKABLE: Regex =
        Regex::new(r#"[^\w\s.!?,;:\-'"()，。？！；：“”‘’（）【】।]"#).unwrap();
}

/// Sentence terminators for Latin, CJK and Devanagari text.
pub const SENTENCE_TERMINATORS: [char; 8] = ['.', '!', '?', '。', '！', '？', '…', '।'];

pub struct TextUtils;

impl TextUtils {
    /// Case-insensitive substring test.
    pub fn contains_ignore_case(text: &str, pattern: &str) -> bool {
        text.to_lowercase().contains(&pattern.to_lowercase())
    }

    /// Collapse runs of whitespace into single spaces and trim.
    pub fn normalize_whitespace(text: &str) -> String {
        WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
    }

    /// True when the trimmed text ends in a sentence terminator.
    pub fn ends_with_terminator(text: &str) -> bool {
        text.trim_end()
            .chars()
            .last()
            .map(|c| SENTENCE_TERMINATORS.contains(&c))
            .unwrap_or(false)
    }

    /// Trimmed text with one period appended.
    pub fn terminate_with_period(text: &str) -> String {
        format!("{}.", text.trim())
    }

    /// Strips a trailing cut-off list number such as `"... options are 1."`.
    /// `None` when the text does not end that way.
    pub fn strip_dangling_list_item(text: &str) -> Option<String> {
        let trimmed = text.trim_end();
        let found = DANGLING_LIST_ITEM.find(trimmed)?;
        Some(trimmed[..found.start()].trim_end().to_string())
    }

    /// Character count, not byte count.
    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }

    /// Prepares a reply for speech: collapses repeated terminators and drops
    /// symbols a synthesizer would read aloud.
    pub fn clean_for_speech(text: &str) -> String {
        let collapsed = REPEATED_TERMINATOR.replace_all(text, "$1");
        let stripped = UNSPEAKABLE.replace_all(&collapsed, "");
        Self::normalize_whitespace(&stripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminator_detection() {
        assert!(TextUtils::ends_with_terminator("Done."));
        assert!(TextUtils::ends_with_terminator("Really?  "));
        assert!(TextUtils::ends_with_terminator("好的。"));
        assert!(TextUtils::ends_with_terminator("本当！"));
        assert!(TextUtils::ends_with_terminator("ठीक है।"));
        assert!(!TextUtils::ends_with_terminator("I think that"));
        assert!(!TextUtils::ends_with_terminator(""));
        assert!(!TextUtils::ends_with_terminator("Options are,"));
    }

    #[test]
    fn test_terminate_with_period() {
        assert_eq!(TextUtils::terminate_with_period("I think that "), "I think that.");
    }

    #[test]
    fn test_strip_dangling_list_item() {
        assert_eq!(
            TextUtils::strip_dangling_list_item("Here are some ideas: 1."),
            Some("Here are some ideas:".to_string())
        );
        assert_eq!(TextUtils::strip_dangling_list_item("Try these 12. "), Some("Try these".to_string()));
        assert_eq!(TextUtils::strip_dangling_list_item("2."), Some(String::new()));
        assert_eq!(TextUtils::strip_dangling_list_item("Version 3.5."), None);
        assert_eq!(TextUtils::strip_dangling_list_item("All good."), None);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(TextUtils::contains_ignore_case("I Think That is right.", "i think that"));
        assert!(!TextUtils::contains_ignore_case("Hello", "goodbye"));
    }

    #[test]
    fn test_clean_for_speech() {
        assert_eq!(TextUtils::clean_for_speech("Wow!!! *Great* job..."), "Wow! Great job.");
        assert_eq!(TextUtils::clean_for_speech("你好。。 #朋友"), "你好。。 朋友");
    }
}
