//! Language code normalization and the lexical language-conformance heuristic.
//!
//! Every table in the crate is keyed by the canonical codes produced here
//! (`en`, `zh-CN`, `zh-TW`, `ja`, `ko`, `es`, `fr`, `de`, `it`, `hi`).

use std::collections::{HashMap, HashSet};
use lazy_static::lazy_static;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Canonical codes the crate ships localized tables for.
pub const SUPPORTED_LANGUAGES: [&str; 10] =
    ["en", "zh-CN", "zh-TW", "ja", "ko", "es", "fr", "de", "it", "hi"];

lazy_static! {
    // Keys are lower-cased; lookup happens after lower-casing the input.
    static ref LANGUAGE_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        for alias in ["english", "en", "en-us", "en-gb"] {
            m.insert(alias, "en");
        }
        for alias in ["chinese", "chinese (simplified)", "simplified chinese", "zh", "zh-cn", "zh-hans"] {
            m.insert(alias, "zh-CN");
        }
        for alias in ["chinese (traditional)", "traditional chinese", "zh-tw", "zh-hant"] {
            m.insert(alias, "zh-TW");
        }
        for alias in ["japanese", "ja", "ja-jp"] {
            m.insert(alias, "ja");
        }
        for alias in ["korean", "ko", "ko-kr"] {
            m.insert(alias, "ko");
        }
        for alias in ["spanish", "es", "es-es", "es-mx"] {
            m.insert(alias, "es");
        }
        for alias in ["french", "fr", "fr-fr"] {
            m.insert(alias, "fr");
        }
        for alias in ["german", "de", "de-de"] {
            m.insert(alias, "de");
        }
        for alias in ["italian", "it", "it-it"] {
            m.insert(alias, "it");
        }
        for alias in ["hindi", "hi", "hi-in"] {
            m.insert(alias, "hi");
        }
        m
    };

    static ref ITALIAN_MARKERS: HashSet<&'static str> = [
        "ciao", "buongiorno", "grazie", "prego", "come", "sono", "mi", "tu", "che", "e", "il",
        "la", "di", "non", "per", "un", "una", "molto", "anche", "questo",
    ]
    .into_iter()
    .collect();

    static ref ENGLISH_MARKERS: HashSet<&'static str> = [
        "the", "is", "are", "and", "you", "what", "this", "that", "with", "have", "would",
        "could", "your", "about",
    ]
    .into_iter()
    .collect();
}

/// Canonicalizes a free-form language name or locale code.
///
/// Empty input yields `en`; unknown input comes back trimmed and lower-cased.
pub fn normalize(code_or_name: &str) -> String {
    let lowered = code_or_name.trim().to_lowercase();
    if lowered.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }
    match LANGUAGE_ALIASES.get(lowered.as_str()) {
        Some(code) => (*code).to_string(),
        None => lowered,
    }
}

/// Same as [`normalize`] but accepts a missing value.
pub fn normalize_opt(code_or_name: Option<&str>) -> String {
    normalize(code_or_name.unwrap_or_default())
}

/// English display name for a language, used inside prompts.
pub fn language_name(code: &str) -> &'static str {
    match normalize(code).as_str() {
        "zh-CN" => "Chinese (Simplified)",
        "zh-TW" => "Chinese (Traditional)",
        "ja" => "Japanese",
        "ko" => "Korean",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "hi" => "Hindi",
        _ => "English",
    }
}

/// Languages the model is known to drift away from into English.
pub fn is_high_drift(code: &str) -> bool {
    matches!(normalize(code).as_str(), "it" | "hi")
}

/// Cheap best-effort check that `text` is written in `code`.
///
/// Only Italian and Hindi have dedicated rules; every other language passes.
pub fn conforms_to(text: &str, code: &str) -> bool {
    match normalize(code).as_str() {
        "it" => looks_italian(text),
        "hi" => looks_hindi(text),
        _ => true,
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphabetic() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

fn looks_italian(text: &str) -> bool {
    let mut has_marker = false;
    for word in words(text) {
        if ENGLISH_MARKERS.contains(word.as_str()) {
            return false;
        }
        if ITALIAN_MARKERS.contains(word.as_str()) {
            has_marker = true;
        }
    }
    has_marker
}

fn looks_hindi(text: &str) -> bool {
    // Devanagari block
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_known_names_and_codes() {
        assert_eq!(normalize("English"), "en");
        assert_eq!(normalize("EN-us"), "en");
        assert_eq!(normalize("Chinese (Simplified)"), "zh-CN");
        assert_eq!(normalize("zh-cn"), "zh-CN");
        assert_eq!(normalize("zh-TW"), "zh-TW");
        assert_eq!(normalize("Traditional Chinese"), "zh-TW");
        assert_eq!(normalize(" Japanese "), "ja");
        assert_eq!(normalize("es-MX"), "es");
        assert_eq!(normalize("hi-IN"), "hi");
    }

    #[test]
    fn test_normalize_empty_and_unknown() {
        assert_eq!(normalize(""), "en");
        assert_eq!(normalize("   "), "en");
        assert_eq!(normalize_opt(None), "en");
        assert_eq!(normalize("Klingon"), "klingon");
        assert_eq!(normalize("PT-BR"), "pt-br");
    }

    #[test]
    fn test_canonical_codes_are_fixed_points() {
        for code in SUPPORTED_LANGUAGES {
            assert_eq!(normalize(code), code);
        }
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("zh-CN"), "Chinese (Simplified)");
        assert_eq!(language_name("italian"), "Italian");
        assert_eq!(language_name("xx"), "English");
    }

    #[test]
    fn test_italian_heuristic() {
        assert!(conforms_to("Ciao, come stai oggi?", "it"));
        assert!(conforms_to("Mi piacerebbe un caffè, grazie.", "it"));
        assert!(!conforms_to("What do you think about this?", "it"));
        assert!(!conforms_to("Ciao, how are you?", "it"));
        assert!(!conforms_to("Zzz.", "it"));
    }

    #[test]
    fn test_hindi_heuristic() {
        assert!(conforms_to("नमस्ते! आप कैसे हैं?", "hi"));
        assert!(!conforms_to("Hello there", "hindi"));
    }

    #[test]
    fn test_low_drift_languages_always_conform() {
        assert!(conforms_to("anything goes", "fr"));
        assert!(!is_high_drift("fr"));
        assert!(is_high_drift("Italian"));
        assert!(is_high_drift("hi"));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(input in "\\PC{0,24}") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_alias_variants_idempotent(
            idx in 0usize..SUPPORTED_LANGUAGES.len(),
            upper in any::<bool>(),
        ) {
            let code = SUPPORTED_LANGUAGES[idx];
            let input = if upper { code.to_uppercase() } else { code.to_lowercase() };
            let once = normalize(&input);
            prop_assert_eq!(&once, code);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
