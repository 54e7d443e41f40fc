//! Translation, pronunciation practice and vocabulary drills.
//!
//! Translation failures go back to the caller. Practice material and
//! vocabulary words fall back to offline pools from the phrasebook.

use lazy_static::lazy_static;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::completion::{CompletionClient, CompletionRequest, Message};
use crate::error::CompletionError;
use crate::language;
use crate::metrics;
use crate::phrasebook;

/// Words listed in the avoid clause of a vocabulary prompt.
const MAX_AVOID_WORDS: usize = 20;

lazy_static! {
    static ref PARENTHESIZED: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref DASH_TAIL: Regex = Regex::new(r"\s*[-–—]\s*.*$").unwrap();
    static ref COMMA_TAIL: Regex = Regex::new(r"\s*,\s*.*$").unwrap();
    static ref LATIN_NOISE: Regex = Regex::new(r"[a-zA-Z0-9\s\-_.,!?()\[\]{}]+").unwrap();
    static ref HANGUL_RUN: Regex = Regex::new(r"[가-힣]+").unwrap();
    static ref JAPANESE_RUN: Regex = Regex::new(r"[ぁ-ゖァ-ヾ一-龯]+").unwrap();
    static ref HAN_RUN: Regex = Regex::new(r"[一-龯]+").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^\w]").unwrap();
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// A single word.
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

pub struct ExerciseGenerator {
    client: Arc<dyn CompletionClient>,
}

impl ExerciseGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// `source` may be `auto`; both ends are passed to the model as given.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, CompletionError> {
        let request = CompletionRequest::new(
            vec![
                Message::system(format!(
                    "You are a translator. Translate the text from {} to {}. Only return the translated text, nothing else.",
                    source, target
                )),
                Message::user(text),
            ],
            1000,
            0.3,
        );

        match self.client.complete(request).await {
            Ok(translated) => {
                metrics::inc_completion("translate", "ok");
                info!("Translated {} chars from {} to {}", text.chars().count(), source, target);
                Ok(translated.trim().to_string())
            }
            Err(e) => {
                metrics::inc_completion("translate", "error");
                warn!("Translation failed: {}", e);
                Err(e)
            }
        }
    }

    /// A word (easy) or sentence (medium, hard) to read aloud. Falls back to
    /// a random item of the offline pool when generation fails.
    pub async fn practice_text(&self, language_code: &str, difficulty: Difficulty) -> String {
        let name = language::language_name(language_code);
        let prompt = match difficulty {
            Difficulty::Easy => format!(
                "Generate one common word in {name} that would be appropriate for a beginner language learner. \
                 Choose a concrete noun, common verb, or basic adjective that's frequently used. \
                 Respond with ONLY the word, nothing else. \
                 DO NOT translate to English. The word MUST be in {name} script only. \
                 Vary the vocabulary across different everyday contexts and topics.",
                name = name
            ),
            Difficulty::Medium | Difficulty::Hard => {
                let complexity = if difficulty == Difficulty::Medium {
                    "intermediate vocabulary and grammar, short sentences suitable for beginners and intermediate learners, useful in everyday conversation"
                } else {
                    "advanced vocabulary and grammar, in a sentence that is not very long but suits intermediate and advanced learners"
                };
                format!(
                    "Generate one {level} level sentence in {name} for pronunciation practice. \
                     The sentence should use {complexity}. \
                     Respond with ONLY the sentence, nothing else. \
                     DO NOT translate to English. The sentence MUST be in {name} script only.",
                    level = difficulty.as_str(),
                    name = name,
                    complexity = complexity
                )
            }
        };

        let request = CompletionRequest::new(
            vec![
                Message::system(format!(
                    "You are a language tutor helping students practice {name} pronunciation. Always respond in {name} only.",
                    name = name
                )),
                Message::user(prompt),
            ],
            150,
            0.7,
        );

        let generated = match self.client.complete(request).await {
            Ok(text) => {
                metrics::inc_completion("practice", "ok");
                text.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
            }
            Err(e) => {
                metrics::inc_completion("practice", "error");
                warn!("Practice text generation failed: {}", e);
                String::new()
            }
        };
        if !generated.is_empty() {
            return generated;
        }

        let pool = phrasebook::practice_fallback(language_code, difficulty);
        let fallback = pool.choose(&mut rand::thread_rng()).copied().unwrap_or_default();
        info!("Using fallback practice {}: {}", difficulty.as_str(), fallback);
        fallback.to_string()
    }

    /// One everyday word at `level` (1 to 10), avoiding recently shown words.
    /// `seed` makes the offline fallback pick reproducible.
    pub async fn varied_word(
        &self,
        language_code: &str,
        level: u8,
        seed: Option<u64>,
        avoid_words: &[String],
    ) -> String {
        let name = language::language_name(language_code);
        let avoid = if avoid_words.is_empty() {
            String::new()
        } else {
            let listed: Vec<&str> = avoid_words.iter().take(MAX_AVOID_WORDS).map(String::as_str).collect();
            format!("Do not use these words: {}", listed.join(", "))
        };
        let prompt = format!(
            "Generate exactly ONE word in {name} for language learning.\n\n\
             Requirements:\n\
             - Return ONLY the word itself, no explanations, no pronunciation guides, no parentheses\n\
             - Choose a practical, everyday word\n\
             - Appropriate for difficulty level {level}/10\n\
             - Different from commonly repeated words\n\
             {avoid}\n\n\
             Return only the word in {name}:",
            name = name,
            level = level.clamp(1, 10),
            avoid = avoid
        );
        let request = CompletionRequest::new(
            vec![
                Message::system("You are a vocabulary generator. Return only the word itself, no extra information."),
                Message::user(prompt),
            ],
            20,
            0.9,
        );

        let cleaned = match self.client.complete(request).await {
            Ok(raw) => {
                metrics::inc_completion("vocabulary", "ok");
                let cleaned = clean_vocabulary_word(&raw, language_code);
                debug!("Vocabulary word '{}' cleaned to '{}'", raw.trim(), cleaned);
                cleaned
            }
            Err(e) => {
                metrics::inc_completion("vocabulary", "error");
                warn!("Vocabulary generation failed: {}", e);
                String::new()
            }
        };
        if !cleaned.is_empty() {
            return cleaned;
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        phrasebook::vocabulary_fallback(language_code)
            .choose(&mut rng)
            .map(|w| w.to_string())
            .unwrap_or_default()
    }
}

/// Reduces a model answer to the bare word: quotes, parenthesized
/// pronunciation, dash or comma glosses are dropped. CJK answers keep their
/// first native run, other scripts their first word without punctuation.
pub fn clean_vocabulary_word(raw: &str, language_code: &str) -> String {
    let text = raw
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’'));
    let text = PARENTHESIZED.replace_all(text, "");
    let text = DASH_TAIL.replace(text.trim(), "");
    let text = COMMA_TAIL.replace(text.trim(), "");
    let text = text.trim();

    let native_run = match language_code {
        "ko" => Some(&*HANGUL_RUN),
        "ja" => Some(&*JAPANESE_RUN),
        "zh-CN" | "zh-TW" => Some(&*HAN_RUN),
        _ => None,
    };
    match native_run {
        Some(run) => {
            let stripped = LATIN_NOISE.replace_all(text, "");
            match run.find(&stripped) {
                Some(m) => m.as_str().to_string(),
                None => stripped.trim().to_string(),
            }
        }
        None => text
            .split_whitespace()
            .next()
            .map(|word| NON_WORD.replace_all(word, "").into_owned())
            .unwrap_or_default(),
    }
}
