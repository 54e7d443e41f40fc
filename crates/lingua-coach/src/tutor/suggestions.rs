//! Reply suggestions for the learner's next message.
//!
//! Whatever the model returns, the result is always three distinct,
//! non-empty phrases: model items first, then localized backfill.

use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::completion::{CompletionClient, CompletionRequest, Message};
use crate::language;
use crate::metrics;
use crate::phrasebook;
use crate::profile_db::{ChatEntry, UserProfile};
use crate::utils::OutputParser;

pub const SUGGESTION_COUNT: usize = 3;
const CONTEXT_ENTRIES: usize = 2;

const PLAIN_TEXT_INSTRUCTION: &str = "IMPORTANT: Provide only plain text suggestions. No bullet points, no numbering, no dashes. \
Just provide 3 simple sentences, one per line.";

pub struct SuggestionGenerator {
    client: Arc<dyn CompletionClient>,
}

impl SuggestionGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Three suggestions for `profile` in `language_code`.
    pub async fn suggest(&self, profile: &UserProfile, language_code: &str) -> Vec<String> {
        let recent: Vec<&ChatEntry> = {
            let active: Vec<&ChatEntry> = profile.active_history().collect();
            let skip = active.len().saturating_sub(CONTEXT_ENTRIES);
            active.into_iter().skip(skip).collect()
        };
        let roleplay = !catalog::is_practice(profile.scenario.as_deref());

        if recent.is_empty() {
            if roleplay {
                let scenario = profile.scenario.as_deref().unwrap_or_default();
                return self.scenario_starters(scenario, &profile.ai_role, language_code).await;
            }
            debug!("No history for {}, using default suggestions", profile.username);
            return defaults(language_code);
        }

        let prompt = continuation_prompt(profile, &recent, roleplay, language_code);
        let request = CompletionRequest::new(vec![Message::system(prompt)], 200, 0.7);
        match self.client.complete(request).await {
            Ok(raw) => {
                metrics::inc_completion("suggestions", "ok");
                let suggestions = assemble(&raw, language_code);
                info!("Generated {} suggestions for {}", suggestions.len(), profile.username);
                suggestions
            }
            Err(e) => {
                metrics::inc_completion("suggestions", "error");
                warn!("Suggestion generation failed: {}. Using defaults.", e);
                defaults(language_code)
            }
        }
    }

    /// Conversation starters for a roleplay scenario with no history yet.
    async fn scenario_starters(&self, scenario: &str, ai_role: &str, language_code: &str) -> Vec<String> {
        let prompt = format!(
            "You're helping a language learner practice in this scenario: {scenario}.\n\
             The AI is playing the role of: {ai_role}.\n\n\
             Generate 3 appropriate conversation suggestions that the user could say in this scenario.\n\
             Most suggestions must be STATEMENTS (maximum 1 question out of 3), and fit the roleplay scenario naturally.\n\
             Each suggestion should be a complete statement or question, appropriate for starting or continuing a conversation.\n\
             Keep suggestions brief (under 20 words) and natural for this specific scenario topic.\n\
             Respond in {language}.\n\n\
             {instruction}",
            scenario = scenario,
            ai_role = ai_role,
            language = language::language_name(language_code),
            instruction = PLAIN_TEXT_INSTRUCTION,
        );

        let request = CompletionRequest::new(vec![Message::user(prompt)], 150, 0.7);
        match self.client.complete(request).await {
            Ok(raw) => {
                metrics::inc_completion("suggestions", "ok");
                assemble(&raw, language_code)
            }
            Err(e) => {
                metrics::inc_completion("suggestions", "error");
                warn!("Scenario suggestions failed for '{}': {}", scenario, e);
                defaults(language_code)
            }
        }
    }
}

fn continuation_prompt(profile: &UserProfile, recent: &[&ChatEntry], roleplay: bool, language_code: &str) -> String {
    let mut context = String::new();
    for entry in recent {
        if let Some(user) = entry.user_text() {
            context.push_str(&format!("User: {}\n", user));
        }
        context.push_str(&format!("AI: {}\n", entry.ai));
    }
    if context.is_empty() {
        context.push_str("No previous conversation.");
    }

    let scenario_line = if roleplay {
        format!(
            "This conversation is taking place in the following scenario: {}. The AI is playing the role of {}.\n\n",
            profile.scenario.as_deref().unwrap_or_default(),
            profile.ai_role
        )
    } else {
        String::new()
    };

    let name = language::language_name(language_code);
    let purity = if language::is_high_drift(language_code) {
        format!("IMPORTANT: Generate suggestions ONLY in {}. DO NOT use English at all!\n\n", name)
    } else {
        String::new()
    };

    format!(
        "{scenario_line}Recent conversation:\n{context}\n\n\
         Based on this conversation, generate 3 appropriate suggestions for what the user might want to say next.\n\
         Most suggestions must be STATEMENTS (maximum 1 question out of 3), and fit the conversation naturally.\n\
         Each suggestion must be a complete statement or question. Keep suggestions brief, under 20 words each.\n\n\
         Respond in {name} language.\n\n\
         {purity}{instruction}",
        scenario_line = scenario_line,
        context = context.trim_end(),
        name = name,
        purity = purity,
        instruction = PLAIN_TEXT_INSTRUCTION,
    )
}

/// Default suggestions as owned strings.
pub fn defaults(language_code: &str) -> Vec<String> {
    phrasebook::default_suggestions(language_code)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Parses model output into exactly [`SUGGESTION_COUNT`] distinct phrases.
///
/// High-drift languages have each item checked; failures are swapped for a
/// random unused phrase from the language's replacement pool.
pub fn assemble(raw: &str, language_code: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for item in OutputParser::items(raw) {
        if !candidates.contains(&item) {
            candidates.push(item);
        }
        if candidates.len() == SUGGESTION_COUNT {
            break;
        }
    }

    let mut suggestions: Vec<String> = Vec::with_capacity(SUGGESTION_COUNT);
    if language::is_high_drift(language_code) {
        let pool = phrasebook::drift_replacements(language_code);
        for candidate in candidates {
            if language::conforms_to(&candidate, language_code) {
                push_unique(&mut suggestions, candidate);
                continue;
            }
            warn!("Suggestion not in expected language: {}", candidate);
            let unused: Vec<&&str> = pool
                .iter()
                .filter(|p| !suggestions.iter().any(|s| s == **p))
                .collect();
            if let Some(replacement) = unused.choose(&mut rand::thread_rng()) {
                suggestions.push(replacement.to_string());
            }
        }
    } else {
        suggestions = candidates;
    }

    let backfill = phrasebook::backfill_suggestions(language_code)
        .iter()
        .copied()
        .chain(phrasebook::default_suggestions(language_code));
    for phrase in backfill {
        if suggestions.len() >= SUGGESTION_COUNT {
            break;
        }
        push_unique(&mut suggestions, phrase.to_string());
    }

    suggestions.truncate(SUGGESTION_COUNT);
    suggestions
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}
