//! Completion calls for a chat turn and the finalization of their output.
//!
//! A reply goes through at most two model calls: the reply itself and, when
//! the text looks truncated, one repair request asking the model to finish
//! it. Every failure resolves locally to a usable text.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{self, FALLBACK_ROLE, PRACTICE_ROLE};
use crate::completion::{CompletionClient, CompletionRequest, Message};
use crate::language;
use crate::metrics;
use crate::phrasebook;
use crate::utils::TextUtils;

const REPLY_MAX_TOKENS: u32 = 200;
const REPLY_TEMPERATURE: f32 = 0.7;
const REPAIR_MAX_TOKENS: u32 = 120;
const REPAIR_TEMPERATURE: f32 = 0.3;
const ROLE_MAX_TOKENS: u32 = 30;
const ROLE_TEMPERATURE: f32 = 0.7;
const OPENER_MAX_TOKENS: u32 = 150;
const OPENER_TEMPERATURE: f32 = 0.7;

/// How the final text of a reply was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Model output already ended a sentence.
    Complete,
    /// Truncated output extended by the repair call.
    Repaired,
    /// Repair failed or was rejected; a period was appended.
    PeriodPatched,
    /// Call failed or returned nothing usable.
    Fallback,
}

impl ReplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyOutcome::Complete => "complete",
            ReplyOutcome::Repaired => "repaired",
            ReplyOutcome::PeriodPatched => "period_patched",
            ReplyOutcome::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalReply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl FinalReply {
    fn fallback(language: &str) -> Self {
        Self {
            text: phrasebook::reply_fallback(language).to_string(),
            outcome: ReplyOutcome::Fallback,
        }
    }
}

#[derive(Clone)]
pub struct ReplyEngine {
    client: Arc<dyn CompletionClient>,
}

impl ReplyEngine {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Role label for a free-text scenario.
    ///
    /// The practice scenario and catalog scenarios resolve without a model
    /// call. Any failure yields [`FALLBACK_ROLE`].
    pub async fn infer_role(&self, scenario: &str, language_code: &str) -> String {
        if catalog::is_practice(Some(scenario)) {
            return PRACTICE_ROLE.to_string();
        }
        if let Some(entry) = catalog::find(scenario) {
            return entry.localized(language_code).1.to_string();
        }

        let request = CompletionRequest::new(
            vec![
                Message::system("You are a helpful assistant that suggests appropriate role-play characters."),
                Message::user(format!(
                    "Based on this scenario: '{}', what would be an appropriate character or role for an AI to play? \
                     Respond with ONLY the role name, no explanation.",
                    scenario
                )),
            ],
            ROLE_MAX_TOKENS,
            ROLE_TEMPERATURE,
        );

        match self.client.complete(request).await {
            Ok(raw) => {
                metrics::inc_completion("role", "ok");
                let role = clean_role_label(&raw);
                if role.is_empty() {
                    warn!("Role inference returned nothing for scenario '{}'", scenario);
                    FALLBACK_ROLE.to_string()
                } else {
                    info!("Inferred role '{}' for scenario '{}'", role, scenario);
                    role
                }
            }
            Err(e) => {
                metrics::inc_completion("role", "error");
                warn!("Role inference failed for scenario '{}': {}", scenario, e);
                FALLBACK_ROLE.to_string()
            }
        }
    }

    /// First line of a roleplay scenario, spoken by the AI before the user
    /// says anything. `None` when the model call fails or returns nothing.
    pub async fn opener(&self, ai_role: &str, scenario: &str, language_code: &str) -> Option<String> {
        let request = CompletionRequest::new(
            vec![Message::system(format!(
                "You are {} in the following scenario: {}. Start with a greeting or introduction \
                 that makes sense for this specific setting. Use {} language.",
                ai_role,
                scenario,
                language::language_name(language_code)
            ))],
            OPENER_MAX_TOKENS,
            OPENER_TEMPERATURE,
        );

        match self.client.complete(request).await {
            Ok(text) if !text.trim().is_empty() => {
                metrics::inc_completion("opener", "ok");
                Some(text.trim().to_string())
            }
            Ok(_) => {
                metrics::inc_completion("opener", "ok");
                warn!("Scenario opener came back empty for '{}'", scenario);
                None
            }
            Err(e) => {
                metrics::inc_completion("opener", "error");
                warn!("Scenario opener failed for '{}': {}", scenario, e);
                None
            }
        }
    }

    /// One reply call followed by finalization.
    pub async fn generate_reply(&self, messages: Vec<Message>, language_code: &str) -> FinalReply {
        debug!("Requesting reply with {} turns", messages.len());
        let request = CompletionRequest::new(messages, REPLY_MAX_TOKENS, REPLY_TEMPERATURE).primary();

        let reply = match self.client.complete(request).await {
            Ok(raw) => {
                metrics::inc_completion("reply", "ok");
                self.finalize(&raw, language_code).await
            }
            Err(e) => {
                metrics::inc_completion("reply", "error");
                warn!("Reply generation failed: {}. Using fallback reply.", e);
                FinalReply::fallback(language_code)
            }
        };

        metrics::inc_reply_finalization(reply.outcome.as_str());
        reply
    }

    /// Terminator check, optional repair and the dangling-list guard.
    pub async fn finalize(&self, raw: &str, language_code: &str) -> FinalReply {
        let text = raw.trim();
        if text.is_empty() {
            warn!("Model returned an empty reply");
            return FinalReply::fallback(language_code);
        }

        if TextUtils::ends_with_terminator(text) {
            return strip_dangling_list(text, ReplyOutcome::Complete, language_code);
        }

        debug!("Reply looks truncated, requesting repair");
        match self.repair(text, language_code).await {
            Some(repaired) => strip_dangling_list(&repaired, ReplyOutcome::Repaired, language_code),
            None => FinalReply {
                text: TextUtils::terminate_with_period(text),
                outcome: ReplyOutcome::PeriodPatched,
            },
        }
    }

    /// Asks the model to finish `text`. Only a longer continuation that
    /// still contains the original is accepted.
    async fn repair(&self, text: &str, language_code: &str) -> Option<String> {
        let lang = language::language_name(language_code);
        let request = CompletionRequest::new(
            vec![
                Message::system(format!(
                    "Complete sentences naturally in {}. Make responses complete, conversational, \
                     and 2-3 sentences long. Avoid numbered lists.",
                    lang
                )),
                Message::user(format!(
                    "Complete this response naturally and make it longer: \"{}\" \
                     Make it 2-3 complete sentences total. Do not use numbered lists. \
                     Only provide the completed response, nothing else.",
                    text
                )),
            ],
            REPAIR_MAX_TOKENS,
            REPAIR_TEMPERATURE,
        );

        let candidate = match self.client.complete(request).await {
            Ok(raw) => {
                metrics::inc_completion("repair", "ok");
                raw.trim().trim_matches('"').trim().to_string()
            }
            Err(e) => {
                metrics::inc_completion("repair", "error");
                warn!("Reply repair failed: {}", e);
                return None;
            }
        };

        if is_continuation(text, &candidate) {
            Some(candidate)
        } else {
            debug!("Rejected repair that does not extend the original reply");
            None
        }
    }
}

fn is_continuation(original: &str, candidate: &str) -> bool {
    !candidate.is_empty()
        && TextUtils::char_len(candidate) > TextUtils::char_len(original)
        && TextUtils::contains_ignore_case(candidate, original)
}

fn strip_dangling_list(text: &str, outcome: ReplyOutcome, language_code: &str) -> FinalReply {
    match TextUtils::strip_dangling_list_item(text) {
        None => FinalReply { text: text.to_string(), outcome },
        Some(stripped) if stripped.is_empty() => FinalReply::fallback(language_code),
        Some(stripped) if TextUtils::ends_with_terminator(&stripped) => FinalReply { text: stripped, outcome },
        Some(stripped) => FinalReply {
            text: TextUtils::terminate_with_period(stripped.trim_end_matches([':', ',', ';'])),
            outcome,
        },
    }
}

fn clean_role_label(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches('.')
        .trim()
        .to_string()
}
