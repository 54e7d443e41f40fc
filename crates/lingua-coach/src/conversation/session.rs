//! Orchestrates a chat turn end to end: profile state, context, reply,
//! persistence and speech.

use std::sync::Arc;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{self, PRACTICE_ROLE, PRACTICE_SCENARIO};
use crate::conversation::context_builder::{ContextBuilder, History, TurnContext};
use crate::conversation::persistence::{self, PersistenceInputs};
use crate::conversation::reply::ReplyEngine;
use crate::language;
use crate::phrasebook;
use crate::profile_db::{ChatEntry, NewScenarioMessage, ProfileService, Sender, UserProfile};
use crate::speech::{self, SpeechSynthesizer};

/// One inbound chat message with its per-request switches.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub username: String,
    pub message: String,
    pub scenario: Option<String>,
    pub language: Option<String>,
    pub response_locale: Option<String>,
    /// Writes the requested language into the profile.
    pub force_language: bool,
    pub conversation_id: Option<String>,
    pub save_to_history: bool,
    pub is_discarded: bool,
}

impl ChatTurn {
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
            scenario: None,
            language: None,
            response_locale: None,
            force_language: false,
            conversation_id: None,
            save_to_history: true,
            is_discarded: false,
        }
    }

    /// `response_locale` wins over `language`; blanks count as absent.
    fn requested_language(&self) -> Option<String> {
        non_blank(self.response_locale.as_deref())
            .or_else(|| non_blank(self.language.as_deref()))
            .map(language::normalize)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatTurnResult {
    pub response: String,
    pub audio_url: Option<String>,
    /// Main-chat session id, or the thread id for roleplay turns.
    pub conversation_id: String,
    pub is_roleplay: bool,
    /// Whether the exchange reached its storage target.
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScenarioOpening {
    pub response: String,
    pub audio_url: Option<String>,
    pub scenario: String,
    pub ai_role: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScenarioSelection {
    pub scenario: String,
    pub ai_role: String,
}

/// A profile's scenario resolved against the catalog and the user's custom
/// scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScenario {
    /// Natural key of the roleplay thread.
    pub title: String,
    /// Text given to the model.
    pub description: String,
    pub is_custom: bool,
    pub is_roleplay: bool,
}

pub fn resolve_scenario(profile: &UserProfile, language_code: &str) -> ResolvedScenario {
    let scenario = match profile.scenario.as_deref() {
        Some(s) if !catalog::is_practice(Some(s)) => s.trim(),
        _ => {
            return ResolvedScenario {
                title: PRACTICE_SCENARIO.to_string(),
                description: PRACTICE_SCENARIO.to_string(),
                is_custom: false,
                is_roleplay: false,
            }
        }
    };

    if let Some(entry) = catalog::find(scenario) {
        return ResolvedScenario {
            title: entry.title.to_string(),
            description: entry.localized(language_code).0.to_string(),
            is_custom: false,
            is_roleplay: true,
        };
    }

    match profile.find_custom_scenario(scenario) {
        Some(c) => ResolvedScenario {
            title: c.title.clone(),
            description: if c.description.trim().is_empty() { c.title.clone() } else { c.description.clone() },
            is_custom: true,
            is_roleplay: true,
        },
        None => ResolvedScenario {
            title: scenario.to_string(),
            description: scenario.to_string(),
            is_custom: true,
            is_roleplay: true,
        },
    }
}

/// Language the profile replies in when a request does not say.
pub fn profile_language(profile: &UserProfile) -> String {
    match non_blank(Some(profile.locale.as_str())) {
        Some(locale) => language::normalize(locale),
        None => language::normalize(&profile.language),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct ConversationSession {
    profiles: ProfileService,
    replies: ReplyEngine,
    speech: Arc<dyn SpeechSynthesizer>,
    builder: ContextBuilder,
}

impl ConversationSession {
    pub fn new(
        profiles: ProfileService,
        replies: ReplyEngine,
        speech: Arc<dyn SpeechSynthesizer>,
        builder: ContextBuilder,
    ) -> Self {
        Self { profiles, replies, speech, builder }
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn replies(&self) -> &ReplyEngine {
        &self.replies
    }

    pub fn speech(&self) -> &Arc<dyn SpeechSynthesizer> {
        &self.speech
    }

    /// Custom scenarios keep their stored role; everything else goes
    /// through role inference.
    pub async fn role_for(&self, profile: &UserProfile, scenario: &str, language_code: &str) -> String {
        match profile.find_custom_scenario(scenario) {
            Some(c) if !c.role.trim().is_empty() => c.role.clone(),
            _ => self.replies.infer_role(scenario, language_code).await,
        }
    }

    pub async fn run_turn(&self, turn: ChatTurn) -> ChatTurnResult {
        info!("Processing chat for user={}", turn.username);
        let mut profile = self.profiles.load(&turn.username);
        let mut profile_changed = false;

        let requested_language = turn.requested_language();
        if let Some(code) = requested_language.as_deref() {
            if turn.force_language && (profile.language != code || profile.locale != code) {
                info!("Forcing language to {} for {}", code, turn.username);
                profile.set_language(code);
                profile_changed = true;
            }
        }
        let language_code = requested_language.unwrap_or_else(|| profile_language(&profile));

        if let Some(requested) = non_blank(turn.scenario.as_deref()) {
            if profile.scenario.as_deref() != Some(requested) {
                profile.ai_role = self.role_for(&profile, requested, &language_code).await;
                profile.scenario = Some(requested.to_string());
                profile_changed = true;
            }
        }
        if non_blank(profile.scenario.as_deref()).is_none() {
            profile.scenario = Some(PRACTICE_SCENARIO.to_string());
            profile.ai_role = PRACTICE_ROLE.to_string();
            profile_changed = true;
        }
        if profile.ai_role.trim().is_empty() {
            let scenario = profile.scenario.clone().unwrap_or_default();
            profile.ai_role = self.role_for(&profile, &scenario, &language_code).await;
            profile_changed = true;
        }

        let scenario = resolve_scenario(&profile, &language_code);
        let session_id = non_blank(turn.conversation_id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let decision = persistence::decide(PersistenceInputs {
            is_discarded: turn.is_discarded,
            save_to_history: turn.save_to_history,
            profile_discards: profile.preferences.discard_conversation,
            is_roleplay: scenario.is_roleplay,
        });
        info!(
            "Save decision for {}: roleplay={}, decision={:?}",
            turn.username, scenario.is_roleplay, decision
        );

        let context = TurnContext {
            ai_role: profile.ai_role.clone(),
            scenario: scenario.description.clone(),
            language: language_code.clone(),
            conversation_id: session_id.clone(),
        };

        let (reply, conversation_id, saved) = if scenario.is_roleplay {
            let thread = self.profiles.find_or_create_thread(
                &turn.username,
                &scenario.title,
                scenario.is_custom,
                &language_code,
            );
            let thread_messages = thread
                .as_ref()
                .map(|t| self.profiles.thread_messages(&t.id))
                .unwrap_or_default();
            let messages = self.builder.build(&context, History::Thread(&thread_messages), &turn.message);
            let reply = self.replies.generate_reply(messages, &language_code).await;

            if profile_changed {
                self.profiles.save(&mut profile);
            }
            match thread {
                Some(thread) => {
                    let user_saved = self
                        .profiles
                        .insert_thread_message(&thread.id, &NewScenarioMessage::new(turn.message.as_str(), Sender::User));
                    let ai_saved = self
                        .profiles
                        .insert_thread_message(&thread.id, &NewScenarioMessage::new(reply.text.as_str(), Sender::Assistant));
                    (reply, thread.id, user_saved && ai_saved)
                }
                None => {
                    warn!("No scenario thread for {}; roleplay turn not stored", turn.username);
                    (reply, session_id, false)
                }
            }
        } else {
            let messages = self.builder.build(&context, History::Main(&profile.chat_history), &turn.message);
            let reply = self.replies.generate_reply(messages, &language_code).await;

            let append = decision.appends_to_main_history();
            if append {
                profile.chat_history.push(
                    ChatEntry::exchange(turn.message.as_str(), reply.text.as_str()).with_conversation(session_id.as_str()),
                );
            }
            let saved = if append || profile_changed {
                self.profiles.save(&mut profile) && append
            } else {
                false
            };
            (reply, session_id, saved)
        };

        let audio_url = speech::voice_reply(self.speech.as_ref(), &reply.text, &language_code).await;

        ChatTurnResult {
            response: reply.text,
            audio_url,
            conversation_id,
            is_roleplay: scenario.is_roleplay,
            saved,
        }
    }

    /// The AI's first line for the active scenario.
    ///
    /// The practice scenario answers with a fixed greeting. Roleplay
    /// scenarios reuse the first assistant line of their thread, or ask the
    /// model for one and store it there.
    pub async fn scenario_opening(&self, username: &str, language: Option<&str>) -> ScenarioOpening {
        let mut profile = self.profiles.load(username);
        let language_code = non_blank(language)
            .map(language::normalize)
            .unwrap_or_else(|| profile_language(&profile));
        let scenario = resolve_scenario(&profile, &language_code);

        if !scenario.is_roleplay {
            let greeting = phrasebook::practice_greeting(&language_code).to_string();
            let audio_url = speech::voice_reply(self.speech.as_ref(), &greeting, &language_code).await;
            return ScenarioOpening {
                response: greeting,
                audio_url,
                scenario: PRACTICE_SCENARIO.to_string(),
                ai_role: PRACTICE_ROLE.to_string(),
            };
        }

        if profile.ai_role.trim().is_empty() {
            let raw_scenario = profile.scenario.clone().unwrap_or_default();
            profile.ai_role = self.role_for(&profile, &raw_scenario, &language_code).await;
            self.profiles.save(&mut profile);
        }
        let ai_role = profile.ai_role.clone();

        let thread = self
            .profiles
            .find_or_create_thread(username, &scenario.title, scenario.is_custom, &language_code);
        let existing = thread.as_ref().and_then(|t| {
            self.profiles
                .thread_messages(&t.id)
                .into_iter()
                .find(|m| m.sender == Sender::Assistant)
                .map(|m| m.text)
        });

        let response = match existing {
            Some(text) => {
                info!("Reusing scenario opener for {}/{}", username, scenario.title);
                text
            }
            None => match self.replies.opener(&ai_role, &scenario.description, &language_code).await {
                Some(text) => {
                    if let Some(thread) = &thread {
                        self.profiles
                            .insert_thread_message(&thread.id, &NewScenarioMessage::new(text.as_str(), Sender::Assistant));
                    }
                    text
                }
                None => format!(
                    "Hello! I'm playing the role of {} in this {} scenario. How can I help you today?",
                    ai_role, scenario.title
                ),
            },
        };

        let audio_url = speech::voice_reply(self.speech.as_ref(), &response, &language_code).await;
        ScenarioOpening { response, audio_url, scenario: scenario.title, ai_role }
    }

    /// Switches the profile to `scenario` and resolves its role. History is
    /// left alone; roleplay threads are keyed by scenario anyway.
    pub async fn set_scenario(&self, username: &str, scenario: &str, language: Option<&str>) -> ScenarioSelection {
        let mut profile = self.profiles.load(username);
        if let Some(code) = non_blank(language).map(language::normalize) {
            profile.set_language(&code);
        }
        let language_code = profile_language(&profile);

        let scenario = non_blank(Some(scenario)).unwrap_or(PRACTICE_SCENARIO).to_string();
        let ai_role = self.role_for(&profile, &scenario, &language_code).await;
        info!("User {} switched to scenario '{}' with role '{}'", username, scenario, ai_role);

        profile.scenario = Some(scenario.clone());
        profile.ai_role = ai_role.clone();
        self.profiles.save(&mut profile);

        ScenarioSelection { scenario, ai_role }
    }
}
