//! Data model for user profiles, main chat history and roleplay threads
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::catalog::DEFAULT_AI_ROLE;

/// Legacy marker some clients still send in the `user` field of an
/// AI-opened exchange.
pub const LEGACY_AI_INITIATED: &str = "AI INITIATED";

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

fn default_true() -> bool {
    true
}

/// Who opened an exchange in the main chat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Initiator {
    #[default]
    User,
    Ai,
}

impl Initiator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Initiator::User => "user",
            Initiator::Ai => "ai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Initiator::User),
            "ai" => Some(Initiator::Ai),
            _ => None,
        }
    }
}

/// One exchange of the main (non-roleplay) chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatEntry {
    /// Absent when the AI opened the exchange.
    #[serde(default)]
    pub user: Option<String>,
    pub ai: String,
    #[serde(default)]
    pub initiated_by: Initiator,
    #[serde(default = "now_iso")]
    pub timestamp: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub is_discarded: bool,
}

impl ChatEntry {
    pub fn exchange(user: impl Into<String>, ai: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ai: ai.into(),
            initiated_by: Initiator::User,
            timestamp: now_iso(),
            conversation_id: None,
            batch_id: None,
            is_discarded: false,
        }
    }

    pub fn ai_initiated(ai: impl Into<String>) -> Self {
        Self {
            user: None,
            ai: ai.into(),
            initiated_by: Initiator::Ai,
            timestamp: now_iso(),
            conversation_id: None,
            batch_id: None,
            is_discarded: false,
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Maps the legacy text marker onto [`Initiator::Ai`].
    pub fn normalize_initiator(&mut self) {
        if self.user.as_deref() == Some(LEGACY_AI_INITIATED) {
            self.user = None;
            self.initiated_by = Initiator::Ai;
        }
        if self.initiated_by == Initiator::Ai {
            self.user = None;
        }
    }

    /// User text of the exchange, `None` for AI-opened entries.
    pub fn user_text(&self) -> Option<&str> {
        match self.initiated_by {
            Initiator::Ai => None,
            Initiator::User => self.user.as_deref(),
        }
    }

    /// Entries without a conversation id are visible from every conversation.
    pub fn is_visible_in(&self, conversation_id: &str) -> bool {
        match self.conversation_id.as_deref() {
            None | Some("") => true,
            Some(id) => id == conversation_id,
        }
    }
}

/// Per-user switches persisted with the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub discard_conversation: bool,
    #[serde(default = "default_true")]
    pub save_to_history: bool,
    /// Client-defined keys round-trip untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            discard_conversation: false,
            save_to_history: true,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomScenario {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub language: String,
    pub locale: String,
    pub scenario: Option<String>,
    pub ai_role: String,
    pub chat_history: Vec<ChatEntry>,
    pub custom_scenarios: Vec<CustomScenario>,
    pub lessons: Vec<String>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile handed out for a username that has never been stored.
    pub fn new_default(username: &str) -> Self {
        let now = Utc::now();
        Self {
            username: username.to_string(),
            language: "English".to_string(),
            locale: "en".to_string(),
            scenario: None,
            ai_role: DEFAULT_AI_ROLE.to_string(),
            chat_history: Vec::new(),
            custom_scenarios: Vec::new(),
            lessons: Vec::new(),
            preferences: Preferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Writes both language fields so they never disagree.
    pub fn set_language(&mut self, code: &str) {
        self.language = code.to_string();
        self.locale = code.to_string();
    }

    /// History entries that may feed model context.
    pub fn active_history(&self) -> impl Iterator<Item = &ChatEntry> {
        self.chat_history.iter().filter(|e| !e.is_discarded)
    }

    pub fn active_history_len(&self) -> usize {
        self.active_history().count()
    }

    /// Custom scenario by id, or by title ignoring case.
    pub fn find_custom_scenario(&self, key: &str) -> Option<&CustomScenario> {
        let wanted = key.trim();
        self.custom_scenarios
            .iter()
            .find(|s| s.id == wanted || s.title.trim().to_lowercase() == wanted.to_lowercase())
    }
}

/// Author of a roleplay thread message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Anything other than `user` is the assistant.
    pub fn parse_lenient(value: &str) -> Self {
        if value == "user" {
            Sender::User
        } else {
            Sender::Assistant
        }
    }
}

/// Roleplay thread keyed by `(username, scenario_title)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConversation {
    pub id: String,
    pub username: String,
    pub scenario_title: String,
    pub is_custom: bool,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioMessage {
    pub id: i64,
    pub conversation_id: String,
    pub text: String,
    pub sender: Sender,
    pub audio_url: Option<String>,
    pub timestamp: String,
}

/// Message about to be written into a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct NewScenarioMessage {
    pub text: String,
    #[serde(deserialize_with = "deserialize_sender")]
    pub sender: Sender,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default = "now_iso")]
    pub timestamp: String,
}

fn deserialize_sender<'de, D>(deserializer: D) -> Result<Sender, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Sender::parse_lenient(&raw))
}

impl NewScenarioMessage {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            audio_url: None,
            timestamp: now_iso(),
        }
    }
}

/// A thread with its messages in timestamp order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScenarioThread {
    #[serde(flatten)]
    pub conversation: ScenarioConversation,
    pub messages: Vec<ScenarioMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = UserProfile::new_default("mika");
        assert_eq!(profile.language, "English");
        assert_eq!(profile.locale, "en");
        assert!(profile.scenario.is_none());
        assert!(profile.chat_history.is_empty());
        assert!(!profile.preferences.discard_conversation);
        assert!(profile.preferences.save_to_history);
    }

    #[test]
    fn test_legacy_marker_becomes_initiator() {
        let mut entry: ChatEntry = serde_json::from_value(serde_json::json!({
            "user": "AI INITIATED",
            "ai": "Welcome to the restaurant!",
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.initiated_by, Initiator::User);

        entry.normalize_initiator();
        assert_eq!(entry.initiated_by, Initiator::Ai);
        assert_eq!(entry.user_text(), None);
        assert!(!entry.is_discarded);
    }

    #[test]
    fn test_conversation_visibility() {
        let global = ChatEntry::exchange("hi", "hello");
        let scoped = ChatEntry::exchange("hi", "hello").with_conversation("c1");
        let empty_id = ChatEntry {
            conversation_id: Some(String::new()),
            ..ChatEntry::exchange("a", "b")
        };

        assert!(global.is_visible_in("c2"));
        assert!(empty_id.is_visible_in("c2"));
        assert!(scoped.is_visible_in("c1"));
        assert!(!scoped.is_visible_in("c2"));
    }

    #[test]
    fn test_preferences_keep_unknown_keys() {
        let prefs: Preferences = serde_json::from_value(serde_json::json!({
            "discard_conversation": true,
            "theme": "dark"
        }))
        .unwrap();
        assert!(prefs.discard_conversation);
        assert!(prefs.save_to_history);
        assert_eq!(prefs.extra.get("theme"), Some(&serde_json::json!("dark")));
    }

    #[test]
    fn test_sender_parsing_is_lenient() {
        assert_eq!(Sender::parse_lenient("user"), Sender::User);
        assert_eq!(Sender::parse_lenient("ai"), Sender::Assistant);
        let msg: NewScenarioMessage =
            serde_json::from_value(serde_json::json!({"text": "Hola", "sender": "bot"})).unwrap();
        assert_eq!(msg.sender, Sender::Assistant);
    }

    #[test]
    fn test_custom_scenario_title_match_ignores_case() {
        let mut profile = UserProfile::new_default("mika");
        profile.custom_scenarios.push(CustomScenario {
            id: "custom_1".into(),
            title: "Bakery Visit".into(),
            description: String::new(),
            role: "Baker".into(),
            created_at: Utc::now(),
        });
        assert_eq!(profile.find_custom_scenario(" bakery visit").map(|s| s.role.as_str()), Some("Baker"));
        assert!(profile.find_custom_scenario("custom_1").is_some());
        assert!(profile.find_custom_scenario("Bakery").is_none());
    }
}
