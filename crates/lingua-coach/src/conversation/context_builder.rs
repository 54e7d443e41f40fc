//! Builds the role-tagged prompt for one chat turn

use crate::completion::Message;
use crate::language;
use crate::profile_db::{ChatEntry, ScenarioMessage, Sender};
use tracing::debug;

/// What the model is told about the current turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnContext {
    pub ai_role: String,
    /// Scenario text as shown to the model.
    pub scenario: String,
    /// Canonical language code the reply must be written in.
    pub language: String,
    pub conversation_id: String,
}

/// History source for one turn. Main chat and roleplay threads are never
/// combined in a single prompt.
#[derive(Debug, Clone, Copy)]
pub enum History<'a> {
    Main(&'a [ChatEntry]),
    Thread(&'a [ScenarioMessage]),
}

/// Configuration for context building
#[derive(Debug, Clone, Default)]
pub struct ContextBuilderConfig {
    /// Keeps only the most recent history turns when set.
    pub max_history_turns: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    config: ContextBuilderConfig,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(ContextBuilderConfig::default())
    }
}

impl ContextBuilder {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    /// System prompt, history, the new user message and a trailing language
    /// reminder, in that order.
    pub fn build(&self, turn: &TurnContext, history: History<'_>, new_message: &str) -> Vec<Message> {
        let mut turns = match history {
            History::Main(entries) => Self::main_history(entries, &turn.conversation_id),
            History::Thread(messages) => Self::thread_history(messages),
        };
        if let Some(limit) = self.config.max_history_turns {
            let excess = turns.len().saturating_sub(limit);
            turns.drain(..excess);
        }

        let mut messages = Vec::with_capacity(turns.len() + 3);
        messages.push(Message::system(Self::system_prompt(turn)));
        messages.extend(turns);
        messages.push(Message::user(new_message));
        messages.push(Message::system(Self::language_reminder(&turn.language)));

        debug!(
            "Built context with {} turns for conversation {}",
            messages.len(),
            turn.conversation_id
        );
        messages
    }

    pub fn system_prompt(turn: &TurnContext) -> String {
        let lang = language::language_name(&turn.language);
        format!(
            "You are playing the role of {role} in the following scenario: {scenario}. \
             You MUST respond ONLY in {lang}. Do not use any language other than {lang}, \
             regardless of what language the user writes in. Your response should be completely in {lang}. \
             Keep your reply conversational: 2-3 complete sentences, and never use numbered lists.",
            role = turn.ai_role,
            scenario = turn.scenario,
            lang = lang,
        )
    }

    pub fn language_reminder(language_code: &str) -> String {
        format!(
            "Remember to respond ONLY in {}, no matter what.",
            language::language_name(language_code)
        )
    }

    /// Non-discarded entries visible from `conversation_id`. AI-opened
    /// entries contribute only their assistant turn.
    pub fn main_history(entries: &[ChatEntry], conversation_id: &str) -> Vec<Message> {
        let mut turns = Vec::new();
        for entry in entries
            .iter()
            .filter(|e| !e.is_discarded && e.is_visible_in(conversation_id))
        {
            if let Some(user) = entry.user_text() {
                if !user.trim().is_empty() {
                    turns.push(Message::user(user));
                }
            }
            if !entry.ai.trim().is_empty() {
                turns.push(Message::assistant(entry.ai.as_str()));
            }
        }
        turns
    }

    /// Thread messages in timestamp order.
    pub fn thread_history(messages: &[ScenarioMessage]) -> Vec<Message> {
        let mut ordered: Vec<&ScenarioMessage> = messages.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        ordered
            .into_iter()
            .map(|m| match m.sender {
                Sender::User => Message::user(m.text.as_str()),
                Sender::Assistant => Message::assistant(m.text.as_str()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Role;

    fn create_test_turn() -> TurnContext {
        TurnContext {
            ai_role: "Waiter".into(),
            scenario: "Ordering dinner at a restaurant".into(),
            language: "es".into(),
            conversation_id: "c1".into(),
        }
    }

    fn thread_message(id: i64, text: &str, sender: Sender, timestamp: &str) -> ScenarioMessage {
        ScenarioMessage {
            id,
            conversation_id: "t1".into(),
            text: text.into(),
            sender,
            audio_url: None,
            timestamp: timestamp.into(),
        }
    }

    #[test]
    fn test_prompt_shape_and_language_constraint() {
        let builder = ContextBuilder::default();
        let messages = builder.build(&create_test_turn(), History::Main(&[]), "Hola");

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Waiter"));
        assert!(messages[0].content.contains("ONLY in Spanish"));
        assert_eq!(messages[1], Message::user("Hola"));
        assert_eq!(messages[2].role, Role::System);
        assert_eq!(messages[2].content, "Remember to respond ONLY in Spanish, no matter what.");
        assert_eq!(messages.iter().filter(|m| m.role == Role::System).count(), 2);
    }

    #[test]
    fn test_main_history_filters_discarded_and_foreign_conversations() {
        let mut discarded = ChatEntry::exchange("old", "gone");
        discarded.is_discarded = true;
        let entries = vec![
            ChatEntry::exchange("global", "visible"),
            ChatEntry::exchange("mine", "also visible").with_conversation("c1"),
            ChatEntry::exchange("other", "hidden").with_conversation("c2"),
            discarded,
            ChatEntry::ai_initiated("Welcome!"),
        ];

        let turns = ContextBuilder::main_history(&entries, "c1");
        let texts: Vec<_> = turns.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["global", "visible", "mine", "also visible", "Welcome!"]);
        assert_eq!(turns[4].role, Role::Assistant);
    }

    #[test]
    fn test_thread_history_orders_by_timestamp() {
        let messages = vec![
            thread_message(2, "Second", Sender::Assistant, "2024-01-01T10:00:02Z"),
            thread_message(1, "First", Sender::User, "2024-01-01T10:00:01Z"),
        ];
        let turns = ContextBuilder::thread_history(&messages);
        assert_eq!(turns, vec![Message::user("First"), Message::assistant("Second")]);
    }

    #[test]
    fn test_thread_context_never_includes_main_history() {
        let builder = ContextBuilder::default();
        let thread = vec![thread_message(1, "Tell me about yourself.", Sender::Assistant, "2024-01-01T10:00:00Z")];
        let messages = builder.build(&create_test_turn(), History::Thread(&thread), "I am a developer");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1], Message::assistant("Tell me about yourself."));
        assert_eq!(messages[2], Message::user("I am a developer"));
    }

    #[test]
    fn test_history_cap_keeps_latest_turns() {
        let builder = ContextBuilder::new(ContextBuilderConfig { max_history_turns: Some(2) });
        let entries = vec![ChatEntry::exchange("a", "b"), ChatEntry::exchange("c", "d")];
        let messages = builder.build(&create_test_turn(), History::Main(&entries), "e");

        let texts: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts[1..3], ["c", "d"]);
        assert_eq!(messages.len(), 5);
    }
}
