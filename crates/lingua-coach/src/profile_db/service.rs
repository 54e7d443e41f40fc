//! Failure policy in front of a [`ProfileStore`]: the conversational flow
//! never sees a storage error. Loads degrade to a default profile, writes
//! degrade to `false`/`None`, and every degradation is logged.

use std::sync::Arc;
use tracing::{error, warn};

use crate::profile_db::{
    ChatEntry, NewScenarioMessage, ProfileStore, ScenarioConversation, ScenarioMessage, UserProfile,
};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Direct access for endpoints that report storage errors to the client.
    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    pub fn load(&self, username: &str) -> UserProfile {
        match self.store.load(username) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile store unavailable for {}: {}. Using default profile.", username, e);
                UserProfile::new_default(username)
            }
        }
    }

    pub fn save(&self, profile: &mut UserProfile) -> bool {
        match self.store.save(profile) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save profile {}: {}", profile.username, e);
                false
            }
        }
    }

    pub fn append_messages(
        &self,
        username: &str,
        entries: Vec<ChatEntry>,
        batch_id: Option<&str>,
        is_discarded: bool,
    ) -> Option<String> {
        match self.store.append_messages(username, entries, batch_id, is_discarded) {
            Ok(batch_id) => Some(batch_id),
            Err(e) => {
                error!("Failed to append messages for {}: {}", username, e);
                None
            }
        }
    }

    pub fn find_or_create_thread(
        &self,
        username: &str,
        scenario_title: &str,
        is_custom: bool,
        language: &str,
    ) -> Option<ScenarioConversation> {
        match self
            .store
            .find_or_create_scenario_conversation(username, scenario_title, is_custom, language)
        {
            Ok(conversation) => Some(conversation),
            Err(e) => {
                warn!("Scenario thread lookup failed for {}/{}: {}", username, scenario_title, e);
                None
            }
        }
    }

    pub fn thread_messages(&self, conversation_id: &str) -> Vec<ScenarioMessage> {
        match self.store.scenario_messages(conversation_id) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to read scenario messages for {}: {}", conversation_id, e);
                Vec::new()
            }
        }
    }

    pub fn insert_thread_message(&self, conversation_id: &str, message: &NewScenarioMessage) -> bool {
        match self.store.insert_scenario_message(conversation_id, message) {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to store scenario message in {}: {}", conversation_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_db::{Sender, SqliteProfileStore};
    use crate::testing::FailingStore;

    #[test]
    fn test_broken_store_degrades_to_defaults() {
        let service = ProfileService::new(Arc::new(FailingStore));

        let mut profile = service.load("nobody");
        assert_eq!(profile.language, "English");
        assert_eq!(profile.locale, "en");
        assert!(profile.chat_history.is_empty());

        assert!(!service.save(&mut profile));
        assert!(service.append_messages("nobody", vec![ChatEntry::exchange("a", "b")], None, false).is_none());
        assert!(service.find_or_create_thread("nobody", "Travel", false, "en").is_none());
        assert!(service.thread_messages("missing").is_empty());
        assert!(!service.insert_thread_message("missing", &NewScenarioMessage::new("x", Sender::User)));
    }

    #[test]
    fn test_healthy_store_passes_through() {
        let service = ProfileService::new(Arc::new(SqliteProfileStore::new_in_memory().unwrap()));
        let mut profile = service.load("amy");
        profile.chat_history.push(ChatEntry::exchange("hi", "hello"));
        assert!(service.save(&mut profile));
        assert_eq!(service.load("amy").chat_history.len(), 1);

        let thread = service.find_or_create_thread("amy", "Travel", false, "en").unwrap();
        assert!(service.insert_thread_message(&thread.id, &NewScenarioMessage::new("x", Sender::User)));
        assert_eq!(service.thread_messages(&thread.id).len(), 1);
        let again = service.find_or_create_thread("amy", "Travel", false, "en").unwrap();
        assert_eq!(again.id, thread.id);
    }
}
