use crate::error::StoreResult;
use crate::profile_db::schema::*;
use crate::profile_db::{ensure_user_row, parse_datetime_safe, PooledConnection, SqlitePool};
use rusqlite::{params, Connection, OptionalExtension, Row};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use std::sync::Arc;

const CONVERSATION_COLUMNS: &str =
    "id, username, scenario_title, is_custom, language, created_at, is_deleted, deleted";

/// Roleplay threads live here, never in `chat_entries`.
pub struct ScenarioTables {
    pool: Arc<SqlitePool>,
}

impl ScenarioTables {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> StoreResult<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Exact, case-sensitive title match; soft-deleted threads are skipped.
    pub fn find(&self, username: &str, scenario_title: &str) -> StoreResult<Option<ScenarioConversation>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {} FROM scenario_conversations
                     WHERE username = ?1 AND scenario_title = ?2 AND is_deleted = 0 AND deleted = 0
                     ORDER BY created_at ASC LIMIT 1",
                    CONVERSATION_COLUMNS
                ),
                params![username, scenario_title],
                Self::row_to_conversation,
            )
            .optional()?;
        Ok(found)
    }

    pub fn create(
        &self,
        username: &str,
        scenario_title: &str,
        is_custom: bool,
        language: &str,
    ) -> StoreResult<ScenarioConversation> {
        let conn = self.get_conn()?;
        ensure_user_row(&conn, username)?;

        let conversation = ScenarioConversation {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            scenario_title: scenario_title.to_string(),
            is_custom,
            language: language.to_string(),
            created_at: Utc::now(),
            is_deleted: false,
            deleted: false,
        };
        conn.execute(
            "INSERT INTO scenario_conversations
             (id, username, scenario_title, is_custom, language, created_at, is_deleted, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0)",
            params![
                conversation.id,
                conversation.username,
                conversation.scenario_title,
                conversation.is_custom,
                conversation.language,
                conversation.created_at.to_rfc3339(),
            ],
        )?;
        info!("Created scenario conversation {} ({}) for {}", conversation.id, scenario_title, username);
        Ok(conversation)
    }

    pub fn insert_message(&self, conversation_id: &str, message: &NewScenarioMessage) -> StoreResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO scenario_messages (conversation_id, text, sender, audio_url, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                conversation_id,
                message.text,
                message.sender.as_str(),
                message.audio_url,
                message.timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn messages(&self, conversation_id: &str) -> StoreResult<Vec<ScenarioMessage>> {
        let conn = self.get_conn()?;
        Self::messages_with_conn(&conn, conversation_id)
    }

    pub fn list(&self, username: &str) -> StoreResult<Vec<ScenarioThread>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM scenario_conversations
             WHERE username = ?1 AND is_deleted = 0 AND deleted = 0
             ORDER BY created_at DESC",
            CONVERSATION_COLUMNS
        ))?;
        let conversations = stmt
            .query_map([username], Self::row_to_conversation)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut threads = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let messages = Self::messages_with_conn(&conn, &conversation.id)?;
            threads.push(ScenarioThread { conversation, messages });
        }
        Ok(threads)
    }

    pub fn soft_delete(&self, username: &str, conversation_id: &str) -> StoreResult<bool> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE scenario_conversations SET is_deleted = 1, deleted = 1
             WHERE id = ?1 AND username = ?2",
            params![conversation_id, username],
        )?;
        Ok(updated > 0)
    }

    fn messages_with_conn(conn: &Connection, conversation_id: &str) -> StoreResult<Vec<ScenarioMessage>> {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, text, sender, audio_url, timestamp
             FROM scenario_messages WHERE conversation_id = ?1
             ORDER BY timestamp ASC, id ASC",
        )?;
        let messages = stmt
            .query_map([conversation_id], |row| {
                let sender: String = row.get(3)?;
                Ok(ScenarioMessage {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    text: row.get(2)?,
                    sender: Sender::parse_lenient(&sender),
                    audio_url: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    fn row_to_conversation(row: &Row) -> rusqlite::Result<ScenarioConversation> {
        let created_at: String = row.get(5)?;
        Ok(ScenarioConversation {
            id: row.get(0)?,
            username: row.get(1)?,
            scenario_title: row.get(2)?,
            is_custom: row.get(3)?,
            language: row.get(4)?,
            created_at: parse_datetime_safe(&created_at).unwrap_or_else(|| {
                warn!("Failed parse scenario conversation created_at");
                Utc::now()
            }),
            is_deleted: row.get(6)?,
            deleted: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::profile_db::{NewScenarioMessage, ProfileStore, Sender, SqliteProfileStore};

    fn create_test_store() -> SqliteProfileStore {
        SqliteProfileStore::new_in_memory().unwrap()
    }

    #[test]
    fn test_find_or_create_reuses_live_thread() {
        let store = create_test_store();
        let first = store.find_or_create_scenario_conversation("ivy", "Job Interview", false, "en").unwrap();
        let second = store.find_or_create_scenario_conversation("ivy", "Job Interview", false, "en").unwrap();
        assert_eq!(first.id, second.id);

        // Title match is case-sensitive
        let other = store.find_or_create_scenario_conversation("ivy", "job interview", false, "en").unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_soft_deleted_thread_is_hidden() {
        let store = create_test_store();
        let thread = store.find_or_create_scenario_conversation("ivy", "Travel", false, "fr").unwrap();
        assert!(store.soft_delete_scenario_conversation("ivy", &thread.id).unwrap());
        assert!(!store.soft_delete_scenario_conversation("someone-else", &thread.id).unwrap());

        assert!(store.find_scenario_conversation("ivy", "Travel").unwrap().is_none());
        assert!(store.list_scenario_conversations("ivy").unwrap().is_empty());

        let replacement = store.find_or_create_scenario_conversation("ivy", "Travel", false, "fr").unwrap();
        assert_ne!(replacement.id, thread.id);
    }

    #[test]
    fn test_messages_are_ordered_by_timestamp() {
        let store = create_test_store();
        let thread = store.find_or_create_scenario_conversation("ivy", "Restaurant", false, "en").unwrap();

        let mut late = NewScenarioMessage::new("A table for two.", Sender::User);
        late.timestamp = "2024-05-01T10:05:00+00:00".into();
        let mut early = NewScenarioMessage::new("Welcome!", Sender::Assistant);
        early.timestamp = "2024-05-01T10:00:00+00:00".into();

        store.insert_scenario_message(&thread.id, &late).unwrap();
        store.insert_scenario_message(&thread.id, &early).unwrap();

        let messages = store.scenario_messages(&thread.id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Welcome!");
        assert_eq!(messages[0].sender, Sender::Assistant);
        assert_eq!(messages[1].sender, Sender::User);
    }

    #[test]
    fn test_list_returns_threads_with_messages() {
        let store = create_test_store();
        let a = store.create_scenario_conversation("ivy", "Restaurant", false, "en").unwrap();
        store.create_scenario_conversation("ivy", "Travel", false, "en").unwrap();
        store
            .insert_scenario_message(&a.id, &NewScenarioMessage::new("Hi", Sender::User))
            .unwrap();

        let threads = store.list_scenario_conversations("ivy").unwrap();
        assert_eq!(threads.len(), 2);
        let restaurant = threads
            .iter()
            .find(|t| t.conversation.scenario_title == "Restaurant")
            .unwrap();
        assert_eq!(restaurant.messages.len(), 1);
        assert!(threads[0].conversation.created_at >= threads[1].conversation.created_at);
    }
}
