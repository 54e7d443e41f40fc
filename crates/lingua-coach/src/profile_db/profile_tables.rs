use crate::error::{StoreError, StoreResult};
use crate::profile_db::schema::*;
use crate::profile_db::{ensure_user_row, generate_batch_id, parse_datetime_safe, PooledConnection, SqlitePool};
use rusqlite::{params, Connection, OptionalExtension, Row};
use chrono::Utc;
use tracing::{debug, info, warn};
use std::sync::Arc;

/// Reads and writes the `users`, `chat_entries` and `custom_scenarios` tables.
pub struct ProfileTables {
    pool: Arc<SqlitePool>,
}

impl ProfileTables {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> StoreResult<PooledConnection> {
        Ok(self.pool.get()?)
    }

    pub fn load(&self, username: &str) -> StoreResult<UserProfile> {
        let conn = self.get_conn()?;

        let existing = conn
            .query_row(
                "SELECT username, language, locale, scenario, ai_role, preferences, lessons,
                        created_at, updated_at
                 FROM users WHERE username = ?1",
                [username],
                |row| Ok(Self::row_to_profile(row)),
            )
            .optional()?;

        let mut profile = match existing {
            Some(profile) => profile?,
            None => {
                info!("Creating default profile for user: {}", username);
                let profile = UserProfile::new_default(username);
                Self::upsert_user_row(&conn, &profile)?;
                return Ok(profile);
            }
        };

        profile.chat_history = Self::load_entries(&conn, username)?;
        profile.custom_scenarios = Self::load_custom_scenarios(&conn, username)?;
        debug!(
            "Loaded profile {} ({} history entries, {} custom scenarios)",
            username,
            profile.chat_history.len(),
            profile.custom_scenarios.len()
        );
        Ok(profile)
    }

    /// Rewrites the profile document in one transaction.
    pub fn save(&self, profile: &mut UserProfile) -> StoreResult<()> {
        profile.updated_at = Utc::now();
        for entry in profile.chat_history.iter_mut() {
            entry.normalize_initiator();
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::upsert_user_row(&tx, profile)?;

        tx.execute("DELETE FROM chat_entries WHERE username = ?1", [&profile.username])?;
        for (position, entry) in profile.chat_history.iter().enumerate() {
            Self::insert_entry(&tx, &profile.username, position as i64, entry)?;
        }

        tx.execute("DELETE FROM custom_scenarios WHERE username = ?1", [&profile.username])?;
        for scenario in &profile.custom_scenarios {
            Self::insert_custom_scenario(&tx, &profile.username, scenario)?;
        }

        tx.commit()?;
        debug!("Saved profile {} ({} entries)", profile.username, profile.chat_history.len());
        Ok(())
    }

    pub fn append_messages(
        &self,
        username: &str,
        entries: Vec<ChatEntry>,
        batch_id: Option<&str>,
        is_discarded: bool,
    ) -> StoreResult<String> {
        let batch_id = match batch_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => generate_batch_id(),
        };

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        ensure_user_row(&tx, username)?;

        let mut position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM chat_entries WHERE username = ?1",
            [username],
            |row| row.get(0),
        )?;

        let count = entries.len();
        for mut entry in entries {
            entry.normalize_initiator();
            entry.batch_id = Some(batch_id.clone());
            entry.is_discarded = is_discarded;
            Self::insert_entry(&tx, username, position, &entry)?;
            position += 1;
        }

        tx.execute(
            "UPDATE users SET updated_at = ?1 WHERE username = ?2",
            params![Utc::now().to_rfc3339(), username],
        )?;
        tx.commit()?;

        info!("Appended {} entries for {} under {}", count, username, batch_id);
        Ok(batch_id)
    }

    pub fn delete_profile(&self, username: &str) -> StoreResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
        if deleted > 0 {
            info!("Deleted profile {} with all owned rows", username);
        }
        Ok(deleted > 0)
    }

    pub fn add_custom_scenario(&self, username: &str, scenario: &CustomScenario) -> StoreResult<()> {
        let conn = self.get_conn()?;
        ensure_user_row(&conn, username)?;
        Self::insert_custom_scenario(&conn, username, scenario)?;
        Ok(())
    }

    pub fn count_custom_scenarios_by_title(&self, username: &str, title: &str) -> StoreResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM custom_scenarios
             WHERE username = ?1 AND lower(trim(title)) = lower(trim(?2))",
            params![username, title],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn delete_custom_scenario(&self, username: &str, scenario_id: &str) -> StoreResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM custom_scenarios WHERE username = ?1 AND id = ?2",
            params![username, scenario_id],
        )?;
        Ok(deleted > 0)
    }

    fn upsert_user_row(conn: &Connection, profile: &UserProfile) -> StoreResult<()> {
        let preferences = serde_json::to_string(&profile.preferences)?;
        let lessons = serde_json::to_string(&profile.lessons)?;
        conn.execute(
            "INSERT INTO users
             (username, language, locale, scenario, ai_role, preferences, lessons, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(username) DO UPDATE SET
                language = excluded.language,
                locale = excluded.locale,
                scenario = excluded.scenario,
                ai_role = excluded.ai_role,
                preferences = excluded.preferences,
                lessons = excluded.lessons,
                updated_at = excluded.updated_at",
            params![
                profile.username,
                profile.language,
                profile.locale,
                profile.scenario,
                profile.ai_role,
                preferences,
                lessons,
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn insert_entry(conn: &Connection, username: &str, position: i64, entry: &ChatEntry) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO chat_entries
             (username, position, user_text, ai_text, initiated_by, timestamp,
              conversation_id, batch_id, is_discarded)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                username,
                position,
                entry.user_text(),
                entry.ai,
                entry.initiated_by.as_str(),
                entry.timestamp,
                entry.conversation_id,
                entry.batch_id,
                entry.is_discarded,
            ],
        )?;
        Ok(())
    }

    fn insert_custom_scenario(conn: &Connection, username: &str, scenario: &CustomScenario) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO custom_scenarios (id, username, title, description, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                role = excluded.role",
            params![
                scenario.id,
                username,
                scenario.title,
                scenario.description,
                scenario.role,
                scenario.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_entries(conn: &Connection, username: &str) -> StoreResult<Vec<ChatEntry>> {
        let mut stmt = conn.prepare(
            "SELECT user_text, ai_text, initiated_by, timestamp, conversation_id, batch_id, is_discarded
             FROM chat_entries WHERE username = ?1
             ORDER BY position ASC, id ASC",
        )?;
        let rows = stmt.query_map([username], |row| Ok(Self::row_to_entry(row)))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row??);
        }
        Ok(entries)
    }

    fn load_custom_scenarios(conn: &Connection, username: &str) -> StoreResult<Vec<CustomScenario>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, description, role, created_at
             FROM custom_scenarios WHERE username = ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([username], |row| {
            let created_at: String = row.get(4)?;
            Ok(CustomScenario {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                role: row.get(3)?,
                created_at: parse_datetime_safe(&created_at).unwrap_or_else(|| {
                    warn!("Failed to parse custom scenario created_at: {}", created_at);
                    Utc::now()
                }),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn row_to_entry(row: &Row) -> StoreResult<ChatEntry> {
        let initiated_by: String = row.get(2)?;
        let initiated_by = Initiator::parse(&initiated_by)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown initiator '{}'", initiated_by)))?;
        let mut entry = ChatEntry {
            user: row.get(0)?,
            ai: row.get(1)?,
            initiated_by,
            timestamp: row.get(3)?,
            conversation_id: row.get(4)?,
            batch_id: row.get(5)?,
            is_discarded: row.get(6)?,
        };
        entry.normalize_initiator();
        Ok(entry)
    }

    fn row_to_profile(row: &Row) -> StoreResult<UserProfile> {
        let preferences: String = row.get(5)?;
        let lessons: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let updated_at: String = row.get(8)?;

        Ok(UserProfile {
            username: row.get(0)?,
            language: row.get(1)?,
            locale: row.get(2)?,
            scenario: row.get(3)?,
            ai_role: row.get(4)?,
            chat_history: Vec::new(),
            custom_scenarios: Vec::new(),
            lessons: serde_json::from_str(&lessons)?,
            preferences: serde_json::from_str(&preferences)?,
            created_at: parse_datetime_safe(&created_at).unwrap_or_else(|| {
                warn!("Failed parse created_at");
                Utc::now()
            }),
            updated_at: parse_datetime_safe(&updated_at).unwrap_or_else(|| {
                warn!("Failed parse updated_at");
                Utc::now()
            }),
        })
    }
}
