//! Profile database module - SQLite-backed storage for user profiles, main
//! chat history, custom scenarios and roleplay threads
pub mod schema;
pub mod migration;
pub mod profile_tables;
pub mod scenario_tables;
pub mod service;
pub use schema::*;
pub use migration::MigrationManager;
pub use profile_tables::ProfileTables;
pub use scenario_tables::ScenarioTables;
pub use service::ProfileService;
use std::path::Path;
use std::sync::Arc;
use chrono::{DateTime, NaiveDateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreResult;

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Storage contract consumed by the conversation engine.
///
/// Every call returns an explicit result; callers that must not fail wrap the
/// store in a [`ProfileService`].
pub trait ProfileStore: Send + Sync {
    /// Profile for `username`, created with defaults on first reference.
    /// History includes discarded entries.
    fn load(&self, username: &str) -> StoreResult<UserProfile>;

    /// Upsert the whole profile document. Stamps `updated_at`.
    fn save(&self, profile: &mut UserProfile) -> StoreResult<()>;

    /// Append entries tagged with `batch_id` (generated when absent) and the
    /// discard flag. Returns the batch id used.
    fn append_messages(
        &self,
        username: &str,
        entries: Vec<ChatEntry>,
        batch_id: Option<&str>,
        is_discarded: bool,
    ) -> StoreResult<String>;

    /// Remove the profile and everything it owns.
    fn delete_profile(&self, username: &str) -> StoreResult<bool>;

    fn add_custom_scenario(&self, username: &str, scenario: &CustomScenario) -> StoreResult<()>;

    /// Case-insensitive title count.
    fn count_custom_scenarios_by_title(&self, username: &str, title: &str) -> StoreResult<usize>;

    fn delete_custom_scenario(&self, username: &str, scenario_id: &str) -> StoreResult<bool>;

    /// Oldest live thread for `(username, scenario_title)`.
    fn find_scenario_conversation(
        &self,
        username: &str,
        scenario_title: &str,
    ) -> StoreResult<Option<ScenarioConversation>>;

    fn create_scenario_conversation(
        &self,
        username: &str,
        scenario_title: &str,
        is_custom: bool,
        language: &str,
    ) -> StoreResult<ScenarioConversation>;

    fn find_or_create_scenario_conversation(
        &self,
        username: &str,
        scenario_title: &str,
        is_custom: bool,
        language: &str,
    ) -> StoreResult<ScenarioConversation> {
        match self.find_scenario_conversation(username, scenario_title)? {
            Some(existing) => Ok(existing),
            None => self.create_scenario_conversation(username, scenario_title, is_custom, language),
        }
    }

    fn insert_scenario_message(
        &self,
        conversation_id: &str,
        message: &NewScenarioMessage,
    ) -> StoreResult<i64>;

    /// Messages of a thread in timestamp order.
    fn scenario_messages(&self, conversation_id: &str) -> StoreResult<Vec<ScenarioMessage>>;

    /// Live threads, newest first, each with its messages.
    fn list_scenario_conversations(&self, username: &str) -> StoreResult<Vec<ScenarioThread>>;

    fn soft_delete_scenario_conversation(
        &self,
        username: &str,
        conversation_id: &str,
    ) -> StoreResult<bool>;

    fn ping(&self) -> StoreResult<()>;
}

/// `batch-<YYYYmmddHHMMSS>-<8 hex>`
pub fn generate_batch_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("batch-{}-{}", Utc::now().format("%Y%m%d%H%M%S"), &suffix[..8])
}

pub(crate) fn parse_datetime_safe(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
    }
    None
}

/// Insert a default user row if none exists, so owned rows can reference it.
pub(crate) fn ensure_user_row(conn: &rusqlite::Connection, username: &str) -> rusqlite::Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO users (username, created_at, updated_at) VALUES (?1, ?2, ?2)",
        rusqlite::params![username, now],
    )?;
    Ok(())
}

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

/// SQLite implementation of [`ProfileStore`].
pub struct SqliteProfileStore {
    pub profiles: ProfileTables,
    pub scenarios: ScenarioTables,
    pool: Arc<SqlitePool>,
}

impl SqliteProfileStore {
    pub fn new(db_path: &Path, pool_size: u32) -> anyhow::Result<Self> {
        info!("Opening profile database at: {}", db_path.display());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
            )
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create connection pool: {}", e))?;

        {
            let mut conn = pool.get()?;
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;",
            )?;
            let mut migrator = MigrationManager::new(&mut conn);
            migrator.initialize_database()?;
        }
        info!("Profile database initialized successfully");
        Ok(Self::from_pool(Arc::new(pool)))
    }

    /// Private in-memory database. Single connection, since every SQLite
    /// in-memory connection is its own database.
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;
        {
            let mut conn = pool.get()?;
            MigrationManager::new(&mut conn).initialize_database()?;
        }
        Ok(Self::from_pool(Arc::new(pool)))
    }

    fn from_pool(pool: Arc<SqlitePool>) -> Self {
        Self {
            profiles: ProfileTables::new(Arc::clone(&pool)),
            scenarios: ScenarioTables::new(Arc::clone(&pool)),
            pool,
        }
    }
}

impl ProfileStore for SqliteProfileStore {
    fn load(&self, username: &str) -> StoreResult<UserProfile> {
        self.profiles.load(username)
    }

    fn save(&self, profile: &mut UserProfile) -> StoreResult<()> {
        self.profiles.save(profile)
    }

    fn append_messages(
        &self,
        username: &str,
        entries: Vec<ChatEntry>,
        batch_id: Option<&str>,
        is_discarded: bool,
    ) -> StoreResult<String> {
        self.profiles.append_messages(username, entries, batch_id, is_discarded)
    }

    fn delete_profile(&self, username: &str) -> StoreResult<bool> {
        self.profiles.delete_profile(username)
    }

    fn add_custom_scenario(&self, username: &str, scenario: &CustomScenario) -> StoreResult<()> {
        self.profiles.add_custom_scenario(username, scenario)
    }

    fn count_custom_scenarios_by_title(&self, username: &str, title: &str) -> StoreResult<usize> {
        self.profiles.count_custom_scenarios_by_title(username, title)
    }

    fn delete_custom_scenario(&self, username: &str, scenario_id: &str) -> StoreResult<bool> {
        self.profiles.delete_custom_scenario(username, scenario_id)
    }

    fn find_scenario_conversation(
        &self,
        username: &str,
        scenario_title: &str,
    ) -> StoreResult<Option<ScenarioConversation>> {
        self.scenarios.find(username, scenario_title)
    }

    fn create_scenario_conversation(
        &self,
        username: &str,
        scenario_title: &str,
        is_custom: bool,
        language: &str,
    ) -> StoreResult<ScenarioConversation> {
        self.scenarios.create(username, scenario_title, is_custom, language)
    }

    fn insert_scenario_message(
        &self,
        conversation_id: &str,
        message: &NewScenarioMessage,
    ) -> StoreResult<i64> {
        self.scenarios.insert_message(conversation_id, message)
    }

    fn scenario_messages(&self, conversation_id: &str) -> StoreResult<Vec<ScenarioMessage>> {
        self.scenarios.messages(conversation_id)
    }

    fn list_scenario_conversations(&self, username: &str) -> StoreResult<Vec<ScenarioThread>> {
        self.scenarios.list(username)
    }

    fn soft_delete_scenario_conversation(
        &self,
        username: &str,
        conversation_id: &str,
    ) -> StoreResult<bool> {
        self.scenarios.soft_delete(username, conversation_id)
    }

    fn ping(&self) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
