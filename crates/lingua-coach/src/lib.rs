// lingua-coach/crates/lingua-coach/src/lib.rs

pub mod api;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod language;
pub mod metrics;
pub mod phrasebook;
pub mod profile_db;
pub mod server;
pub mod shared_state;
pub mod speech;
pub mod telemetry;
pub mod tutor;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Public API exports
pub use config::Config;
pub use conversation::{ChatTurn, ChatTurnResult, ConversationSession};
pub use error::{ApiError, CompletionError, SpeechError, StoreError};
pub use profile_db::{ProfileService, ProfileStore, SqliteProfileStore, UserProfile};
pub use server::{build_router, open_profile_store, run_server};
pub use shared_state::AppState;
pub use tutor::Tutor;
