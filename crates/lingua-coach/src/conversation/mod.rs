//! Conversation engine - context building, reply shaping and persistence
//! decisions for chat turns

pub mod context_builder;
pub mod persistence;
pub mod reply;
pub mod session;

pub use context_builder::{ContextBuilder, ContextBuilderConfig, History, TurnContext};
pub use persistence::{
    decide, delete_batch, discard, hard_delete, DeleteOutcome, DeleteStrategy, DiscardSelector, PersistenceDecision,
    PersistenceInputs, SkipReason,
};
pub use reply::{FinalReply, ReplyEngine, ReplyOutcome};
pub use session::{
    profile_language, resolve_scenario, ChatTurn, ChatTurnResult, ConversationSession, ResolvedScenario,
    ScenarioOpening, ScenarioSelection,
};
