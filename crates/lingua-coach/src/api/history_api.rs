//! Main chat history and roleplay thread endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::profile_api::{StatusResponse, UsernameQuery};
use super::{non_blank, not_blank};
use crate::conversation::{delete_batch, discard, hard_delete, DiscardSelector};
use crate::error::{ApiError, ApiResult};
use crate::language;
use crate::profile_db::{ChatEntry, NewScenarioMessage, ScenarioThread};
use crate::shared_state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub chat_history: Vec<ChatEntry>,
}

/// Active history, narrowed to one conversation when an id is given.
pub async fn conversation_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    query.validate()?;
    let profile = state.profiles.store().load(query.username.trim())?;
    let conversation_id = non_blank(query.conversation_id.as_deref());

    let chat_history = profile
        .active_history()
        .filter(|e| conversation_id.map_or(true, |id| e.is_visible_in(id)))
        .cloned()
        .collect();
    Ok(Json(HistoryResponse { chat_history }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveConversationRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub conversation: Vec<ChatEntry>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub is_discarded: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveConversationResponse {
    pub success: bool,
    pub message: String,
    pub batch_id: Option<String>,
}

/// Appends client-held exchanges under one batch id.
pub async fn save_conversation(
    State(state): State<AppState>,
    Json(req): Json<SaveConversationRequest>,
) -> ApiResult<Json<SaveConversationResponse>> {
    req.validate()?;
    let username = req.username.trim();
    if req.conversation.is_empty() {
        warn!("Empty conversation from {}", username);
        return Ok(Json(SaveConversationResponse {
            success: true,
            message: "No messages to save".to_string(),
            batch_id: None,
        }));
    }

    let entries: Vec<ChatEntry> = req
        .conversation
        .into_iter()
        .map(|mut entry| {
            entry.normalize_initiator();
            entry
        })
        .collect();
    let count = entries.len();

    let batch_id = state.profiles.store().append_messages(
        username,
        entries,
        non_blank(req.batch_id.as_deref()),
        req.is_discarded,
    )?;
    info!("Saved {} messages for {} in batch {}", count, username, batch_id);

    Ok(Json(SaveConversationResponse {
        success: true,
        message: format!("Successfully saved {} messages", count),
        batch_id: Some(batch_id),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClearConversationRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub force_clear: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearConversationResponse {
    pub success: bool,
    pub message: String,
    pub action: &'static str,
    pub marked_count: usize,
}

/// Flags entries as discarded and switches the profile to discarding.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Json(req): Json<ClearConversationRequest>,
) -> ApiResult<Json<ClearConversationResponse>> {
    req.validate()?;
    let store = state.profiles.store();
    let mut profile = store.load(req.username.trim())?;

    let selector = DiscardSelector {
        conversation_id: non_blank(req.conversation_id.as_deref()).map(str::to_string),
        batch_id: non_blank(req.batch_id.as_deref()).map(str::to_string),
        force_clear: req.force_clear,
    };
    let marked_count = discard(&mut profile, &selector);
    store.save(&mut profile)?;

    Ok(Json(ClearConversationResponse {
        success: true,
        message: format!("Conversation marked as discarded ({} messages flagged)", marked_count),
        action: "discard",
        marked_count,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteChatMessageRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub timestamps: Vec<String>,
}

/// Physically removes entries. Reports `success: false` when nothing matched.
pub async fn delete_chat_message(
    State(state): State<AppState>,
    Json(req): Json<DeleteChatMessageRequest>,
) -> ApiResult<Json<StatusResponse>> {
    req.validate()?;
    let store = state.profiles.store();
    let mut profile = store.load(req.username.trim())?;

    if profile.chat_history.is_empty() {
        return Ok(Json(StatusResponse {
            success: false,
            message: "Chat history not found or empty".to_string(),
        }));
    }

    let outcome = hard_delete(&mut profile, non_blank(req.batch_id.as_deref()), &req.timestamps);
    if outcome.removed == 0 {
        return Ok(Json(StatusResponse {
            success: false,
            message: "No matching messages found".to_string(),
        }));
    }

    store.save(&mut profile)?;
    Ok(Json(StatusResponse::ok(format!("Successfully deleted {} messages", outcome.removed))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DiscardBatchRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub batch_id: String,
}

#[derive(Debug, Serialize)]
pub struct DiscardBatchResponse {
    pub status: &'static str,
    pub deleted_count: usize,
}

/// Physically removes one saved batch. Other selectors are not consulted.
pub async fn discard_by_batchid(
    State(state): State<AppState>,
    Json(req): Json<DiscardBatchRequest>,
) -> ApiResult<Json<DiscardBatchResponse>> {
    req.validate()?;
    let store = state.profiles.store();
    let mut profile = store.load(req.username.trim())?;

    let deleted_count = delete_batch(&mut profile, req.batch_id.trim());
    if deleted_count > 0 {
        store.save(&mut profile)?;
    }
    Ok(Json(DiscardBatchResponse {
        status: "success",
        deleted_count,
    }))
}

fn default_thread_language() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveScenarioMessagesRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub scenario_title: String,
    #[serde(default)]
    pub messages: Vec<NewScenarioMessage>,
    #[serde(default)]
    pub is_custom_scenario: bool,
    #[serde(default = "default_thread_language")]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct SaveScenarioMessagesResponse {
    pub success: bool,
    pub conversation_id: String,
    pub message_count: usize,
}

/// Starts a new thread and writes the messages into it.
pub async fn save_scenario_messages(
    State(state): State<AppState>,
    Json(req): Json<SaveScenarioMessagesRequest>,
) -> ApiResult<Json<SaveScenarioMessagesResponse>> {
    req.validate()?;
    let store = state.profiles.store();
    let conversation = store.create_scenario_conversation(
        req.username.trim(),
        req.scenario_title.trim(),
        req.is_custom_scenario,
        &language::normalize(&req.language),
    )?;

    for message in &req.messages {
        store.insert_scenario_message(&conversation.id, message)?;
    }
    info!(
        "Saved {} messages to scenario thread {} for {}",
        req.messages.len(),
        conversation.id,
        conversation.username
    );

    Ok(Json(SaveScenarioMessagesResponse {
        success: true,
        conversation_id: conversation.id,
        message_count: req.messages.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ScenarioConversationsResponse {
    pub conversations: Vec<ScenarioThread>,
}

pub async fn get_scenario_conversations(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<ScenarioConversationsResponse>> {
    query.validate()?;
    let conversations = state.profiles.store().list_scenario_conversations(query.username.trim())?;
    Ok(Json(ScenarioConversationsResponse { conversations }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteScenarioConversationRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub conversation_id: String,
}

/// Soft delete; the thread stops being listed or reused.
pub async fn delete_scenario_conversation(
    State(state): State<AppState>,
    Json(req): Json<DeleteScenarioConversationRequest>,
) -> ApiResult<Json<StatusResponse>> {
    req.validate()?;
    let deleted = state
        .profiles
        .store()
        .soft_delete_scenario_conversation(req.username.trim(), req.conversation_id.trim())?;
    if !deleted {
        return Err(ApiError::NotFound(
            "Conversation not found or you don't have permission to delete it".to_string(),
        ));
    }
    Ok(Json(StatusResponse::ok("Conversation deleted successfully")))
}
