//! Chat turns and scenario openers

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::{default_true, non_blank, not_blank};
use crate::conversation::{ChatTurn, ChatTurnResult, ScenarioOpening};
use crate::error::ApiResult;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub message: String,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub response_locale: Option<String>,
    #[serde(default)]
    pub force_language: bool,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default = "default_true")]
    pub save_to_history: bool,
    #[serde(default)]
    pub is_discarded: bool,
}

impl From<ChatRequest> for ChatTurn {
    fn from(req: ChatRequest) -> Self {
        ChatTurn {
            scenario: req.scenario,
            language: req.language,
            response_locale: req.response_locale,
            force_language: req.force_language,
            conversation_id: req.conversation_id,
            save_to_history: req.save_to_history,
            is_discarded: req.is_discarded,
            ..ChatTurn::new(req.username.trim(), req.message)
        }
    }
}

/// One chat turn. Upstream and storage failures degrade inside the turn, so
/// only validation can fail here.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> ApiResult<Json<ChatTurnResult>> {
    req.validate()?;
    let result = state.session.run_turn(req.into()).await;
    Ok(Json(result))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScenarioResponseRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub async fn get_scenario_response(
    State(state): State<AppState>,
    Json(req): Json<ScenarioResponseRequest>,
) -> ApiResult<Json<ScenarioOpening>> {
    req.validate()?;
    let username = req.username.trim();
    info!("Scenario opener requested by {}", username);
    let opening = state.session.scenario_opening(username, non_blank(req.language.as_deref())).await;
    Ok(Json(opening))
}
