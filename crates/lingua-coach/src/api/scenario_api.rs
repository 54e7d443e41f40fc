//! Scenario catalog, scenario selection and custom scenario management

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::profile_api::{StatusResponse, UsernameQuery};
use super::{non_blank, not_blank};
use crate::catalog::{self, ScenarioSummary};
use crate::conversation::{profile_language, ScenarioSelection};
use crate::error::{ApiError, ApiResult};
use crate::language;
use crate::profile_db::CustomScenario;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScenarioListQuery {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioListResponse {
    pub scenarios: Vec<ScenarioSummary>,
}

/// Built-in scenarios, followed by the user's own when a username is given.
pub async fn list_scenarios(
    State(state): State<AppState>,
    Query(query): Query<ScenarioListQuery>,
) -> ApiResult<Json<ScenarioListResponse>> {
    let language_code = language::normalize_opt(non_blank(query.language.as_deref()));
    let mut scenarios = catalog::summaries(&language_code);

    if let Some(username) = non_blank(query.username.as_deref()) {
        let profile = state.profiles.store().load(username)?;
        scenarios.extend(profile.custom_scenarios.into_iter().map(|c| ScenarioSummary {
            id: c.id,
            title: c.title,
            description: c.description,
            role: c.role,
            custom: true,
        }));
    }
    Ok(Json(ScenarioListResponse { scenarios }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetScenarioRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    pub scenario: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub async fn set_scenario(
    State(state): State<AppState>,
    Json(req): Json<SetScenarioRequest>,
) -> ApiResult<Json<ScenarioSelection>> {
    req.validate()?;
    let selection = state
        .session
        .set_scenario(req.username.trim(), &req.scenario, non_blank(req.language.as_deref()))
        .await;
    Ok(Json(selection))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScenarioRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// `custom_<unix seconds>_<8 hex>`
pub fn generate_scenario_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("custom_{}_{}", Utc::now().timestamp(), &suffix[..8])
}

/// Creates a custom scenario with an inferred role. Titles are unique per
/// user, ignoring case.
pub async fn create_scenario(
    State(state): State<AppState>,
    Json(req): Json<CreateScenarioRequest>,
) -> ApiResult<Json<CustomScenario>> {
    req.validate()?;
    let username = req.username.trim();
    let title = req.title.trim();

    let store = state.profiles.store();
    if store.count_custom_scenarios_by_title(username, title)? > 0 {
        return Err(ApiError::Conflict(format!("A scenario titled '{}' already exists", title)));
    }

    let language_code = match non_blank(req.language.as_deref()) {
        Some(requested) => language::normalize(requested),
        None => profile_language(&state.profiles.load(username)),
    };
    let role = state.session.replies().infer_role(title, &language_code).await;

    let scenario = CustomScenario {
        id: generate_scenario_id(),
        title: title.to_string(),
        description: req.description.trim().to_string(),
        role,
        created_at: Utc::now(),
    };
    store.add_custom_scenario(username, &scenario)?;
    info!("Custom scenario '{}' created for {} with role '{}'", scenario.title, username, scenario.role);
    Ok(Json(scenario))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckScenarioRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CheckScenarioResponse {
    pub exists: bool,
    pub count: usize,
}

pub async fn check_existing_scenario(
    State(state): State<AppState>,
    Json(req): Json<CheckScenarioRequest>,
) -> ApiResult<Json<CheckScenarioResponse>> {
    req.validate()?;
    let count = state
        .profiles
        .store()
        .count_custom_scenarios_by_title(req.username.trim(), req.title.trim())?;
    Ok(Json(CheckScenarioResponse { exists: count > 0, count }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteScenarioRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub scenario_id: String,
}

pub async fn delete_custom_scenario(
    State(state): State<AppState>,
    Json(req): Json<DeleteScenarioRequest>,
) -> ApiResult<Json<StatusResponse>> {
    req.validate()?;
    let username = req.username.trim();
    if !state.profiles.store().delete_custom_scenario(username, &req.scenario_id)? {
        return Err(ApiError::NotFound(format!(
            "Scenario {} not found for user {}",
            req.scenario_id, username
        )));
    }
    Ok(Json(StatusResponse::ok(format!("Scenario {} deleted successfully", req.scenario_id))))
}

#[derive(Debug, Serialize)]
pub struct UserScenariosResponse {
    pub scenarios: Vec<CustomScenario>,
}

pub async fn user_scenarios(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<UserScenariosResponse>> {
    query.validate()?;
    let profile = state.profiles.store().load(query.username.trim())?;
    Ok(Json(UserScenariosResponse { scenarios: profile.custom_scenarios }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_id_format() {
        let id = generate_scenario_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "custom");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
