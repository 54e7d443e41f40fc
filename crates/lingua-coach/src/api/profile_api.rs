//! Profile lifecycle endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::{non_blank, not_blank};
use crate::conversation::profile_language;
use crate::error::{ApiError, ApiResult};
use crate::language;
use crate::profile_db::{ChatEntry, CustomScenario, Preferences, UserProfile};
use crate::shared_state::AppState;

/// Client view of a profile. Discarded entries are left out.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub language: String,
    pub locale: String,
    pub scenario: Option<String>,
    pub ai_role: String,
    pub chat_history: Vec<ChatEntry>,
    pub custom_scenarios: Vec<CustomScenario>,
    pub lessons: Vec<String>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileView {
    fn from(profile: UserProfile) -> Self {
        Self {
            chat_history: profile.active_history().cloned().collect(),
            username: profile.username,
            language: profile.language,
            locale: profile.locale,
            scenario: profile.scenario,
            ai_role: profile.ai_role,
            custom_scenarios: profile.custom_scenarios,
            lessons: profile.lessons,
            preferences: profile.preferences,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UsernameQuery {
    #[validate(custom = "not_blank")]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InitProfileRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitProfileResponse {
    pub success: bool,
    pub message: String,
    pub profile: ProfileView,
}

/// Loads the profile, creating it on first reference. A scenario goes
/// through the normal selection flow so its role is resolved.
pub async fn init_user_profile(
    State(state): State<AppState>,
    Json(req): Json<InitProfileRequest>,
) -> ApiResult<Json<InitProfileResponse>> {
    req.validate()?;
    let username = req.username.trim();
    let requested_language = non_blank(req.language.as_deref());

    let mut profile = state.profiles.store().load(username)?;
    let message = match non_blank(req.scenario.as_deref()) {
        Some(scenario) => {
            state.session.set_scenario(username, scenario, requested_language).await;
            profile = state.profiles.store().load(username)?;
            "User profile updated"
        }
        None => match requested_language.map(language::normalize) {
            Some(code) if profile.language != code || profile.locale != code => {
                profile.set_language(&code);
                state.profiles.store().save(&mut profile)?;
                "User profile updated"
            }
            _ => "User profile ready",
        },
    };

    info!("Initialized profile for {}", username);
    Ok(Json(InitProfileResponse {
        success: true,
        message: message.to_string(),
        profile: profile.into(),
    }))
}

pub async fn get_user_profile(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<ProfileView>> {
    query.validate()?;
    let profile = state.profiles.store().load(query.username.trim())?;
    Ok(Json(profile.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetProfileRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub ai_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}

/// Language and locale are written together; a locale wins over a
/// language name when both are sent. A new scenario without an explicit
/// role gets its role resolved like `set_scenario` does.
pub async fn set_user_profile(
    State(state): State<AppState>,
    Json(req): Json<SetProfileRequest>,
) -> ApiResult<Json<StatusResponse>> {
    req.validate()?;
    let mut profile = state.profiles.store().load(req.username.trim())?;

    if let Some(requested) = non_blank(req.locale.as_deref()).or_else(|| non_blank(req.language.as_deref())) {
        profile.set_language(&language::normalize(requested));
    }
    let ai_role = non_blank(req.ai_role.as_deref());
    if let Some(scenario) = non_blank(req.scenario.as_deref()) {
        if ai_role.is_none() && profile.scenario.as_deref() != Some(scenario) {
            let language_code = profile_language(&profile);
            profile.ai_role = state.session.role_for(&profile, scenario, &language_code).await;
        }
        profile.scenario = Some(scenario.to_string());
    }
    if let Some(ai_role) = ai_role {
        profile.ai_role = ai_role.to_string();
    }

    state.profiles.store().save(&mut profile)?;
    info!("Updated profile for {}", profile.username);
    Ok(Json(StatusResponse::ok("User profile updated")))
}

/// Removes the profile with its history, custom scenarios and threads.
pub async fn delete_user_profile(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<StatusResponse>> {
    query.validate()?;
    let username = query.username.trim();
    if !state.profiles.store().delete_profile(username)? {
        return Err(ApiError::NotFound(format!("User profile not found for {}", username)));
    }
    info!("Deleted profile {}", username);
    Ok(Json(StatusResponse::ok(format!("Deleted profile {}", username))))
}
