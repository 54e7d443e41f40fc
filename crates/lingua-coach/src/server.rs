//! HTTP server
//!
//! Handlers share one [`AppState`]; every engine call happens inside the
//! request's own task. The only network calls leave through the completion
//! and speech clients.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::api::{chat_api, health_api, history_api, profile_api, scenario_api, tutor_api};
use crate::config::Config;
use crate::metrics;
use crate::profile_db::{ProfileStore, SqliteProfileStore};
use crate::shared_state::AppState;
use crate::speech::AUDIO_ROUTE;

/// Opens the configured database, falling back to an in-memory store when
/// the file cannot be used.
pub fn open_profile_store(config: &Config) -> anyhow::Result<Arc<dyn ProfileStore>> {
    match SqliteProfileStore::new(&config.database_path, config.db_pool_size) {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) => {
            warn!(
                "Failed to open profile database at {}: {}. Falling back to in-memory.",
                config.database_path.display(),
                e
            );
            let store = SqliteProfileStore::new_in_memory().context("Failed to create in-memory profile store")?;
            Ok(Arc::new(store))
        }
    }
}

/// Serves `state` on the configured address until the listener fails.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    config.print_config();

    if config.tts_enabled {
        tokio::fs::create_dir_all(&config.audio_dir)
            .await
            .with_context(|| format!("Failed to create audio directory {}", config.audio_dir.display()))?;
    }

    let addr = config.api_addr()?;
    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route("/api/health_check", get(health_api::health_check))
        // Profiles
        .route("/api/init_user_profile", post(profile_api::init_user_profile))
        .route(
            "/api/user_profile",
            get(profile_api::get_user_profile).delete(profile_api::delete_user_profile),
        )
        .route("/api/set_user_profile", post(profile_api::set_user_profile))
        // Chat
        .route("/api/chat", post(chat_api::chat))
        .route("/api/get_scenario_response", post(chat_api::get_scenario_response))
        // Scenarios
        .route("/api/scenarios", get(scenario_api::list_scenarios))
        .route("/api/set_scenario", post(scenario_api::set_scenario))
        .route("/api/create_scenario", post(scenario_api::create_scenario))
        .route("/api/check_existing_scenario", post(scenario_api::check_existing_scenario))
        .route("/api/delete_custom_scenario", post(scenario_api::delete_custom_scenario))
        .route("/api/user_scenarios", get(scenario_api::user_scenarios))
        // Tutor
        .route("/api/get_suggestions", post(tutor_api::get_suggestions))
        .route("/api/get_lessons", post(tutor_api::get_lessons))
        .route("/api/translate", post(tutor_api::translate))
        .route("/api/generate_practice_sentence", post(tutor_api::generate_practice_sentence))
        .route("/api/generate_varied_word", post(tutor_api::generate_varied_word))
        .route("/api/generate_audio", post(tutor_api::generate_audio))
        // History
        .route("/api/conversation_history", get(history_api::conversation_history))
        .route("/api/save_conversation", post(history_api::save_conversation))
        .route("/api/clear_conversation", post(history_api::clear_conversation))
        .route("/api/delete_chat_message", post(history_api::delete_chat_message))
        .route("/api/discard_by_batchid", post(history_api::discard_by_batchid))
        .route("/api/save_scenario_messages", post(history_api::save_scenario_messages))
        .route("/api/get_scenario_conversations", get(history_api::get_scenario_conversations))
        .route("/api/delete_scenario_conversation", post(history_api::delete_scenario_conversation))
        .route_layer(middleware::from_fn(track_requests));

    Router::new()
        .route("/", get(health_api::root))
        .route("/healthz", get(|| async { "OK" }))
        .route("/metrics", get(metrics::get_metrics))
        .merge(api)
        .nest_service(AUDIO_ROUTE, ServeDir::new(&config.audio_dir))
        .layer(cors_layer(&config.client_url))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}

fn cors_layer(client_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let origin = client_url.trim();
    if origin == "*" {
        return cors.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => cors.allow_origin(value),
        Err(e) => {
            warn!("Invalid CLIENT_URL '{}': {}. Allowing any origin.", origin, e);
            cors.allow_origin(Any)
        }
    }
}

async fn track_requests(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    metrics::inc_request(&route, response.status().as_str());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_test_app, send};
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn test_open_profile_store_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(|key| match key {
            "DATABASE_PATH" => Some(dir.path().join("nested/profiles.db").to_string_lossy().to_string()),
            _ => None,
        })
        .unwrap();

        let store = open_profile_store(&config).unwrap();
        assert!(store.ping().is_ok());
        assert!(dir.path().join("nested/profiles.db").exists());
    }

    // ===== Liveness =====

    #[tokio::test]
    async fn test_healthz_and_health_check() {
        let (_, app) = create_test_app(&[]);

        let response = app
            .clone()
            .oneshot(axum::http::Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/api/health_check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_renders() {
        metrics::init_metrics();
        let (_, app) = create_test_app(&[]);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // ===== Chat =====

    #[tokio::test]
    async fn test_chat_rejects_blank_username() {
        let (_, app) = create_test_app(&["Hello!"]);
        let (status, body) = send(&app, Method::POST, "/api/chat", Some(json!({"username": "  ", "message": "Hi"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_chat_turn_is_saved_and_listed() {
        let (_, app) = create_test_app(&["Hello! How are you today?"]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(json!({"username": "ana", "message": "Hi", "scenario": "Language Practice", "language": "en"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello! How are you today?");
        assert_eq!(body["is_roleplay"], false);
        assert_eq!(body["saved"], true);
        assert!(body["audio_url"].is_null());
        let conversation_id = body["conversation_id"].as_str().unwrap().to_string();

        let (status, history) = send(
            &app,
            Method::GET,
            &format!("/api/conversation_history?username=ana&conversation_id={}", conversation_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entries = history["chat_history"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["conversation_id"], conversation_id.as_str());
    }

    // ===== Scenarios =====

    #[tokio::test]
    async fn test_create_scenario_rejects_duplicate_title() {
        let (store, app) = create_test_app(&["A baker"]);
        let request = json!({"username": "ana", "title": "Bakery Visit", "description": "Buying bread"});

        let (status, created) = send(&app, Method::POST, "/api/create_scenario", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["role"], "A baker");
        assert!(created["id"].as_str().unwrap().starts_with("custom_"));

        let duplicate = json!({"username": "ana", "title": "bakery visit"});
        let (status, _) = send(&app, Method::POST, "/api/create_scenario", Some(duplicate)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(store.load("ana").unwrap().custom_scenarios.len(), 1);

        let (_, listed) = send(&app, Method::GET, "/api/scenarios?username=ana", None).await;
        let scenarios = listed["scenarios"].as_array().unwrap();
        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[3]["custom"], true);
    }

    #[tokio::test]
    async fn test_delete_missing_custom_scenario_is_not_found() {
        let (_, app) = create_test_app(&[]);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/delete_custom_scenario",
            Some(json!({"username": "ana", "scenario_id": "custom_1_deadbeef"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ===== History =====

    #[tokio::test]
    async fn test_save_then_clear_conversation() {
        let (store, app) = create_test_app(&[]);
        let (status, saved) = send(
            &app,
            Method::POST,
            "/api/save_conversation",
            Some(json!({
                "username": "ana",
                "batch_id": "b1",
                "conversation": [
                    {"user": "Hola", "ai": "¡Hola!"},
                    {"user": "AI INITIATED", "ai": "¿Qué tal?"}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["batch_id"], "b1");

        let (status, cleared) = send(
            &app,
            Method::POST,
            "/api/clear_conversation",
            Some(json!({"username": "ana", "batch_id": "b1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["action"], "discard");
        assert_eq!(cleared["marked_count"], 2);

        let profile = store.load("ana").unwrap();
        assert_eq!(profile.chat_history.len(), 2);
        assert!(profile.chat_history.iter().all(|e| e.is_discarded));
        assert!(profile.preferences.discard_conversation);
        assert_eq!(profile.chat_history[1].user_text(), None);
    }

    #[tokio::test]
    async fn test_delete_chat_message_without_history() {
        let (_, app) = create_test_app(&[]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/delete_chat_message",
            Some(json!({"username": "ana", "batch_id": "b1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_scenario_threads_round_trip() {
        let (_, app) = create_test_app(&[]);
        let (status, saved) = send(
            &app,
            Method::POST,
            "/api/save_scenario_messages",
            Some(json!({
                "username": "ana",
                "scenario_title": "Travel",
                "messages": [
                    {"text": "Welcome aboard!", "sender": "assistant", "timestamp": "2024-05-01T10:00:00Z"},
                    {"text": "Thanks!", "sender": "user", "timestamp": "2024-05-01T10:00:05Z"}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["message_count"], 2);
        let conversation_id = saved["conversation_id"].as_str().unwrap().to_string();

        let (_, listed) = send(&app, Method::GET, "/api/get_scenario_conversations?username=ana", None).await;
        let threads = listed["conversations"].as_array().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0]["messages"][0]["text"], "Welcome aboard!");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/delete_scenario_conversation",
            Some(json!({"username": "ana", "conversation_id": conversation_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = send(&app, Method::GET, "/api/get_scenario_conversations?username=ana", None).await;
        assert!(listed["conversations"].as_array().unwrap().is_empty());
    }

    // ===== Tutor =====

    #[tokio::test]
    async fn test_translate_failure_is_bad_gateway() {
        let (_, app) = create_test_app(&[]);
        let (status, body) = send(&app, Method::POST, "/api/translate", Some(json!({"text": "Hola"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("Translation failed"));
    }

    #[tokio::test]
    async fn test_suggestions_without_history_use_defaults() {
        let (_, app) = create_test_app(&[]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/get_suggestions",
            Some(json!({"username": "ana", "language": "ja"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
    }
}
