//! Test doubles and the router harness shared by unit tests across the crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::completion::{CompletionClient, CompletionRequest};
use crate::config::Config;
use crate::error::{CompletionError, SpeechError, StoreError, StoreResult};
use crate::profile_db::{
    ChatEntry, CustomScenario, NewScenarioMessage, ProfileStore, ScenarioConversation,
    ScenarioMessage, ScenarioThread, SqliteProfileStore, UserProfile,
};
use crate::server::build_router;
use crate::shared_state::AppState;
use crate::speech::{DisabledSpeech, SpeechSynthesizer, AUDIO_ROUTE};

/// Completion client that replays a fixed script and records every request.
/// Once the script runs out every call fails.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn upstream_error() -> CompletionError {
    CompletionError::Status { status: 503, body: "upstream unavailable".into() }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(upstream_error()))
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

fn offline<T>() -> StoreResult<T> {
    Err(StoreError::InvalidData("store offline".into()))
}

impl ProfileStore for FailingStore {
    fn load(&self, _username: &str) -> StoreResult<UserProfile> {
        offline()
    }

    fn save(&self, _profile: &mut UserProfile) -> StoreResult<()> {
        offline()
    }

    fn append_messages(
        &self,
        _username: &str,
        _entries: Vec<ChatEntry>,
        _batch_id: Option<&str>,
        _is_discarded: bool,
    ) -> StoreResult<String> {
        offline()
    }

    fn delete_profile(&self, _username: &str) -> StoreResult<bool> {
        offline()
    }

    fn add_custom_scenario(&self, _username: &str, _scenario: &CustomScenario) -> StoreResult<()> {
        offline()
    }

    fn count_custom_scenarios_by_title(&self, _username: &str, _title: &str) -> StoreResult<usize> {
        offline()
    }

    fn delete_custom_scenario(&self, _username: &str, _scenario_id: &str) -> StoreResult<bool> {
        offline()
    }

    fn find_scenario_conversation(
        &self,
        _username: &str,
        _scenario_title: &str,
    ) -> StoreResult<Option<ScenarioConversation>> {
        offline()
    }

    fn create_scenario_conversation(
        &self,
        _username: &str,
        _scenario_title: &str,
        _is_custom: bool,
        _language: &str,
    ) -> StoreResult<ScenarioConversation> {
        offline()
    }

    fn insert_scenario_message(
        &self,
        _conversation_id: &str,
        _message: &NewScenarioMessage,
    ) -> StoreResult<i64> {
        offline()
    }

    fn scenario_messages(&self, _conversation_id: &str) -> StoreResult<Vec<ScenarioMessage>> {
        offline()
    }

    fn list_scenario_conversations(&self, _username: &str) -> StoreResult<Vec<ScenarioThread>> {
        offline()
    }

    fn soft_delete_scenario_conversation(
        &self,
        _username: &str,
        _conversation_id: &str,
    ) -> StoreResult<bool> {
        offline()
    }

    fn ping(&self) -> StoreResult<()> {
        offline()
    }
}

/// Speech double that records every text it voices.
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<(String, String)>>,
}

impl RecordingSpeech {
    /// `(text, language_code)` pairs in call order.
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String, SpeechError> {
        let mut spoken = self.spoken.lock().unwrap();
        spoken.push((text.to_string(), language_code.to_string()));
        Ok(format!("{}/test-{}.mp3", AUDIO_ROUTE, spoken.len()))
    }
}

// ===== Router harness =====

pub fn create_test_config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

pub fn create_test_app_with_speech(
    replies: &[&str],
    speech: Arc<dyn SpeechSynthesizer>,
) -> (Arc<SqliteProfileStore>, Router) {
    let store = Arc::new(SqliteProfileStore::new_in_memory().unwrap());
    let state = AppState::new(
        create_test_config(),
        store.clone(),
        Arc::new(ScriptedCompletion::replies(replies)),
        speech,
    );
    (store, build_router(state))
}

/// Router over an in-memory store, scripted completions and no speech.
pub fn create_test_app(replies: &[&str]) -> (Arc<SqliteProfileStore>, Router) {
    create_test_app_with_speech(replies, Arc::new(DisabledSpeech))
}

/// Sends one request and returns the status with the JSON body (`Null` when
/// the body is not JSON).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Message;

    #[test]
    fn test_scripted_completion_replays_then_fails() {
        let client = ScriptedCompletion::replies(&["first"]);
        let request = CompletionRequest::new(vec![Message::user("hi")], 10, 0.5);

        let first = tokio_test::block_on(client.complete(request.clone()));
        assert_eq!(first.unwrap(), "first");

        let second = tokio_test::block_on(client.complete(request));
        assert!(second.is_err());
        assert_eq!(client.calls(), 2);
    }
}
