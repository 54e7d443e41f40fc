//! Suggestions, lessons, translation, pronunciation practice and speech

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::{non_blank, not_blank};
use crate::error::{ApiError, ApiResult, SpeechError};
use crate::language;
use crate::speech::{self, SpeechSynthesizer};
use crate::shared_state::AppState;
use crate::tutor::{Difficulty, LessonPlan};

#[derive(Debug, Deserialize, Validate)]
pub struct SuggestionRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Takes precedence over `language`.
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
}

pub async fn get_suggestions(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> ApiResult<Json<SuggestionResponse>> {
    req.validate()?;
    let requested = non_blank(req.locale.as_deref()).or_else(|| non_blank(req.language.as_deref()));
    let suggestions = state.tutor.suggestions(req.username.trim(), requested).await;
    Ok(Json(SuggestionResponse { suggestions }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LessonRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub async fn get_lessons(
    State(state): State<AppState>,
    Json(req): Json<LessonRequest>,
) -> ApiResult<Json<LessonPlan>> {
    req.validate()?;
    let plan = state
        .tutor
        .lessons(req.username.trim(), non_blank(req.language.as_deref()))
        .await;
    Ok(Json(plan))
}

fn default_source() -> String {
    "auto".to_string()
}

fn default_target() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct TranslateRequest {
    #[validate(custom = "not_blank")]
    pub text: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_target")]
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source: String,
    pub target: String,
}

pub async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> ApiResult<Json<TranslateResponse>> {
    req.validate()?;
    let translated_text = state
        .tutor
        .exercises()
        .translate(&req.text, &req.source, &req.target)
        .await
        .map_err(|e| ApiError::Upstream(format!("Translation failed: {}", e)))?;

    Ok(Json(TranslateResponse {
        translated_text,
        source: req.source,
        target: req.target,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PracticeSentenceRequest {
    #[validate(custom = "not_blank")]
    pub language: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PracticeSentence {
    pub text: String,
    pub difficulty: Difficulty,
    pub audio_url: Option<String>,
}

/// A word or sentence to read aloud, voiced when speech is enabled. Single
/// words are spoken twice.
pub async fn generate_practice_sentence(
    State(state): State<AppState>,
    Json(req): Json<PracticeSentenceRequest>,
) -> ApiResult<Json<PracticeSentence>> {
    req.validate()?;
    let language_code = language::normalize(&req.language);
    if let Some(username) = non_blank(req.username.as_deref()) {
        info!("Practice {} text for {} in {}", req.difficulty.as_str(), username, language_code);
    }

    let text = state
        .tutor
        .exercises()
        .practice_text(&language_code, req.difficulty)
        .await;
    let voiced = match req.difficulty {
        Difficulty::Easy => format!("{}. {}", text, text),
        _ => text.clone(),
    };
    let audio_url = speech::voice_reply(state.speech.as_ref(), &voiced, &language_code).await;

    Ok(Json(PracticeSentence {
        text,
        difficulty: req.difficulty,
        audio_url,
    }))
}

fn default_language() -> String {
    "en".to_string()
}

fn default_word_level() -> u8 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct VariedWordRequest {
    #[serde(default = "default_language")]
    pub language: String,
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_word_level")]
    pub difficulty_level: u8,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub avoid_words: Vec<String>,
}

/// Vocabulary drill word. Never fails; offline words stand in for the model.
pub async fn generate_varied_word(
    State(state): State<AppState>,
    Json(req): Json<VariedWordRequest>,
) -> ApiResult<Json<PracticeSentence>> {
    req.validate()?;
    let language_code = language::normalize(&req.language);
    let text = state
        .tutor
        .exercises()
        .varied_word(&language_code, req.difficulty_level, req.seed, &req.avoid_words)
        .await;

    Ok(Json(PracticeSentence {
        text,
        difficulty: Difficulty::Easy,
        audio_url: None,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateAudioRequest {
    #[validate(custom = "not_blank")]
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateAudioResponse {
    pub audio_url: String,
}

/// Voices arbitrary text. Unlike chat replies, a failure here is reported.
pub async fn generate_audio(
    State(state): State<AppState>,
    Json(req): Json<GenerateAudioRequest>,
) -> ApiResult<Json<GenerateAudioResponse>> {
    req.validate()?;
    let language_code = language::normalize(&req.language);
    let audio_url = state
        .speech
        .synthesize(req.text.trim(), &language_code)
        .await
        .map_err(|e| match e {
            SpeechError::Disabled => ApiError::Unavailable("Speech synthesis is disabled".to_string()),
            other => ApiError::Upstream(format!("Audio generation failed: {}", other)),
        })?;

    info!("Generated audio {} for {} chars", audio_url, req.text.chars().count());
    Ok(Json(GenerateAudioResponse { audio_url }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::phrasebook;
    use crate::testing::{create_test_app, create_test_app_with_speech, send, RecordingSpeech};
    use crate::tutor::Difficulty;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    // ===== Practice =====

    #[tokio::test]
    async fn test_practice_sentence_falls_back_and_voices_word_twice() {
        let speech = Arc::new(RecordingSpeech::default());
        let (_, app) = create_test_app_with_speech(&[], speech.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate_practice_sentence",
            Some(json!({"language": "Spanish", "difficulty": "easy"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = body["text"].as_str().unwrap().to_string();
        assert!(phrasebook::practice_fallback("es", Difficulty::Easy).contains(&text.as_str()));
        assert_eq!(body["difficulty"], "easy");
        assert_eq!(body["audio_url"], "/audio/test-1.mp3");
        assert_eq!(speech.spoken(), vec![(format!("{}. {}", text, text), "es".to_string())]);
    }

    #[tokio::test]
    async fn test_practice_sentence_without_speech_has_no_audio() {
        let (_, app) = create_test_app(&["Je voudrais un café, s'il vous plaît."]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate_practice_sentence",
            Some(json!({"language": "fr"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Je voudrais un café, s'il vous plaît.");
        assert_eq!(body["difficulty"], "medium");
        assert!(body["audio_url"].is_null());
    }

    // ===== Vocabulary =====

    #[tokio::test]
    async fn test_varied_word_cleans_model_answer_then_falls_back() {
        let (_, app) = create_test_app(&["  \"libro (book)\" "]);
        let request = json!({"language": "es", "difficulty_level": 2, "seed": 11, "avoid_words": ["casa"]});

        let (status, body) = send(&app, Method::POST, "/api/generate_varied_word", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "libro");
        assert_eq!(body["difficulty"], "easy");
        assert!(body["audio_url"].is_null());

        let (status, body) = send(&app, Method::POST, "/api/generate_varied_word", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        let word = body["text"].as_str().unwrap();
        assert!(phrasebook::vocabulary_fallback("es").contains(&word));
    }

    #[tokio::test]
    async fn test_varied_word_rejects_out_of_range_level() {
        let (_, app) = create_test_app(&[]);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/generate_varied_word",
            Some(json!({"language": "en", "difficulty_level": 11})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ===== Audio =====

    #[tokio::test]
    async fn test_generate_audio_reports_disabled_speech() {
        let (_, app) = create_test_app(&[]);
        let (status, body) = send(&app, Method::POST, "/api/generate_audio", Some(json!({"text": "Hallo"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("disabled"));

        let (status, _) = send(&app, Method::POST, "/api/generate_audio", Some(json!({"text": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_audio_returns_reference() {
        let speech = Arc::new(RecordingSpeech::default());
        let (_, app) = create_test_app_with_speech(&[], speech.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/generate_audio",
            Some(json!({"text": " Guten Morgen ", "language": "German"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["audio_url"], "/audio/test-1.mp3");
        assert_eq!(speech.spoken(), vec![("Guten Morgen".to_string(), "de".to_string())]);
    }
}
