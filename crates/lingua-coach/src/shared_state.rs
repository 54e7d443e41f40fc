//! Application state shared by every HTTP handler.
//!
//! Everything is behind `Arc` or is a cheap clone over `Arc`s, so handlers
//! receive their own copy per request without locking.

use std::sync::Arc;
use tracing::info;

use crate::completion::{CompletionClient, OpenAiCompatibleClient};
use crate::config::Config;
use crate::conversation::{ContextBuilder, ConversationSession, ReplyEngine};
use crate::profile_db::{ProfileService, ProfileStore};
use crate::speech::{DisabledSpeech, HttpSpeechSynthesizer, SpeechSynthesizer};
use crate::tutor::Tutor;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub profiles: ProfileService,
    pub session: ConversationSession,
    pub tutor: Tutor,
    pub completion: Arc<dyn CompletionClient>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Wires the engine from its collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn ProfileStore>,
        completion: Arc<dyn CompletionClient>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let profiles = ProfileService::new(store);
        let session = ConversationSession::new(
            profiles.clone(),
            ReplyEngine::new(completion.clone()),
            speech.clone(),
            ContextBuilder::default(),
        );
        let tutor = Tutor::new(profiles.clone(), completion.clone());

        Self {
            config: Arc::new(config),
            profiles,
            session,
            tutor,
            completion,
            speech,
        }
    }

    /// Builds the HTTP collaborators described by `config`.
    pub fn from_config(config: Config, store: Arc<dyn ProfileStore>) -> Self {
        let completion: Arc<dyn CompletionClient> = Arc::new(OpenAiCompatibleClient::new(
            config.completion_base_url.clone(),
            config.completion_api_key.clone(),
            config.chat_model.clone(),
            config.utility_model.clone(),
            config.completion_timeout(),
        ));

        let speech: Arc<dyn SpeechSynthesizer> = if config.tts_enabled {
            Arc::new(HttpSpeechSynthesizer::new(
                config.tts_base_url.clone(),
                config.completion_api_key.clone(),
                config.tts_model.clone(),
                config.tts_voice.clone(),
                config.audio_dir.clone(),
                config.completion_timeout(),
            ))
        } else {
            info!("Speech synthesis disabled");
            Arc::new(DisabledSpeech)
        };

        Self::new(config, store, completion, speech)
    }
}
