// lingua-coach/crates/lingua-coach/src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    /// Allowed CORS origin; `*` allows any.
    pub client_url: String,
    pub database_path: PathBuf,
    pub db_pool_size: u32,
    pub completion_base_url: String,
    pub completion_api_key: Option<String>,
    pub chat_model: String,
    pub utility_model: String,
    pub completion_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub max_body_bytes: usize,
    pub tts_enabled: bool,
    pub tts_base_url: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub audio_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Missing keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let completion_base_url = var("COMPLETION_BASE_URL", "https://api.openai.com");
        let completion_api_key = lookup("COMPLETION_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            api_host: var("API_HOST", "127.0.0.1"),
            api_port: var("API_PORT", "8000").parse().context("API_PORT must be a port number")?,
            client_url: var("CLIENT_URL", "http://localhost:3000"),
            database_path: PathBuf::from(var("DATABASE_PATH", "./data/lingua_coach.db")),
            db_pool_size: var("DB_POOL_SIZE", "10").parse().context("DB_POOL_SIZE must be a number")?,
            tts_base_url: lookup("TTS_BASE_URL").unwrap_or_else(|| completion_base_url.clone()),
            completion_base_url,
            completion_api_key,
            chat_model: var("CHAT_MODEL", "gpt-4"),
            utility_model: var("UTILITY_MODEL", "gpt-3.5-turbo"),
            completion_timeout_seconds: var("COMPLETION_TIMEOUT_SECONDS", "60")
                .parse()
                .context("COMPLETION_TIMEOUT_SECONDS must be a number")?,
            request_timeout_seconds: var("REQUEST_TIMEOUT_SECONDS", "120")
                .parse()
                .context("REQUEST_TIMEOUT_SECONDS must be a number")?,
            max_body_bytes: var("MAX_BODY_BYTES", "1048576")
                .parse()
                .context("MAX_BODY_BYTES must be a number")?,
            tts_enabled: parse_flag(&var("TTS_ENABLED", "false")),
            tts_model: var("TTS_MODEL", "tts-1"),
            tts_voice: var("TTS_VOICE", "alloy"),
            audio_dir: PathBuf::from(var("AUDIO_DIR", "./sound_responses")),
        })
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .with_context(|| format!("Invalid API address {}:{}", self.api_host, self.api_port))
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn print_config(&self) {
        info!("Configuration:");
        info!("  API: {}:{}", self.api_host, self.api_port);
        info!("  Client URL: {}", self.client_url);
        info!("  Database: {} (pool size {})", self.database_path.display(), self.db_pool_size);
        info!("  Completion backend: {}", self.completion_base_url);
        info!("  Completion API key: {}", mask_secret(self.completion_api_key.as_deref()));
        info!("  Models: chat={}, utility={}", self.chat_model, self.utility_model);
        info!(
            "  Timeouts: completion={}s, request={}s",
            self.completion_timeout_seconds, self.request_timeout_seconds
        );
        info!("  Max body: {} bytes", self.max_body_bytes);
        if self.tts_enabled {
            info!(
                "  Speech: {} model={} voice={} dir={}",
                self.tts_base_url,
                self.tts_model,
                self.tts_voice,
                self.audio_dir.display()
            );
        } else {
            info!("  Speech: disabled");
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        None => "<not set>".to_string(),
        Some(s) if s.chars().count() <= 8 => "****".to_string(),
        Some(s) => {
            let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.client_url, "http://localhost:3000");
        assert_eq!(config.chat_model, "gpt-4");
        assert_eq!(config.utility_model, "gpt-3.5-turbo");
        assert_eq!(config.max_body_bytes, 1_048_576);
        assert!(!config.tts_enabled);
        assert_eq!(config.tts_base_url, config.completion_base_url);
        assert!(config.completion_api_key.is_none());
        assert_eq!(config.api_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_overrides_and_key_fallback() {
        let config = config_from(&[
            ("API_PORT", "9100"),
            ("OPENAI_API_KEY", "sk-test-123456789"),
            ("COMPLETION_BASE_URL", "http://localhost:11434"),
            ("TTS_ENABLED", "TRUE"),
        ])
        .unwrap();
        assert_eq!(config.api_port, 9100);
        assert_eq!(config.completion_api_key.as_deref(), Some("sk-test-123456789"));
        assert_eq!(config.tts_base_url, "http://localhost:11434");
        assert!(config.tts_enabled);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(config_from(&[("API_PORT", "eighty")]).is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(None), "<not set>");
        assert_eq!(mask_secret(Some("short")), "****");
        assert_eq!(mask_secret(Some("sk-abcdefgh1234")), "****1234");
    }
}
