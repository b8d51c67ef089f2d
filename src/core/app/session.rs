use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::api::ChatMessage;
use crate::core::chat_stream::StreamParams;
use crate::core::chord::KeyChord;
use crate::core::config::{Config, ConfigError};
use crate::core::constants::{API_KEY_ENV_VARS, BASE_URL_ENV_VAR};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

pub struct SessionContext {
    pub client: Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub user_name: String,
    pub reveal_speed_ms: i64,
    pub explain_chord: KeyChord,
    last_stream_id: u64,
}

/// The first non-empty API key among the supported environment variables.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

impl SessionContext {
    /// Resolve settings with the precedence flag > environment > config file
    /// > built-in default.
    pub fn resolve(
        config: &Config,
        overrides: SessionOverrides,
        api_key: String,
    ) -> Result<Self, ConfigError> {
        let base_url = overrides
            .base_url
            .or_else(|| std::env::var(BASE_URL_ENV_VAR).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| config.base_url().to_string());
        let model = overrides
            .model
            .unwrap_or_else(|| config.model().to_string());

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
            model,
            temperature: config.temperature(),
            user_name: config.user_name().to_string(),
            reveal_speed_ms: config.reveal_speed_ms(),
            explain_chord: config.explain_chord()?,
            last_stream_id: 0,
        })
    }

    /// Stream ids are never reused within a session.
    pub fn allocate_stream_id(&mut self) -> u64 {
        self.last_stream_id += 1;
        self.last_stream_id
    }

    pub fn stream_params(
        &self,
        conversation_id: &str,
        api_messages: Vec<ChatMessage>,
        cancel_token: CancellationToken,
        stream_id: u64,
    ) -> StreamParams {
        StreamParams {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: Some(self.temperature),
            conversation_id: conversation_id.to_string(),
            api_messages,
            cancel_token,
            stream_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigKey;

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.set(ConfigKey::Model, "from-config").unwrap();
        config.set(ConfigKey::BaseUrl, "https://config.example/v1").unwrap();

        let session = SessionContext::resolve(
            &config,
            SessionOverrides {
                model: Some("from-flag".into()),
                base_url: Some("https://flag.example/v1".into()),
            },
            "key".into(),
        )
        .unwrap();
        assert_eq!(session.model, "from-flag");
        assert_eq!(session.base_url, "https://flag.example/v1");
        assert_eq!(session.temperature, 0.7);
    }

    #[test]
    fn invalid_chord_in_config_is_reported() {
        let config = Config {
            explain_chord: Some("super+e".into()),
            ..Default::default()
        };
        let result = SessionContext::resolve(&config, SessionOverrides::default(), "k".into());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn stream_ids_increase() {
        let mut session =
            SessionContext::resolve(&Config::default(), SessionOverrides::default(), "k".into())
                .unwrap();
        assert_eq!(session.allocate_stream_id(), 1);
        assert_eq!(session.allocate_stream_id(), 2);
    }
}
