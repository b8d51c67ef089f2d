use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::chord::KeyChord;
use crate::core::config::io::ConfigError;
use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_EXPLAIN_CHORD, DEFAULT_MODEL, DEFAULT_REVEAL_SPEED_MS,
    DEFAULT_TEMPERATURE, DEFAULT_USER_NAME,
};
use crate::ui::theme::ThemeKind;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Name used in the empty-conversation greeting
    pub user_name: Option<String>,
    /// Milliseconds per revealed character; zero disables the animation
    pub reveal_speed_ms: Option<i64>,
    /// Chord that opens and closes the side chat (e.g. "ctrl+shift+e")
    pub explain_chord: Option<String>,
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
    /// Where to write diagnostic logs; nothing is logged when unset
    pub log_file: Option<PathBuf>,
}

/// Keys accepted by `sidenote set` and `sidenote unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BaseUrl,
    Model,
    Temperature,
    UserName,
    RevealSpeedMs,
    ExplainChord,
    Theme,
    LogFile,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 8] = [
        ConfigKey::BaseUrl,
        ConfigKey::Model,
        ConfigKey::Temperature,
        ConfigKey::UserName,
        ConfigKey::RevealSpeedMs,
        ConfigKey::ExplainChord,
        ConfigKey::Theme,
        ConfigKey::LogFile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::Model => "model",
            ConfigKey::Temperature => "temperature",
            ConfigKey::UserName => "user-name",
            ConfigKey::RevealSpeedMs => "reveal-speed-ms",
            ConfigKey::ExplainChord => "explain-chord",
            ConfigKey::Theme => "theme",
            ConfigKey::LogFile => "log-file",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-").to_ascii_lowercase();
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

fn invalid(key: ConfigKey, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.as_str(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(DEFAULT_USER_NAME)
    }

    pub fn reveal_speed_ms(&self) -> i64 {
        self.reveal_speed_ms.unwrap_or(DEFAULT_REVEAL_SPEED_MS)
    }

    /// The configured chord. An unparsable value was already rejected by
    /// `set`, but a hand-edited file may still carry one.
    pub fn explain_chord(&self) -> Result<KeyChord, ConfigError> {
        let raw = self.explain_chord.as_deref().unwrap_or(DEFAULT_EXPLAIN_CHORD);
        KeyChord::parse(raw).map_err(|err| invalid(ConfigKey::ExplainChord, raw, err.to_string()))
    }

    pub fn theme(&self) -> ThemeKind {
        self.theme
            .as_deref()
            .and_then(ThemeKind::parse)
            .unwrap_or_default()
    }

    /// Validate and store `value` under `key`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid(key, value, "value is empty"));
        }
        match key {
            ConfigKey::BaseUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid(key, value, "expected an http(s) URL"));
                }
                self.base_url = Some(value.to_string());
            }
            ConfigKey::Model => self.model = Some(value.to_string()),
            ConfigKey::Temperature => {
                let parsed: f32 = value
                    .parse()
                    .map_err(|_| invalid(key, value, "expected a number"))?;
                if !(0.0..=2.0).contains(&parsed) {
                    return Err(invalid(key, value, "expected a value between 0 and 2"));
                }
                self.temperature = Some(parsed);
            }
            ConfigKey::UserName => self.user_name = Some(value.to_string()),
            ConfigKey::RevealSpeedMs => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| invalid(key, value, "expected whole milliseconds"))?;
                self.reveal_speed_ms = Some(parsed.max(0));
            }
            ConfigKey::ExplainChord => {
                KeyChord::parse(value).map_err(|err| invalid(key, value, err.to_string()))?;
                self.explain_chord = Some(value.to_ascii_lowercase());
            }
            ConfigKey::Theme => {
                let theme = ThemeKind::parse(value)
                    .ok_or_else(|| invalid(key, value, "expected \"dark\" or \"light\""))?;
                self.theme = Some(theme.as_str().to_string());
            }
            ConfigKey::LogFile => self.log_file = Some(PathBuf::from(value)),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::Model => self.model = None,
            ConfigKey::Temperature => self.temperature = None,
            ConfigKey::UserName => self.user_name = None,
            ConfigKey::RevealSpeedMs => self.reveal_speed_ms = None,
            ConfigKey::ExplainChord => self.explain_chord = None,
            ConfigKey::Theme => self.theme = None,
            ConfigKey::LogFile => self.log_file = None,
        }
    }

    /// The stored value for `key`, if any, formatted for display.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::BaseUrl => self.base_url.clone(),
            ConfigKey::Model => self.model.clone(),
            ConfigKey::Temperature => self.temperature.map(|t| t.to_string()),
            ConfigKey::UserName => self.user_name.clone(),
            ConfigKey::RevealSpeedMs => self.reveal_speed_ms.map(|ms| ms.to_string()),
            ConfigKey::ExplainChord => self.explain_chord.clone(),
            ConfigKey::Theme => self.theme.clone(),
            ConfigKey::LogFile => self.log_file.as_ref().map(path_display),
        }
    }
}
