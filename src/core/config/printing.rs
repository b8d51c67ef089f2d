use crate::core::config::data::{Config, ConfigKey};

impl Config {
    /// One `key: value` line per setting, showing defaults for unset keys.
    pub fn summary_lines(&self) -> Vec<String> {
        ConfigKey::ALL
            .into_iter()
            .map(|key| match self.get(key) {
                Some(value) => format!("  {key}: {value}"),
                None => format!("  {key}: (unset, {})", self.default_label(key)),
            })
            .collect()
    }

    fn default_label(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::BaseUrl => format!("default {}", self.base_url()),
            ConfigKey::Model => format!("default {}", self.model()),
            ConfigKey::Temperature => format!("default {}", self.temperature()),
            ConfigKey::UserName => format!("default {}", self.user_name()),
            ConfigKey::RevealSpeedMs => format!("default {}", self.reveal_speed_ms()),
            ConfigKey::ExplainChord => match self.explain_chord() {
                Ok(chord) => format!("default {chord}"),
                Err(_) => "invalid".to_string(),
            },
            ConfigKey::Theme => format!("default {}", self.theme().as_str()),
            ConfigKey::LogFile => "logging disabled".to_string(),
        }
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.summary_lines() {
            println!("{line}");
        }
    }
}
