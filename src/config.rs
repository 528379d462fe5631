use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summarize::{DEFAULT_MODEL, DetailLevel};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const YOUTUBE_API_KEY_VAR: &str = "YOUTUBE_API_KEY";
const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub youtube_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub default_level: Option<DetailLevel>,
    pub timeout_secs: Option<u64>,
    pub concurrent_fetch: Option<bool>,
}

impl Config {
    /// Load config from ~/.config/vidsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Apply `YOUTUBE_API_KEY` / `GEMINI_API_KEY` from the environment over file values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = present(lookup(YOUTUBE_API_KEY_VAR)) {
            debug!("Using {YOUTUBE_API_KEY_VAR} from environment");
            self.youtube_api_key = Some(key);
        }
        if let Some(key) = present(lookup(GEMINI_API_KEY_VAR)) {
            debug!("Using {GEMINI_API_KEY_VAR} from environment");
            self.gemini_api_key = Some(key);
        }
        self
    }

    pub fn youtube_api_key(&self) -> Option<String> {
        present(self.youtube_api_key.clone())
    }

    pub fn gemini_api_key(&self) -> Option<String> {
        present(self.gemini_api_key.clone())
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn default_level(&self) -> DetailLevel {
        self.default_level.unwrap_or_default()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

/// Empty or whitespace-only credentials count as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("vidsum")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
youtube_api_key = "yt-key"
gemini_api_key = "gm-key"
gemini_model = "gemini-2.0-flash"
default_level = "detailed"
timeout_secs = 10
concurrent_fetch = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.youtube_api_key().as_deref(), Some("yt-key"));
        assert_eq!(config.gemini_api_key().as_deref(), Some("gm-key"));
        assert_eq!(config.gemini_model(), "gemini-2.0-flash");
        assert_eq!(config.default_level(), DetailLevel::Detailed);
        assert_eq!(config.timeout_secs(), 10);
        assert_eq!(config.concurrent_fetch, Some(true));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.youtube_api_key().is_none());
        assert!(config.gemini_api_key().is_none());
        assert_eq!(config.gemini_model(), DEFAULT_MODEL);
        assert_eq!(config.default_level(), DetailLevel::Medium);
        assert_eq!(config.timeout_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert!(toml::from_str::<Config>(r#"default_level = "huge""#).is_err());
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config: Config = toml::from_str(r#"gemini_api_key = "   ""#).unwrap();
        assert!(config.gemini_api_key().is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let config: Config = toml::from_str(r#"gemini_api_key = "from-file""#).unwrap();
        let config = config.with_overrides(|name| match name {
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            "YOUTUBE_API_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.gemini_api_key().as_deref(), Some("from-env"));
        assert!(config.youtube_api_key().is_none());
    }
}
