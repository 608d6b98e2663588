//! User-level configuration for techhealth
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/techhealth/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    /// GitHub access token
    #[serde(default)]
    pub github_token: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. `GITHUB_TOKEN` environment variable (highest)
    /// 2. User config (~/.config/techhealth/config.toml)
    pub fn load() -> Self {
        let mut config = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| match std::fs::read_to_string(&p) {
                Ok(content) => Self::parse(&content),
                Err(e) => {
                    warn!("Failed to read {}: {}", p.display(), e);
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            config.merge(UserConfig {
                github_token: Some(token),
            });
        }
        config
    }

    fn parse(content: &str) -> Option<Self> {
        match toml::from_str::<UserConfig>(content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring malformed user config: {}", e);
                None
            }
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("techhealth").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if let Some(token) = other.github_token.filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token);
        }
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        let config = UserConfig::parse("github_token = \"ghp_abc\"\n").unwrap();
        assert_eq!(config.github_token(), Some("ghp_abc"));
        assert_eq!(UserConfig::parse("").unwrap(), UserConfig::default());
        assert!(UserConfig::parse("github_token = [").is_none());
    }

    #[test]
    fn test_merge_prefers_other_but_ignores_blank() {
        let mut config = UserConfig {
            github_token: Some("from-file".into()),
        };
        config.merge(UserConfig {
            github_token: Some("  ".into()),
        });
        assert_eq!(config.github_token(), Some("from-file"));

        config.merge(UserConfig {
            github_token: Some("from-env".into()),
        });
        assert_eq!(config.github_token(), Some("from-env"));
    }
}
