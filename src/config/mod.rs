//! Configuration module for techhealth
//!
//! This module handles:
//! - Engine configuration (`techhealth.toml`): provider limits, path
//!   exclusions, snapshot cache
//! - User configuration (`~/.config/techhealth/config.toml`): the code
//!   host token
//!
//! Scoring, debt, benchmark and recommendation constants are deliberately
//! absent: they are fixed so scores stay comparable across repositories.

mod engine_config;
mod user_config;

pub use engine_config::{
    discover_engine_config, load_engine_config, CacheSection, EngineConfig, FilterSection,
    ProviderSection, CONFIG_FILE_NAME, EXAMPLE_CONFIG,
};
pub use user_config::UserConfig;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading configuration or parsing user choices.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("unknown output format '{0}'. Valid formats: text, json")]
    UnknownFormat(String),

    #[error("unknown render target '{0}'. Valid targets: html, pdf, markdown")]
    UnknownTarget(String),
}
