//! Output reporters for health reports
//!
//! Supports two built-in output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON with a stable field layout
//!
//! Document renderers (HTML, PDF, Markdown) plug in through [`Renderer`];
//! none ships with the engine.

mod json;
mod text;

use crate::config::ConfigError;
use crate::models::HealthReport;
use anyhow::Result;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Document formats an external [`Renderer`] may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Html,
    Pdf,
    Markdown,
}

impl FromStr for RenderTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(RenderTarget::Html),
            "pdf" => Ok(RenderTarget::Pdf),
            "markdown" | "md" => Ok(RenderTarget::Markdown),
            _ => Err(ConfigError::UnknownTarget(s.to_string())),
        }
    }
}

impl std::fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderTarget::Html => write!(f, "html"),
            RenderTarget::Pdf => write!(f, "pdf"),
            RenderTarget::Markdown => write!(f, "markdown"),
        }
    }
}

/// Turns a finished report into a document.
///
/// Implementations bind to the report's serialized field names
/// (`overall_score`, `quality.maintainability_index`, ...).
pub trait Renderer: Send + Sync {
    fn render(&self, report: &HealthReport, target: RenderTarget) -> Result<Vec<u8>>;
}

/// Render a health report using an OutputFormat enum
pub fn report_with_format(report: &HealthReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
    }
}
