//! Analyze command - fetch, score and report one repository

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use techhealth::config::{discover_engine_config, load_engine_config, EngineConfig, UserConfig};
use techhealth::models::RepositoryId;
use techhealth::pipeline::{AnalyzeRequest, Engine, EngineError};
use techhealth::provider::{
    Credentials, GitHubProvider, LocalProvider, ProviderError, RepositoryProvider,
};
use techhealth::reporters::{self, OutputFormat};

pub(super) struct AnalyzeArgs {
    pub slug: Option<String>,
    pub token: Option<String>,
    pub local: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub config: Option<PathBuf>,
}

/// Create spinner progress style
fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

fn load_config(args: &AnalyzeArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
            load_engine_config(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => discover_engine_config(Path::new(".")),
    };
    if let Some(secs) = args.timeout {
        config.provider.timeout_secs = secs;
    }
    Ok(config)
}

/// Report name for a local checkout: its directory name, restricted to
/// characters valid in a repository name.
fn local_name(root: &Path) -> String {
    let name: String = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if name.is_empty() || name == "." || name == ".." {
        "repository".to_string()
    } else {
        name
    }
}

fn build_target(
    args: &AnalyzeArgs,
    config: &EngineConfig,
) -> Result<(Box<dyn RepositoryProvider>, AnalyzeRequest)> {
    if let Some(path) = &args.local {
        let root = path
            .canonicalize()
            .with_context(|| format!("Path does not exist: {}", path.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Path is not a directory: {}", root.display());
        }
        let id = match &args.slug {
            Some(slug) => RepositoryId::parse(slug)
                .with_context(|| format!("'{}' is not an owner/repo slug", slug))?,
            None => RepositoryId::new("local", local_name(&root)),
        };
        let provider = LocalProvider::new(root, config.path_filter())
            .with_limits(config.provider.max_files, config.provider.max_commits);
        let request = AnalyzeRequest::new(id.owner, id.name, Credentials::anonymous());
        return Ok((Box::new(provider), request));
    }

    let Some(slug) = &args.slug else {
        anyhow::bail!("Specify a repository as owner/repo, or a checkout with --local PATH");
    };
    let token = args
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| UserConfig::load().github_token)
        .with_context(|| {
            let location = UserConfig::user_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the user config file".to_string());
            format!(
                "A GitHub token is required: pass --token, set GITHUB_TOKEN or add github_token to {}",
                location
            )
        })?;
    let request = AnalyzeRequest::from_slug(slug, Credentials::new(token))?;
    let provider = GitHubProvider::new(config.github_config(), config.path_filter());
    Ok((Box::new(provider), request))
}

fn explain(error: EngineError) -> anyhow::Error {
    let hint = match error.provider_error() {
        Some(ProviderError::RateLimited { retry_after }) => Some(format!(
            "GitHub rate limit reached; try again in {}s",
            retry_after.as_secs().max(1)
        )),
        Some(ProviderError::Auth(_)) => {
            Some("Check that the token is valid and can read this repository".to_string())
        }
        Some(ProviderError::Timeout(_)) => {
            Some("Raise --timeout or lower provider.max_files".to_string())
        }
        _ => None,
    };
    let error = anyhow::Error::new(error);
    match hint {
        Some(hint) => error.context(hint),
        None => error,
    }
}

/// Run the analyze command
pub(super) fn run(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(&args)?;
    let (provider, request) = build_target(&args, &config)?;
    let engine = Engine::from_config(provider, &config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(create_spinner_style());
    spinner.set_message(format!("Analyzing {}/{}...", request.owner, request.repo));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = engine.analyze(&request);
    spinner.finish_and_clear();
    let report = result.map_err(explain)?;

    let rendered = reporters::report_with_format(&report, args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}Report written to {} {}",
                style("✓ ").green(),
                style(path.display()).cyan(),
                style(format!("(score {}, grade {})", report.overall_score, report.grade)).dim()
            );
        }
        None => {
            print!("{}", rendered);
            if args.format == OutputFormat::Json {
                println!();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_is_sanitized() {
        assert_eq!(local_name(Path::new("/work/my repo")), "my-repo");
        assert_eq!(local_name(Path::new("/work/widgets.rs")), "widgets.rs");
        assert_eq!(local_name(Path::new("/")), "repository");
    }
}
