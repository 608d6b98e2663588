//! techhealth - repository technical-health engine
//!
//! Fetches a repository snapshot through a [`provider::RepositoryProvider`],
//! derives code-quality, commit-activity and technical-debt metrics,
//! benchmarks them against peer distributions, generates prioritized
//! recommendations and condenses everything into a 0-100 health score.
//!
//! ```no_run
//! use techhealth::pipeline::{AnalyzeRequest, Engine};
//! use techhealth::provider::{Credentials, GitHubConfig, GitHubProvider, PathFilter};
//!
//! let provider = GitHubProvider::new(GitHubConfig::default(), PathFilter::default());
//! let engine = Engine::new(provider);
//! let request = AnalyzeRequest::new("rust-lang", "regex", Credentials::new("ghp_..."));
//! let report = engine.analyze(&request)?;
//! println!("{} ({})", report.overall_score, report.grade);
//! # Ok::<(), techhealth::pipeline::EngineError>(())
//! ```

pub mod analysis;
pub mod benchmark;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod recommend;
pub mod reporters;
pub mod scoring;
