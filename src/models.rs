//! Core data models for techhealth
//!
//! These models are shared by every stage of the engine: the repository
//! snapshot produced by a provider, the metrics each analyzer derives from
//! it, and the `HealthReport` payload handed to renderers.
//!
//! Field names of the payload types are part of the output contract.
//! Renderer templates bind to them by name (`overall_score`,
//! `quality.maintainability_index`, `commit_frequency.daily_average`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Owner/name pair identifying a repository on a code host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` slug.
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, name) = slug.trim().trim_end_matches('/').split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name.trim_end_matches(".git")))
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Source languages recognized by extension.
///
/// Languages where [`Language::is_supported`] is false still count toward
/// lines of code but are excluded from complexity and maintainability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    CSharp,
    Go,
    Ruby,
    Php,
    Rust,
    C,
    Cpp,
    Kotlin,
    Swift,
    Scala,
    Shell,
    Html,
    Css,
    Sql,
}

impl Language {
    /// Detect the language of a path from its extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext {
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "rs" => Language::Rust,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            "scala" => Language::Scala,
            "sh" | "bash" => Language::Shell,
            "html" | "htm" => Language::Html,
            "css" | "scss" => Language::Css,
            "sql" => Language::Sql,
            _ => return None,
        };
        Some(lang)
    }

    /// Whether complexity and maintainability can be computed for this language.
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            Language::Swift
                | Language::Scala
                | Language::Shell
                | Language::Html
                | Language::Css
                | Language::Sql
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Scala => "scala",
            Language::Shell => "shell",
            Language::Html => "html",
            Language::Css => "css",
            Language::Sql => "sql",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single analyzable file, held in memory only.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub language: Language,
    /// Raw bytes as served by the code host. Decoded by the quality analyzer.
    pub raw_content: Vec<u8>,
    pub size_bytes: u64,
}

impl FileRecord {
    /// Build a record, detecting the language from the path.
    ///
    /// Returns `None` for paths whose extension is not on the allow-list.
    pub fn new(path: impl Into<String>, raw_content: Vec<u8>) -> Option<Self> {
        let path = path.into();
        let language = Language::from_path(&path)?;
        let size_bytes = raw_content.len() as u64;
        Some(Self {
            path,
            language,
            raw_content,
            size_bytes,
        })
    }
}

/// One commit from the repository log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub author_identity: String,
    pub timestamp: DateTime<Utc>,
    pub additions: u64,
    pub deletions: u64,
}

/// Immutable, in-memory view of a repository at fetch time.
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    id: RepositoryId,
    default_branch: String,
    files: Vec<FileRecord>,
    commits: Vec<CommitRecord>,
    fetched_at: DateTime<Utc>,
}

impl RepositorySnapshot {
    /// Build a snapshot. Commits are ordered by timestamp ascending and
    /// keyed by sha: a repeated sha keeps its first occurrence.
    pub fn new(
        id: RepositoryId,
        default_branch: impl Into<String>,
        mut files: Vec<FileRecord>,
        mut commits: Vec<CommitRecord>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut seen = HashSet::with_capacity(commits.len());
        commits.retain(|c| seen.insert(c.sha.clone()));
        commits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.sha.cmp(&b.sha)));
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            id,
            default_branch: default_branch.into(),
            files,
            commits,
            fetched_at,
        }
    }

    pub fn id(&self) -> &RepositoryId {
        &self.id
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Aggregate static metrics for the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean per-function cyclomatic complexity, files weighted by LOC
    pub cyclomatic_complexity: f64,
    /// 0-100, LOC-weighted
    pub maintainability_index: f64,
    /// Comment lines / non-blank lines, 0-1
    pub comment_ratio: f64,
    /// 0-100. Estimated from test-file naming, never measured.
    pub test_coverage_pct: f64,
    /// Always true: no instrumented test run is performed.
    pub test_coverage_estimated: bool,
    pub lines_of_code: u64,
    pub files_analyzed: usize,
    pub test_files: usize,
}

/// Direction of commit activity over the observed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    #[default]
    Flat,
    Declining,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Rising => write!(f, "rising"),
            Trend::Flat => write!(f, "flat"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

/// Development-activity metrics from the commit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityMetrics {
    pub daily_average: f64,
    pub weekly_average: f64,
    pub monthly_average: f64,
    pub contributors_count: usize,
    pub trend: Trend,
    pub total_commits: usize,
    pub total_additions: u64,
    pub total_deletions: u64,
    /// Commits per author identity
    pub commit_distribution: BTreeMap<String, usize>,
}

/// Severity of a critical file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// A file whose own metrics breach the critical thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalFile {
    pub path: String,
    pub reason: String,
    pub severity: Severity,
}

/// Contribution of one debt factor to the debt ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtComponent {
    pub category: String,
    /// 0-100 before weighting
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtAssessment {
    pub debt_ratio_pct: f64,
    pub estimated_hours: f64,
    pub critical_files: Vec<CriticalFile>,
    pub by_category: Vec<DebtComponent>,
}

/// Which side of a distribution is desirable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub metric_name: String,
    pub value: f64,
    /// Absent when no reference bucket exists for this repository
    pub percentile: Option<f64>,
    pub peer_median: Option<f64>,
    pub better: Direction,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub rationale: String,
    pub priority: Priority,
    pub category: String,
    pub metric: String,
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Diagnostics {
    pub files_considered: usize,
    pub skipped_files: usize,
    pub skipped: Vec<SkippedFile>,
    pub commits_analyzed: usize,
}

/// Repository identity as printed in the report header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRepository {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

/// The three weighted inputs of the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub quality: f64,
    pub activity: f64,
    pub debt: f64,
}

/// Final, render-ready payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub repository: ReportRepository,
    pub generated_at: DateTime<Utc>,
    pub overall_score: u8,
    pub grade: String,
    pub sub_scores: SubScores,
    pub quality: QualityMetrics,
    #[serde(rename = "commit_frequency")]
    pub activity: ActivityMetrics,
    pub debt: DebtAssessment,
    pub benchmarks: Vec<BenchmarkResult>,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Diagnostics,
}

impl HealthReport {
    /// Calculate grade from score
    pub fn grade_from_score(score: u8) -> String {
        match score {
            s if s >= 90 => "A".to_string(),
            s if s >= 80 => "B".to_string(),
            s if s >= 70 => "C".to_string(),
            s if s >= 60 => "D".to_string(),
            _ => "F".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(sha: &str, day: u32) -> CommitRecord {
        CommitRecord {
            sha: sha.into(),
            author_identity: "dev@example.com".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            additions: 1,
            deletions: 0,
        }
    }

    #[test]
    fn test_snapshot_orders_and_dedups_commits() {
        let snapshot = RepositorySnapshot::new(
            RepositoryId::new("acme", "widgets"),
            "main",
            Vec::new(),
            vec![commit("c", 3), commit("a", 1), commit("c", 9), commit("b", 2)],
            Utc::now(),
        );
        let shas: Vec<_> = snapshot.commits().iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_path("src/app.py"), Some(Language::Python));
        assert_eq!(Language::from_path("web/App.TSX"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("README.md"), None);
        assert!(Language::Go.is_supported());
        assert!(!Language::Html.is_supported());
    }

    #[test]
    fn test_repository_id_parse() {
        assert_eq!(
            RepositoryId::parse("acme/widgets"),
            Some(RepositoryId::new("acme", "widgets"))
        );
        assert_eq!(
            RepositoryId::parse("acme/widgets.git"),
            Some(RepositoryId::new("acme", "widgets"))
        );
        assert!(RepositoryId::parse("acme").is_none());
        assert!(RepositoryId::parse("/widgets").is_none());
        assert!(RepositoryId::parse("a/b/c").is_none());
    }

    #[test]
    fn test_grade_from_score() {
        assert_eq!(HealthReport::grade_from_score(95), "A");
        assert_eq!(HealthReport::grade_from_score(80), "B");
        assert_eq!(HealthReport::grade_from_score(12), "F");
    }
}
