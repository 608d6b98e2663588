//! Peer benchmarking
//!
//! Places each headline metric on a static peer distribution. The bucket a
//! repository is compared in depends on the metric: quality and debt
//! metrics use the language group of the dominant language, activity
//! metrics use the codebase size class.

pub mod table;

use crate::analysis::QualityReport;
use crate::models::{ActivityMetrics, BenchmarkResult, DebtAssessment, Direction, Language};
use tracing::debug;

/// Benchmarked metrics, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CyclomaticComplexity,
    MaintainabilityIndex,
    CommentRatio,
    TestCoveragePct,
    DebtRatioPct,
    WeeklyAverage,
    ContributorsCount,
}

/// How a metric's peer bucket is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucketing {
    LanguageGroup,
    SizeClass,
}

impl MetricKind {
    pub fn all() -> &'static [MetricKind] {
        &[
            MetricKind::CyclomaticComplexity,
            MetricKind::MaintainabilityIndex,
            MetricKind::CommentRatio,
            MetricKind::TestCoveragePct,
            MetricKind::DebtRatioPct,
            MetricKind::WeeklyAverage,
            MetricKind::ContributorsCount,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::CyclomaticComplexity => "cyclomatic_complexity",
            MetricKind::MaintainabilityIndex => "maintainability_index",
            MetricKind::CommentRatio => "comment_ratio",
            MetricKind::TestCoveragePct => "test_coverage_pct",
            MetricKind::DebtRatioPct => "debt_ratio_pct",
            MetricKind::WeeklyAverage => "weekly_average",
            MetricKind::ContributorsCount => "contributors_count",
        }
    }

    pub fn better(&self) -> Direction {
        match self {
            MetricKind::CyclomaticComplexity | MetricKind::DebtRatioPct => Direction::Lower,
            _ => Direction::Higher,
        }
    }

    pub fn bucketing(&self) -> Bucketing {
        match self {
            MetricKind::WeeklyAverage | MetricKind::ContributorsCount => Bucketing::SizeClass,
            _ => Bucketing::LanguageGroup,
        }
    }
}

/// Language families with comparable metric distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageGroup {
    /// Python, JavaScript, Ruby, PHP
    Scripting,
    /// TypeScript, Java, C#, Go, Kotlin
    Managed,
    /// Rust, C, C++
    Systems,
}

impl LanguageGroup {
    pub fn of(language: Language) -> Option<Self> {
        match language {
            Language::Python | Language::JavaScript | Language::Ruby | Language::Php => {
                Some(LanguageGroup::Scripting)
            }
            Language::TypeScript
            | Language::Java
            | Language::CSharp
            | Language::Go
            | Language::Kotlin => Some(LanguageGroup::Managed),
            Language::Rust | Language::C | Language::Cpp => Some(LanguageGroup::Systems),
            _ => None,
        }
    }
}

/// Codebase size by lines of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// Under 10k LOC
    Small,
    /// Under 100k LOC
    Medium,
    Large,
}

impl SizeClass {
    /// `None` for an empty codebase.
    pub fn of(lines_of_code: u64) -> Option<Self> {
        match lines_of_code {
            0 => None,
            1..=9_999 => Some(SizeClass::Small),
            10_000..=99_999 => Some(SizeClass::Medium),
            _ => Some(SizeClass::Large),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Language(LanguageGroup),
    Size(SizeClass),
}

/// Benchmark every metric of [`MetricKind::all`].
///
/// A metric with no matching bucket (no supported language, empty
/// codebase) is still listed, with no percentile and no peer median.
pub fn compare(
    quality: &QualityReport,
    activity: &ActivityMetrics,
    debt: &DebtAssessment,
) -> Vec<BenchmarkResult> {
    let language_bucket = quality
        .dominant_language()
        .and_then(LanguageGroup::of)
        .map(Bucket::Language);
    let size_bucket = SizeClass::of(quality.metrics.lines_of_code).map(Bucket::Size);
    debug!("Benchmark buckets: {:?}, {:?}", language_bucket, size_bucket);

    MetricKind::all()
        .iter()
        .map(|metric| {
            let value = match metric {
                MetricKind::CyclomaticComplexity => quality.metrics.cyclomatic_complexity,
                MetricKind::MaintainabilityIndex => quality.metrics.maintainability_index,
                MetricKind::CommentRatio => quality.metrics.comment_ratio,
                MetricKind::TestCoveragePct => quality.metrics.test_coverage_pct,
                MetricKind::DebtRatioPct => debt.debt_ratio_pct,
                MetricKind::WeeklyAverage => activity.weekly_average,
                MetricKind::ContributorsCount => activity.contributors_count as f64,
            };
            let bucket = match metric.bucketing() {
                Bucketing::LanguageGroup => language_bucket,
                Bucketing::SizeClass => size_bucket,
            };
            let distribution = bucket.and_then(|b| table::lookup(*metric, b));

            BenchmarkResult {
                metric_name: metric.name().to_string(),
                value,
                percentile: distribution.and_then(|d| d.percentile_of(value)),
                peer_median: distribution.map(|d| d.median()),
                better: metric.better(),
            }
        })
        .collect()
}
