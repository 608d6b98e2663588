//! Sub-score tables and report assembly

use crate::analysis::QualityReport;
use crate::models::{
    ActivityMetrics, BenchmarkResult, DebtAssessment, Diagnostics, HealthReport, QualityMetrics,
    Recommendation, ReportRepository, SubScores, Trend,
};
use chrono::{DateTime, Utc};
use tracing::info;

/// Clamp to 0-100, mapping NaN and infinities to 0.
fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// One weighted term of a sub-score.
pub struct ScoreComponent<T> {
    pub name: &'static str,
    pub weight: f64,
    score: fn(&T) -> f64,
}

impl<T> ScoreComponent<T> {
    pub fn score(&self, input: &T) -> f64 {
        clamp_score((self.score)(input))
    }
}

fn weighted<T>(components: &[ScoreComponent<T>], input: &T) -> f64 {
    clamp_score(components.iter().map(|c| c.weight * c.score(input)).sum())
}

pub const QUALITY_COMPONENTS: &[ScoreComponent<QualityMetrics>] = &[
    ScoreComponent {
        name: "maintainability",
        weight: 0.40,
        score: |q| q.maintainability_index,
    },
    ScoreComponent {
        name: "complexity",
        weight: 0.30,
        score: |q| 100.0 - 5.0 * (q.cyclomatic_complexity - 1.0),
    },
    ScoreComponent {
        name: "test_coverage",
        weight: 0.15,
        score: |q| q.test_coverage_pct,
    },
    ScoreComponent {
        name: "documentation",
        weight: 0.15,
        score: |q| q.comment_ratio / 0.25 * 100.0,
    },
];

pub const ACTIVITY_COMPONENTS: &[ScoreComponent<ActivityMetrics>] = &[
    ScoreComponent {
        name: "commit_volume",
        weight: 0.60,
        score: |a| a.weekly_average * 10.0,
    },
    ScoreComponent {
        name: "contributors",
        weight: 0.25,
        score: |a| a.contributors_count as f64 * 20.0,
    },
    ScoreComponent {
        name: "trend",
        weight: 0.15,
        score: |a| match a.trend {
            Trend::Rising => 100.0,
            Trend::Flat => 70.0,
            Trend::Declining => 30.0,
        },
    },
];

pub fn quality_score(quality: &QualityMetrics) -> f64 {
    weighted(QUALITY_COMPONENTS, quality)
}

pub fn activity_score(activity: &ActivityMetrics) -> f64 {
    weighted(ACTIVITY_COMPONENTS, activity)
}

/// An unknown (NaN) debt ratio counts as fully indebted.
pub fn debt_score(debt: &DebtAssessment) -> f64 {
    let ratio = debt.debt_ratio_pct;
    let ratio = if ratio.is_nan() { 100.0 } else { ratio.clamp(0.0, 100.0) };
    100.0 - ratio
}

/// Weights of the three sub-scores in the overall score. Sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PillarWeights {
    pub quality: f64,
    pub activity: f64,
    pub debt: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            quality: 0.40,
            activity: 0.30,
            debt: 0.30,
        }
    }
}

impl PillarWeights {
    pub fn is_valid(&self) -> bool {
        let sum = self.quality + self.activity + self.debt;
        (sum - 1.0).abs() < 0.001
    }
}

/// Inputs of report assembly, one per upstream stage.
#[derive(Debug, Clone)]
pub struct ReportParts {
    pub repository: ReportRepository,
    pub quality: QualityReport,
    pub activity: ActivityMetrics,
    pub debt: DebtAssessment,
    pub benchmarks: Vec<BenchmarkResult>,
    pub recommendations: Vec<Recommendation>,
    pub commits_analyzed: usize,
}

/// Turns metrics into scores and the final report.
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    weights: PillarWeights,
}

impl HealthScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights(&self) -> &PillarWeights {
        &self.weights
    }

    pub fn sub_scores(
        &self,
        quality: &QualityMetrics,
        activity: &ActivityMetrics,
        debt: &DebtAssessment,
    ) -> SubScores {
        SubScores {
            quality: quality_score(quality),
            activity: activity_score(activity),
            debt: debt_score(debt),
        }
    }

    /// Weighted, rounded overall score in 0-100.
    pub fn overall(&self, sub: &SubScores) -> u8 {
        let w = &self.weights;
        let total = clamp_score(sub.quality) * w.quality
            + clamp_score(sub.activity) * w.activity
            + clamp_score(sub.debt) * w.debt;
        clamp_score(total.round()) as u8
    }

    /// Build the report. Pure apart from the supplied `generated_at`.
    pub fn assemble(&self, parts: ReportParts, generated_at: DateTime<Utc>) -> HealthReport {
        let sub_scores = self.sub_scores(&parts.quality.metrics, &parts.activity, &parts.debt);
        let overall_score = self.overall(&sub_scores);
        let grade = HealthReport::grade_from_score(overall_score);

        info!(
            "Health score: {} ({}) - Quality: {:.1}, Activity: {:.1}, Debt: {:.1}",
            overall_score, grade, sub_scores.quality, sub_scores.activity, sub_scores.debt
        );

        let diagnostics = Diagnostics {
            files_considered: parts.quality.files_considered,
            skipped_files: parts.quality.skipped.len(),
            skipped: parts.quality.skipped,
            commits_analyzed: parts.commits_analyzed,
        };

        HealthReport {
            repository: parts.repository,
            generated_at,
            overall_score,
            grade,
            sub_scores,
            quality: parts.quality.metrics,
            activity: parts.activity,
            debt: parts.debt,
            benchmarks: parts.benchmarks,
            recommendations: parts.recommendations,
            diagnostics,
        }
    }
}
