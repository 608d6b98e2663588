//! Technical debt estimation
//!
//! The debt ratio (0-100) is a weighted sum of five factor scores, each on a
//! 0-100 scale. The factor table is data: adding a factor means adding a row.
//! Critical files are flagged from their own complexity and maintainability.

use super::quality::{FileMetrics, QualityReport};
use crate::models::{
    ActivityMetrics, CriticalFile, DebtAssessment, DebtComponent, QualityMetrics, Severity, Trend,
};
use std::cmp::Ordering;
use tracing::debug;

// ---------------------------------------------------------------------------
// Factor table
// ---------------------------------------------------------------------------

/// Remediation effort per debt point per line of code, in hours.
pub const HOURS_PER_DEBT_POINT_PER_LOC: f64 = 0.001;

/// One weighted input of the debt ratio.
pub struct DebtFactor {
    pub category: &'static str,
    pub weight: f64,
    score: fn(&QualityMetrics, &ActivityMetrics) -> f64,
}

impl DebtFactor {
    pub fn score(&self, quality: &QualityMetrics, activity: &ActivityMetrics) -> f64 {
        (self.score)(quality, activity).clamp(0.0, 100.0)
    }
}

/// Weights sum to 1.0.
pub const DEBT_FACTORS: &[DebtFactor] = &[
    DebtFactor {
        category: "complexity",
        weight: 0.30,
        score: |q, _| ramp(q.cyclomatic_complexity, 5.0, 25.0),
    },
    DebtFactor {
        category: "test_coverage",
        weight: 0.25,
        score: |q, _| 100.0 - q.test_coverage_pct,
    },
    DebtFactor {
        category: "maintainability",
        weight: 0.25,
        score: |q, _| ramp(q.maintainability_index, 85.0, 20.0),
    },
    DebtFactor {
        category: "documentation",
        weight: 0.10,
        score: |q, _| ramp(q.comment_ratio, 0.15, 0.0),
    },
    DebtFactor {
        category: "activity_risk",
        weight: 0.10,
        score: |_, a| {
            let mut risk = 0.0;
            if a.trend == Trend::Declining {
                risk += 50.0;
            }
            if a.contributors_count < 2 {
                risk += 50.0;
            }
            risk
        },
    },
];

/// Linear 0-100 ramp: 0 at `zero_at`, 100 at `full_at`, clamped outside.
/// Works in either direction.
fn ramp(value: f64, zero_at: f64, full_at: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    ((value - zero_at) / (full_at - zero_at) * 100.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Critical files
// ---------------------------------------------------------------------------

pub const CRITICAL_COMPLEXITY: f64 = 10.0;
pub const HIGH_COMPLEXITY: f64 = 20.0;
pub const CRITICAL_MAINTAINABILITY: f64 = 65.0;
pub const HIGH_MAINTAINABILITY: f64 = 40.0;

fn critical_file(file: &FileMetrics) -> Option<(CriticalFile, f64)> {
    let complexity = file.complexity()?;
    let maintainability = file.maintainability()?;

    let mut reasons = Vec::new();
    let mut severity = Severity::Medium;
    let mut breach: f64 = 0.0;

    if complexity > CRITICAL_COMPLEXITY {
        reasons.push(format!(
            "cyclomatic complexity {:.1} exceeds {}",
            complexity, CRITICAL_COMPLEXITY
        ));
        breach = breach.max((complexity - CRITICAL_COMPLEXITY) / CRITICAL_COMPLEXITY);
        if complexity >= HIGH_COMPLEXITY {
            severity = Severity::High;
        }
    }
    if maintainability < CRITICAL_MAINTAINABILITY {
        reasons.push(format!(
            "maintainability index {:.1} below {}",
            maintainability, CRITICAL_MAINTAINABILITY
        ));
        breach = breach.max((CRITICAL_MAINTAINABILITY - maintainability) / CRITICAL_MAINTAINABILITY);
        if maintainability < HIGH_MAINTAINABILITY {
            severity = Severity::High;
        }
    }

    if reasons.is_empty() {
        return None;
    }
    Some((
        CriticalFile {
            path: file.path.clone(),
            reason: reasons.join("; "),
            severity,
        },
        breach,
    ))
}

/// Files breaching the critical thresholds, worst first.
pub fn critical_files(files: &[FileMetrics]) -> Vec<CriticalFile> {
    let mut flagged: Vec<(CriticalFile, f64)> = files.iter().filter_map(critical_file).collect();
    flagged.sort_by(|(a, breach_a), (b, breach_b)| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| breach_b.partial_cmp(breach_a).unwrap_or(Ordering::Equal))
            .then_with(|| a.path.cmp(&b.path))
    });
    flagged.into_iter().map(|(file, _)| file).collect()
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Estimate technical debt from the quality and activity analyses.
pub fn assess(quality: &QualityReport, activity: &ActivityMetrics) -> DebtAssessment {
    let by_category: Vec<DebtComponent> = DEBT_FACTORS
        .iter()
        .map(|factor| DebtComponent {
            category: factor.category.to_string(),
            score: factor.score(&quality.metrics, activity),
            weight: factor.weight,
        })
        .collect();

    let debt_ratio_pct = by_category
        .iter()
        .map(|c| c.score * c.weight)
        .sum::<f64>()
        .clamp(0.0, 100.0);
    let estimated_hours =
        (debt_ratio_pct * quality.metrics.lines_of_code as f64 * HOURS_PER_DEBT_POINT_PER_LOC).max(0.0);
    let critical_files = critical_files(&quality.files);

    debug!(
        "Debt: {:.1}% ({:.1}h), {} critical files",
        debt_ratio_pct,
        estimated_hours,
        critical_files.len()
    );

    DebtAssessment {
        debt_ratio_pct,
        estimated_hours,
        critical_files,
        by_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::complexity::{LineCounts, SourceMetrics};
    use crate::models::Language;

    fn quality(cc: f64, mi: f64, coverage: f64, comments: f64, loc: u64) -> QualityMetrics {
        QualityMetrics {
            cyclomatic_complexity: cc,
            maintainability_index: mi,
            comment_ratio: comments,
            test_coverage_pct: coverage,
            test_coverage_estimated: true,
            lines_of_code: loc,
            files_analyzed: 1,
            test_files: 0,
        }
    }

    fn report(metrics: QualityMetrics, files: Vec<FileMetrics>) -> QualityReport {
        QualityReport {
            metrics,
            files,
            skipped: Vec::new(),
            files_considered: 0,
        }
    }

    fn file_metrics(path: &str, complexity: f64, maintainability: f64) -> FileMetrics {
        FileMetrics {
            path: path.into(),
            language: Language::Python,
            lines_of_code: 100,
            is_test: false,
            source: Some(SourceMetrics {
                lines: LineCounts {
                    code: 100,
                    comment: 0,
                    blank: 0,
                },
                decision_points: 0,
                functions: 1,
                complexity,
                volume: 1000.0,
                maintainability,
            }),
        }
    }

    fn team() -> ActivityMetrics {
        ActivityMetrics {
            contributors_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = DEBT_FACTORS.iter().map(|f| f.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_healthy_repository_has_no_debt() {
        let debt = assess(&report(quality(3.0, 90.0, 100.0, 0.2, 1000), Vec::new()), &team());
        assert_eq!(debt.debt_ratio_pct, 0.0);
        assert_eq!(debt.estimated_hours, 0.0);
        assert!(debt.critical_files.is_empty());
        assert_eq!(debt.by_category.len(), DEBT_FACTORS.len());
    }

    #[test]
    fn test_worst_case_is_clamped_to_100() {
        let solo_declining = ActivityMetrics {
            contributors_count: 1,
            trend: Trend::Declining,
            ..Default::default()
        };
        let debt = assess(&report(quality(80.0, 0.0, 0.0, 0.0, 2000), Vec::new()), &solo_declining);
        assert!((debt.debt_ratio_pct - 100.0).abs() < 1e-9);
        assert!((debt.estimated_hours - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_factors() {
        // CC 15 -> 50, coverage 60 -> 40, MI 52.5 -> 50, comments 0.075 -> 50, activity 0
        let debt = assess(&report(quality(15.0, 52.5, 60.0, 0.075, 500), Vec::new()), &team());
        let expected = 0.30 * 50.0 + 0.25 * 40.0 + 0.25 * 50.0 + 0.10 * 50.0;
        assert!((debt.debt_ratio_pct - expected).abs() < 1e-9);
    }

    #[test]
    fn test_critical_files_ordering() {
        let files = vec![
            file_metrics("ok.py", 3.0, 90.0),
            file_metrics("b_medium.py", 12.0, 70.0),
            file_metrics("a_medium.py", 12.0, 70.0),
            file_metrics("worse_medium.py", 18.0, 70.0),
            file_metrics("high.py", 25.0, 30.0),
        ];
        let critical = critical_files(&files);
        let paths: Vec<_> = critical.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["high.py", "worse_medium.py", "a_medium.py", "b_medium.py"]);
        assert_eq!(critical[0].severity, Severity::High);
        assert!(critical[0].reason.contains("complexity"));
        assert!(critical[0].reason.contains("maintainability"));
    }
}
