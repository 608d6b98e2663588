//! Recommendation engine
//!
//! Evaluates [`rules::RULES`] against the computed metrics. Every rule
//! whose condition holds produces a candidate; candidates are ordered by
//! priority, then by how far past the threshold the metric is, then by
//! title. Titles are unique in the output and at most
//! [`MAX_RECOMMENDATIONS`] are returned.

pub mod rules;

use crate::models::{ActivityMetrics, DebtAssessment, QualityMetrics, Recommendation};
use rules::{Rule, RULES};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

pub const MAX_RECOMMENDATIONS: usize = 10;

/// Everything the rules can look at.
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub quality: &'a QualityMetrics,
    pub activity: &'a ActivityMetrics,
    pub debt: &'a DebtAssessment,
    pub skipped_files: usize,
}

fn render(rule: &Rule, value: f64, signals: &Signals) -> String {
    let files = signals
        .debt
        .critical_files
        .iter()
        .take(3)
        .map(|f| f.path.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    rule.rationale
        .replace("{value}", &rule.signal.format(value))
        .replace("{threshold}", &format!("{}", rule.threshold))
        .replace("{files}", &files)
}

/// Evaluate `rules` against `signals`.
pub fn evaluate(rules: &[Rule], signals: &Signals) -> Vec<Recommendation> {
    let mut fired: Vec<(Recommendation, f64)> = rules
        .iter()
        .filter_map(|rule| {
            let value = rule.signal.value(signals)?;
            if !rule.condition.holds(value, rule.threshold) {
                return None;
            }
            let recommendation = Recommendation {
                title: rule.title.to_string(),
                rationale: render(rule, value, signals),
                priority: rule.priority,
                category: rule.category.to_string(),
                metric: rule.signal.name().to_string(),
            };
            Some((recommendation, rule.breach(value)))
        })
        .collect();

    fired.sort_by(|(a, breach_a), (b, breach_b)| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| breach_b.partial_cmp(breach_a).unwrap_or(Ordering::Equal))
            .then_with(|| a.title.cmp(&b.title))
    });

    let mut seen = HashSet::new();
    let recommendations: Vec<Recommendation> = fired
        .into_iter()
        .map(|(r, _)| r)
        .filter(|r| seen.insert(r.title.clone()))
        .take(MAX_RECOMMENDATIONS)
        .collect();

    debug!("{} recommendations", recommendations.len());
    recommendations
}

/// Evaluate the built-in rule table.
pub fn recommend(signals: &Signals) -> Vec<Recommendation> {
    evaluate(RULES, signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriticalFile, Priority, Severity, Trend};
    use rules::{Condition, Signal};

    fn quality(cc: f64, mi: f64, comments: f64, coverage: f64) -> QualityMetrics {
        QualityMetrics {
            cyclomatic_complexity: cc,
            maintainability_index: mi,
            comment_ratio: comments,
            test_coverage_pct: coverage,
            test_coverage_estimated: true,
            lines_of_code: 1000,
            files_analyzed: 10,
            test_files: 2,
        }
    }

    fn debt(ratio: f64, critical: Vec<CriticalFile>) -> DebtAssessment {
        DebtAssessment {
            debt_ratio_pct: ratio,
            estimated_hours: 0.0,
            critical_files: critical,
            by_category: Vec::new(),
        }
    }

    fn healthy_activity() -> ActivityMetrics {
        ActivityMetrics {
            weekly_average: 10.0,
            contributors_count: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_healthy_repository_gets_nothing() {
        let q = quality(3.0, 85.0, 0.2, 90.0);
        let a = healthy_activity();
        let d = debt(5.0, Vec::new());
        let signals = Signals {
            quality: &q,
            activity: &a,
            debt: &d,
            skipped_files: 0,
        };
        assert!(recommend(&signals).is_empty());
    }

    #[test]
    fn test_dedup_keeps_highest_priority() {
        let q = quality(20.0, 85.0, 0.2, 90.0);
        let a = healthy_activity();
        let d = debt(5.0, Vec::new());
        let signals = Signals {
            quality: &q,
            activity: &a,
            debt: &d,
            skipped_files: 0,
        };
        let recs = recommend(&signals);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].rationale.contains("20.0"));
    }

    #[test]
    fn test_ordering_priority_then_breach() {
        let q = quality(3.0, 30.0, 0.2, 40.0);
        let a = ActivityMetrics {
            weekly_average: 0.5,
            contributors_count: 1,
            trend: Trend::Declining,
            ..Default::default()
        };
        let critical = vec![CriticalFile {
            path: "src/big.py".into(),
            reason: "complexity".into(),
            severity: Severity::High,
        }];
        let d = debt(5.0, critical);
        let signals = Signals {
            quality: &q,
            activity: &a,
            debt: &d,
            skipped_files: 2,
        };
        let recs = recommend(&signals);
        let titles: Vec<_> = recs.iter().map(|r| r.title.as_str()).collect();
        // High: MI breach 35/65, coverage 10/50, declining 0.5
        assert_eq!(
            titles,
            vec![
                "Improve code maintainability",
                "Address declining development activity",
                "Increase automated test coverage",
                "Refactor the most critical files",
                "Reduce key-person risk",
                "Review files that could not be analyzed",
                "Establish a regular development cadence",
            ]
        );
        assert!(recs[3].rationale.contains("src/big.py"));
        let mut sorted = recs.clone();
        sorted.sort_by_key(|r| r.priority);
        assert_eq!(sorted, recs);
    }

    #[test]
    fn test_empty_codebase_skips_code_rules() {
        let mut q = quality(1.0, 50.0, 0.0, 0.0);
        q.lines_of_code = 0;
        let a = ActivityMetrics::default();
        let d = debt(53.0, Vec::new());
        let signals = Signals {
            quality: &q,
            activity: &a,
            debt: &d,
            skipped_files: 0,
        };
        let recs = recommend(&signals);
        assert!(recs.iter().all(|r| r.category == "activity"));
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_cap_applies() {
        let rules: Vec<Rule> = (0..15)
            .map(|i| Rule {
                signal: Signal::CriticalFiles,
                condition: Condition::Above,
                threshold: -(i as f64),
                priority: Priority::Low,
                category: "test",
                title: Box::leak(format!("rule {:02}", i).into_boxed_str()),
                rationale: "{value}",
            })
            .collect();
        let q = quality(3.0, 85.0, 0.2, 90.0);
        let a = healthy_activity();
        let d = debt(5.0, Vec::new());
        let signals = Signals {
            quality: &q,
            activity: &a,
            debt: &d,
            skipped_files: 0,
        };
        let recs = evaluate(&rules, &signals);
        // rule 00 does not fire (0 is not above -0); equal breaches sort by title
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0].title, "rule 01");
        assert_eq!(recs[9].title, "rule 10");
    }
}
