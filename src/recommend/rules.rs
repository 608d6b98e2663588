//! Recommendation rule table
//!
//! Each rule fires when its signal is strictly above (or below) the
//! threshold. Rationale templates may use `{value}`, `{threshold}` and
//! `{files}` (the three worst critical files).

use super::Signals;
use crate::models::{Priority, Trend};

/// A metric a rule can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    CyclomaticComplexity,
    MaintainabilityIndex,
    CommentRatio,
    TestCoveragePct,
    DebtRatioPct,
    DecliningTrend,
    ContributorsCount,
    WeeklyAverage,
    CriticalFiles,
    SkippedFiles,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::CyclomaticComplexity => "cyclomatic_complexity",
            Signal::MaintainabilityIndex => "maintainability_index",
            Signal::CommentRatio => "comment_ratio",
            Signal::TestCoveragePct => "test_coverage_pct",
            Signal::DebtRatioPct => "debt_ratio_pct",
            Signal::DecliningTrend => "trend",
            Signal::ContributorsCount => "contributors_count",
            Signal::WeeklyAverage => "weekly_average",
            Signal::CriticalFiles => "critical_files",
            Signal::SkippedFiles => "skipped_files",
        }
    }

    /// Current value, or `None` when there is nothing to judge (code
    /// metrics of an empty codebase).
    pub fn value(&self, s: &Signals) -> Option<f64> {
        let has_code = s.quality.lines_of_code > 0;
        let value = match self {
            Signal::CyclomaticComplexity if has_code => s.quality.cyclomatic_complexity,
            Signal::MaintainabilityIndex if has_code => s.quality.maintainability_index,
            Signal::CommentRatio if has_code => s.quality.comment_ratio,
            Signal::TestCoveragePct if has_code => s.quality.test_coverage_pct,
            Signal::DebtRatioPct if has_code => s.debt.debt_ratio_pct,
            Signal::DecliningTrend => {
                if s.activity.trend == Trend::Declining {
                    1.0
                } else {
                    0.0
                }
            }
            Signal::ContributorsCount => s.activity.contributors_count as f64,
            Signal::WeeklyAverage => s.activity.weekly_average,
            Signal::CriticalFiles => s.debt.critical_files.len() as f64,
            Signal::SkippedFiles => s.skipped_files as f64,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            Signal::CommentRatio => format!("{:.0}%", value * 100.0),
            Signal::TestCoveragePct | Signal::DebtRatioPct => format!("{:.0}%", value),
            Signal::ContributorsCount | Signal::CriticalFiles | Signal::SkippedFiles => {
                format!("{}", value as u64)
            }
            _ => format!("{:.1}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Above,
    Below,
}

impl Condition {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Condition::Above => value > threshold,
            Condition::Below => value < threshold,
        }
    }
}

pub struct Rule {
    pub signal: Signal,
    pub condition: Condition,
    pub threshold: f64,
    pub priority: Priority,
    pub category: &'static str,
    pub title: &'static str,
    pub rationale: &'static str,
}

impl Rule {
    /// Relative distance past the threshold.
    pub fn breach(&self, value: f64) -> f64 {
        (value - self.threshold).abs() / self.threshold.abs().max(1.0)
    }
}

const COMPLEXITY_TITLE: &str = "Reduce code complexity in critical files";
const COVERAGE_TITLE: &str = "Increase automated test coverage";
const DEBT_TITLE: &str = "Pay down accumulated technical debt";

pub const RULES: &[Rule] = &[
    Rule {
        signal: Signal::CyclomaticComplexity,
        condition: Condition::Above,
        threshold: 15.0,
        priority: Priority::High,
        category: "quality",
        title: COMPLEXITY_TITLE,
        rationale: "Average cyclomatic complexity is {value}, well above {threshold}. \
                    Break large functions into smaller units with a single responsibility.",
    },
    Rule {
        signal: Signal::CyclomaticComplexity,
        condition: Condition::Above,
        threshold: 10.0,
        priority: Priority::Medium,
        category: "quality",
        title: COMPLEXITY_TITLE,
        rationale: "Average cyclomatic complexity is {value}, above {threshold}. \
                    Simplify branching logic in the most complex functions.",
    },
    Rule {
        signal: Signal::MaintainabilityIndex,
        condition: Condition::Below,
        threshold: 65.0,
        priority: Priority::High,
        category: "quality",
        title: "Improve code maintainability",
        rationale: "The maintainability index is {value}, below {threshold}. \
                    Shorter functions, less duplication and clearer naming raise it.",
    },
    Rule {
        signal: Signal::CommentRatio,
        condition: Condition::Below,
        threshold: 0.10,
        priority: Priority::Medium,
        category: "documentation",
        title: "Improve code documentation",
        rationale: "Only {value} of lines are comments. \
                    Document public interfaces and non-obvious decisions.",
    },
    Rule {
        signal: Signal::TestCoveragePct,
        condition: Condition::Below,
        threshold: 50.0,
        priority: Priority::High,
        category: "testing",
        title: COVERAGE_TITLE,
        rationale: "Estimated test coverage is {value}, below {threshold}%. \
                    Add unit tests for critical business logic first.",
    },
    Rule {
        signal: Signal::TestCoveragePct,
        condition: Condition::Below,
        threshold: 70.0,
        priority: Priority::Medium,
        category: "testing",
        title: COVERAGE_TITLE,
        rationale: "Estimated test coverage is {value}, below {threshold}%. \
                    Extend tests to cover edge cases and integration paths.",
    },
    Rule {
        signal: Signal::DebtRatioPct,
        condition: Condition::Above,
        threshold: 40.0,
        priority: Priority::High,
        category: "debt",
        title: DEBT_TITLE,
        rationale: "The technical debt ratio is {value}, above {threshold}%. \
                    Reserve regular capacity for refactoring.",
    },
    Rule {
        signal: Signal::DebtRatioPct,
        condition: Condition::Above,
        threshold: 25.0,
        priority: Priority::Medium,
        category: "debt",
        title: DEBT_TITLE,
        rationale: "The technical debt ratio is {value}, above {threshold}%. \
                    Track debt items alongside feature work.",
    },
    Rule {
        signal: Signal::DecliningTrend,
        condition: Condition::Above,
        threshold: 0.5,
        priority: Priority::High,
        category: "activity",
        title: "Address declining development activity",
        rationale: "Commit activity in the most recent period is well below the earliest period. \
                    Confirm the project is staffed for ongoing maintenance.",
    },
    Rule {
        signal: Signal::ContributorsCount,
        condition: Condition::Below,
        threshold: 2.0,
        priority: Priority::Medium,
        category: "activity",
        title: "Reduce key-person risk",
        rationale: "{value} contributor(s) authored the analyzed history. \
                    Spread knowledge through reviews and pairing.",
    },
    Rule {
        signal: Signal::WeeklyAverage,
        condition: Condition::Below,
        threshold: 1.0,
        priority: Priority::Low,
        category: "activity",
        title: "Establish a regular development cadence",
        rationale: "The repository averages {value} commits per week. \
                    Smaller, more frequent changes are easier to review and release.",
    },
    Rule {
        signal: Signal::CriticalFiles,
        condition: Condition::Above,
        threshold: 0.0,
        priority: Priority::Medium,
        category: "debt",
        title: "Refactor the most critical files",
        rationale: "{value} file(s) breach complexity or maintainability limits, starting with {files}.",
    },
    Rule {
        signal: Signal::SkippedFiles,
        condition: Condition::Above,
        threshold: 0.0,
        priority: Priority::Low,
        category: "analysis",
        title: "Review files that could not be analyzed",
        rationale: "{value} file(s) were skipped as binary or not UTF-8 encoded. \
                    Exclude generated artifacts or convert them to text.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breach_is_relative() {
        let rule = &RULES[0];
        assert!((rule.breach(30.0) - 1.0).abs() < 1e-9);
        let skipped = RULES.iter().find(|r| r.signal == Signal::SkippedFiles).unwrap();
        assert_eq!(skipped.breach(3.0), 3.0);
    }

    #[test]
    fn test_conditions_are_strict() {
        assert!(!Condition::Above.holds(10.0, 10.0));
        assert!(!Condition::Below.holds(10.0, 10.0));
        assert!(Condition::Below.holds(9.99, 10.0));
    }

    #[test]
    fn test_format() {
        assert_eq!(Signal::CommentRatio.format(0.064), "6%");
        assert_eq!(Signal::ContributorsCount.format(1.0), "1");
        assert_eq!(Signal::CyclomaticComplexity.format(12.345), "12.3");
    }
}
