//! Static peer reference table
//!
//! Each row holds the values observed at the 1st, 25th, 50th, 75th and 99th
//! percentiles of a peer population. Quality and debt rows are split by the
//! dominant language group, activity rows by codebase size.
//!
//! The table ships with the crate and changes only with a release, so two
//! reports produced by the same version are always comparable.

use super::{Bucket, MetricKind};
use super::Bucket::{Language as Lang, Size};
use super::LanguageGroup::{Managed, Scripting, Systems};
use super::MetricKind::*;
use super::SizeClass::{Large, Medium, Small};

/// Percentile ranks of the five breakpoints.
pub const BREAKPOINT_PERCENTILES: [f64; 5] = [1.0, 25.0, 50.0, 75.0, 99.0];

/// Peer distribution summarized by five breakpoints (non-decreasing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub breakpoints: [f64; 5],
}

impl Distribution {
    pub const fn new(breakpoints: [f64; 5]) -> Self {
        Self { breakpoints }
    }

    pub fn median(&self) -> f64 {
        self.breakpoints[2]
    }

    /// Percentile rank of `value` in 1-99.
    ///
    /// Linear between neighbouring breakpoints; values outside the table
    /// clamp to 1 or 99. Where several breakpoints share a value the lowest
    /// percentile wins.
    pub fn percentile_of(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let bp = &self.breakpoints;
        let pct = &BREAKPOINT_PERCENTILES;

        if value < bp[0] {
            return Some(pct[0]);
        }
        if value > bp[4] {
            return Some(pct[4]);
        }
        for i in 0..bp.len() {
            if value == bp[i] {
                return Some(pct[i]);
            }
            if i + 1 < bp.len() && value > bp[i] && value < bp[i + 1] {
                let fraction = (value - bp[i]) / (bp[i + 1] - bp[i]);
                return Some(pct[i] + fraction * (pct[i + 1] - pct[i]));
            }
        }
        Some(pct[4])
    }
}

pub struct ReferenceRow {
    pub metric: MetricKind,
    pub bucket: Bucket,
    pub distribution: Distribution,
}

const fn row(metric: MetricKind, bucket: Bucket, breakpoints: [f64; 5]) -> ReferenceRow {
    ReferenceRow {
        metric,
        bucket,
        distribution: Distribution::new(breakpoints),
    }
}

pub const REFERENCE_TABLE: &[ReferenceRow] = &[
    // Mean per-function cyclomatic complexity
    row(CyclomaticComplexity, Lang(Scripting), [1.2, 2.0, 3.0, 4.5, 9.0]),
    row(CyclomaticComplexity, Lang(Managed), [1.3, 2.2, 3.2, 5.0, 10.0]),
    row(CyclomaticComplexity, Lang(Systems), [1.5, 2.5, 3.8, 5.5, 12.0]),
    // Maintainability index
    row(MaintainabilityIndex, Lang(Scripting), [35.0, 55.0, 65.0, 75.0, 92.0]),
    row(MaintainabilityIndex, Lang(Managed), [30.0, 50.0, 62.0, 72.0, 90.0]),
    row(MaintainabilityIndex, Lang(Systems), [25.0, 45.0, 58.0, 70.0, 88.0]),
    // Comment lines / non-blank lines
    row(CommentRatio, Lang(Scripting), [0.01, 0.06, 0.10, 0.16, 0.35]),
    row(CommentRatio, Lang(Managed), [0.02, 0.08, 0.13, 0.20, 0.40]),
    row(CommentRatio, Lang(Systems), [0.02, 0.09, 0.15, 0.22, 0.45]),
    // Estimated test coverage
    row(TestCoveragePct, Lang(Scripting), [0.0, 20.0, 45.0, 75.0, 100.0]),
    row(TestCoveragePct, Lang(Managed), [0.0, 25.0, 50.0, 80.0, 100.0]),
    row(TestCoveragePct, Lang(Systems), [0.0, 15.0, 40.0, 70.0, 100.0]),
    // Debt ratio
    row(DebtRatioPct, Lang(Scripting), [8.0, 22.0, 32.0, 45.0, 70.0]),
    row(DebtRatioPct, Lang(Managed), [7.0, 20.0, 30.0, 42.0, 68.0]),
    row(DebtRatioPct, Lang(Systems), [9.0, 24.0, 35.0, 48.0, 72.0]),
    // Commits per week
    row(WeeklyAverage, Size(Small), [0.0, 0.5, 2.0, 6.0, 30.0]),
    row(WeeklyAverage, Size(Medium), [0.2, 2.0, 6.0, 15.0, 60.0]),
    row(WeeklyAverage, Size(Large), [1.0, 8.0, 20.0, 45.0, 150.0]),
    // Distinct authors
    row(ContributorsCount, Size(Small), [1.0, 1.0, 2.0, 4.0, 15.0]),
    row(ContributorsCount, Size(Medium), [1.0, 3.0, 6.0, 12.0, 60.0]),
    row(ContributorsCount, Size(Large), [2.0, 10.0, 25.0, 60.0, 400.0]),
];

/// Reference distribution for a metric in a bucket.
pub fn lookup(metric: MetricKind, bucket: Bucket) -> Option<&'static Distribution> {
    REFERENCE_TABLE
        .iter()
        .find(|r| r.metric == metric && r.bucket == bucket)
        .map(|r| &r.distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Bucketing;

    const SAMPLE: Distribution = Distribution::new([10.0, 20.0, 30.0, 40.0, 50.0]);

    #[test]
    fn test_breakpoints_are_non_decreasing() {
        for row in REFERENCE_TABLE {
            let bp = row.distribution.breakpoints;
            assert!(bp.windows(2).all(|w| w[0] <= w[1]), "{:?} {:?}", row.metric, row.bucket);
        }
    }

    #[test]
    fn test_every_metric_has_every_bucket() {
        for metric in MetricKind::all() {
            let buckets: Vec<Bucket> = match metric.bucketing() {
                Bucketing::LanguageGroup => {
                    [Scripting, Managed, Systems].iter().map(|g| Lang(*g)).collect()
                }
                Bucketing::SizeClass => [Small, Medium, Large].iter().map(|s| Size(*s)).collect(),
            };
            for bucket in buckets {
                assert!(lookup(*metric, bucket).is_some(), "{:?} {:?}", metric, bucket);
            }
        }
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(SAMPLE.percentile_of(10.0), Some(1.0));
        assert_eq!(SAMPLE.percentile_of(30.0), Some(50.0));
        assert_eq!(SAMPLE.percentile_of(35.0), Some(62.5));
        assert_eq!(SAMPLE.percentile_of(50.0), Some(99.0));
        assert_eq!(SAMPLE.median(), 30.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        assert_eq!(SAMPLE.percentile_of(-5.0), Some(1.0));
        assert_eq!(SAMPLE.percentile_of(1e9), Some(99.0));
        assert_eq!(SAMPLE.percentile_of(f64::NAN), None);
    }

    #[test]
    fn test_flat_segment_resolves_low() {
        let flat = Distribution::new([1.0, 1.0, 2.0, 4.0, 15.0]);
        assert_eq!(flat.percentile_of(1.0), Some(1.0));
        assert_eq!(flat.percentile_of(1.5), Some(37.5));
    }

    #[test]
    fn test_monotonic_in_value() {
        for row in REFERENCE_TABLE {
            let bp = row.distribution.breakpoints;
            let (lo, hi) = (bp[0] - 1.0, bp[4] + 1.0);
            let mut last = 0.0;
            for step in 0..=200 {
                let v = lo + (hi - lo) * step as f64 / 200.0;
                let p = row.distribution.percentile_of(v).unwrap();
                assert!((1.0..=99.0).contains(&p));
                assert!(p >= last, "{:?} not monotonic at {}", row.metric, v);
                last = p;
            }
        }
    }
}
