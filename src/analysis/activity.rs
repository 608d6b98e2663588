//! Commit frequency analyzer

use crate::models::{ActivityMetrics, CommitRecord, Trend};
use std::collections::BTreeMap;
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Relative change between the earliest and latest third of the history
/// that still counts as flat.
pub const TREND_BAND: f64 = 0.15;

/// Compute activity metrics. `commits` must be sorted by timestamp, which
/// [`crate::models::RepositorySnapshot`] guarantees.
pub fn analyze(commits: &[CommitRecord]) -> ActivityMetrics {
    let (Some(first), Some(last)) = (commits.first(), commits.last()) else {
        return ActivityMetrics::default();
    };

    let raw_span_days = (last.timestamp - first.timestamp).num_seconds().max(0) as f64 / SECONDS_PER_DAY;
    let span_days = raw_span_days.max(1.0);
    let total = commits.len();
    let daily_average = total as f64 / span_days;

    let mut commit_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for commit in commits {
        *commit_distribution.entry(commit.author_identity.clone()).or_default() += 1;
    }

    let metrics = ActivityMetrics {
        daily_average,
        weekly_average: daily_average * 7.0,
        monthly_average: daily_average * 30.0,
        contributors_count: commit_distribution.len(),
        trend: trend(commits, raw_span_days),
        total_commits: total,
        total_additions: commits.iter().map(|c| c.additions).sum(),
        total_deletions: commits.iter().map(|c| c.deletions).sum(),
        commit_distribution,
    };
    debug!(
        "Activity: {} commits over {:.1} days, {} contributors, {}",
        total, span_days, metrics.contributors_count, metrics.trend
    );
    metrics
}

/// Compare commit counts in the earliest and latest thirds of the span.
fn trend(commits: &[CommitRecord], raw_span_days: f64) -> Trend {
    let Some(first) = commits.first() else {
        return Trend::Flat;
    };
    if raw_span_days <= 0.0 {
        return Trend::Flat;
    }

    let offset = |c: &CommitRecord| (c.timestamp - first.timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
    let early = commits.iter().filter(|c| offset(c) <= raw_span_days / 3.0).count() as f64;
    let recent = commits
        .iter()
        .filter(|c| offset(c) >= raw_span_days * 2.0 / 3.0)
        .count() as f64;

    if early == 0.0 {
        return if recent > 0.0 { Trend::Rising } else { Trend::Flat };
    }
    if recent > early * (1.0 + TREND_BAND) {
        Trend::Rising
    } else if recent < early * (1.0 - TREND_BAND) {
        Trend::Declining
    } else {
        Trend::Flat
    }
}
