//! End-to-end tests of the analysis pipeline over in-memory snapshots.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::time::Duration;
use techhealth::models::{
    CommitRecord, DebtAssessment, FileRecord, HealthReport, RepositoryId, RepositorySnapshot, SubScores, Trend,
};
use techhealth::pipeline::{AnalyzeRequest, Engine, EngineError};
use techhealth::provider::{CancelToken, Credentials, ProviderError, SnapshotCache, StaticProvider};
use techhealth::scoring::{debt_score, HealthScorer};

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// 50 non-blank lines: 10 comments, one function with 7 branches (CC 8).
fn scenario_source(n: usize) -> String {
    let mut src = String::new();
    for i in 0..10 {
        src.push_str(&format!("# module {} note {}\n", n, i));
    }
    src.push_str("def handle(x):\n");
    for i in 0..24 {
        src.push_str(&format!("    y{} = x + {}\n", i, i));
    }
    for i in 0..7 {
        src.push_str(&format!("    if x == {}:\n        return y{}\n", i, i));
    }
    src.push_str("    return 0\n");
    src
}

fn scenario_files() -> Vec<FileRecord> {
    (0..10)
        .map(|i| {
            let path = if i < 3 {
                format!("tests/test_mod{}.py", i)
            } else {
                format!("pkg/mod{}.py", i)
            };
            FileRecord::new(path, scenario_source(i).into_bytes()).unwrap()
        })
        .collect()
}

/// 50 commits by 3 authors, evenly spread over exactly 30 days.
fn scenario_commits() -> Vec<CommitRecord> {
    let span = 30 * 86_400;
    (0..50)
        .map(|i: i64| CommitRecord {
            sha: format!("{:040x}", i),
            author_identity: format!("dev{}@example.com", i % 3),
            timestamp: start() + ChronoDuration::seconds(i * span / 49),
            additions: 10,
            deletions: 2,
        })
        .collect()
}

fn snapshot(files: Vec<FileRecord>, commits: Vec<CommitRecord>) -> RepositorySnapshot {
    RepositorySnapshot::new(RepositoryId::new("acme", "widgets"), "main", files, commits, Utc::now())
}

fn request() -> AnalyzeRequest {
    AnalyzeRequest::new("acme", "widgets", Credentials::anonymous())
}

#[test]
fn test_scenario_metrics_and_reproducibility() {
    let engine = Engine::new(
        StaticProvider::new().with_snapshot(snapshot(scenario_files(), scenario_commits())),
    );

    let first = engine.analyze_at(&request(), generated_at()).unwrap();
    let second = engine.analyze_at(&request(), generated_at()).unwrap();

    assert_eq!(first.quality.lines_of_code, 500);
    assert_eq!(first.quality.files_analyzed, 10);
    assert_eq!(first.quality.test_files, 3);
    assert!((first.quality.cyclomatic_complexity - 8.0).abs() < 1e-9);
    assert!((first.quality.comment_ratio - 0.2).abs() < 1e-9);
    assert!((first.quality.test_coverage_pct - 60.0).abs() < 1e-9);

    assert_eq!(first.activity.total_commits, 50);
    assert_eq!(first.activity.contributors_count, 3);
    assert!((first.activity.daily_average - 50.0 / 30.0).abs() < 1e-9);
    assert_eq!(first.diagnostics.commits_analyzed, 50);

    assert_eq!(
        first.debt.debt_ratio_pct.to_bits(),
        second.debt.debt_ratio_pct.to_bits()
    );
    assert_eq!(first.overall_score, second.overall_score);
    assert!(first.overall_score <= 100);
    assert_eq!(first.overall_score, HealthScorer::new().overall(&first.sub_scores));
    assert_eq!(first.grade, HealthReport::grade_from_score(first.overall_score));
}

#[test]
fn test_determinism_apart_from_timestamp() {
    let engine = Engine::new(
        StaticProvider::new().with_snapshot(snapshot(scenario_files(), scenario_commits())),
    );
    let a = engine.analyze_at(&request(), generated_at()).unwrap();
    let b = engine.analyze_at(&request(), generated_at()).unwrap();
    assert_eq!(a, b);

    let later = engine
        .analyze_at(&request(), generated_at() + ChronoDuration::hours(1))
        .unwrap();
    assert_ne!(a.generated_at, later.generated_at);
    assert_eq!(a.overall_score, later.overall_score);
    assert_eq!(a.recommendations, later.recommendations);
    assert_eq!(a.benchmarks, later.benchmarks);
}

#[test]
fn test_zero_commits_is_flat_and_zero() {
    let engine = Engine::new(StaticProvider::new().with_snapshot(snapshot(scenario_files(), Vec::new())));
    let report = engine.analyze_at(&request(), generated_at()).unwrap();

    let activity = &report.activity;
    assert_eq!(activity.daily_average, 0.0);
    assert_eq!(activity.weekly_average, 0.0);
    assert_eq!(activity.monthly_average, 0.0);
    assert_eq!(activity.contributors_count, 0);
    assert_eq!(activity.total_commits, 0);
    assert_eq!(activity.trend, Trend::Flat);
    assert!(activity.commit_distribution.is_empty());
}

#[test]
fn test_zero_files_uses_neutral_defaults() {
    let engine = Engine::new(StaticProvider::new().with_snapshot(snapshot(Vec::new(), scenario_commits())));
    let report = engine.analyze_at(&request(), generated_at()).unwrap();

    assert_eq!(report.quality.lines_of_code, 0);
    assert_eq!(report.quality.cyclomatic_complexity, 1.0);
    assert_eq!(report.quality.maintainability_index, 50.0);
    assert!(report.debt.debt_ratio_pct.is_finite());
    assert!(report.sub_scores.quality.is_finite());
    assert!(report.overall_score <= 100);
    assert!(report.debt.critical_files.is_empty());
}

#[test]
fn test_more_complexity_never_raises_maintainability() {
    let analyze = |source: &str| {
        let file = FileRecord::new("pkg/calc.py", source.as_bytes().to_vec()).unwrap();
        let engine = Engine::new(StaticProvider::new().with_snapshot(snapshot(vec![file], Vec::new())));
        engine.analyze_at(&request(), generated_at()).unwrap()
    };

    let plain = analyze("x = a + b\n");
    let branchy = analyze("x = a and b\n");
    assert!(branchy.quality.cyclomatic_complexity > plain.quality.cyclomatic_complexity);
    assert!(branchy.quality.maintainability_index <= plain.quality.maintainability_index);
}

#[test]
fn test_overall_score_is_clamped() {
    let scorer = HealthScorer::new();
    let extremes = [
        SubScores { quality: 1e9, activity: 1e9, debt: 1e9 },
        SubScores { quality: -1e9, activity: -5.0, debt: f64::NEG_INFINITY },
        SubScores { quality: f64::NAN, activity: 100.0, debt: 100.0 },
    ];
    for sub in &extremes {
        assert!(scorer.overall(sub) <= 100);
    }

    let malformed = DebtAssessment {
        debt_ratio_pct: 250.0,
        estimated_hours: 0.0,
        critical_files: Vec::new(),
        by_category: Vec::new(),
    };
    assert_eq!(debt_score(&malformed), 0.0);
}

#[test]
fn test_percentiles_are_sound() {
    let engine = Engine::new(
        StaticProvider::new().with_snapshot(snapshot(scenario_files(), scenario_commits())),
    );
    let report = engine.analyze_at(&request(), generated_at()).unwrap();

    assert!(!report.benchmarks.is_empty());
    for b in &report.benchmarks {
        let p = b.percentile.expect("python repository has peer data");
        assert!((1.0..=99.0).contains(&p), "{} -> {}", b.metric_name, p);
    }
}

#[test]
fn test_one_unreadable_file_of_twenty_is_skipped() {
    let mut files: Vec<FileRecord> = (0..19)
        .map(|i| FileRecord::new(format!("pkg/m{:02}.py", i), scenario_source(i).into_bytes()).unwrap())
        .collect();
    files.push(FileRecord::new("pkg/broken.py", vec![b'x', b' ', b'=', b' ', 0xff, 0xfe, b'\n']).unwrap());

    let engine = Engine::new(StaticProvider::new().with_snapshot(snapshot(files, scenario_commits())));
    let report = engine.analyze_at(&request(), generated_at()).unwrap();

    assert_eq!(report.diagnostics.skipped_files, 1);
    assert_eq!(report.diagnostics.files_considered, 20);
    assert_eq!(report.diagnostics.skipped[0].path, "pkg/broken.py");
    assert_eq!(report.quality.files_analyzed, 19);
    assert_eq!(report.quality.lines_of_code, 19 * 50);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.metric == "skipped_files"));
}

#[test]
fn test_rate_limit_is_retried_once() {
    let provider = StaticProvider::new()
        .with_snapshot(snapshot(scenario_files(), scenario_commits()))
        .fail_next(ProviderError::RateLimited {
            retry_after: Duration::from_millis(20),
        });
    let engine = Engine::new(provider);

    let report = engine.analyze_at(&request(), generated_at()).unwrap();
    assert_eq!(report.quality.files_analyzed, 10);
    assert_eq!(engine.provider().calls(), 2);
}

#[test]
fn test_second_rate_limit_propagates() {
    let limited = || ProviderError::RateLimited {
        retry_after: Duration::from_millis(10),
    };
    let provider = StaticProvider::new()
        .with_snapshot(snapshot(scenario_files(), scenario_commits()))
        .fail_next(limited())
        .fail_next(limited());
    let engine = Engine::new(provider);

    let err = engine.analyze_at(&request(), generated_at()).unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_millis(10)));
    assert_eq!(engine.provider().calls(), 2);
}

#[test]
fn test_long_rate_limit_is_not_waited_out() {
    let provider = StaticProvider::new()
        .with_snapshot(snapshot(scenario_files(), scenario_commits()))
        .fail_next(ProviderError::RateLimited {
            retry_after: Duration::from_secs(3600),
        });
    let engine = Engine::new(provider).with_max_retry_wait(Duration::from_secs(5));

    let err = engine.analyze_at(&request(), generated_at()).unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3600)));
    assert_eq!(engine.provider().calls(), 1);
}

#[test]
fn test_auth_failure_is_not_retried() {
    let provider = StaticProvider::new()
        .with_snapshot(snapshot(scenario_files(), scenario_commits()))
        .fail_next(ProviderError::Auth("bad credentials".into()));
    let engine = Engine::new(provider);

    let err = engine.analyze_at(&request(), generated_at()).unwrap_err();
    assert!(matches!(err.provider_error(), Some(ProviderError::Auth(_))));
    assert!(err.to_string().contains("acme/widgets"));
    assert_eq!(engine.provider().calls(), 1);
}

#[test]
fn test_cancelled_request_produces_no_report() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let engine = Engine::new(
        StaticProvider::new().with_snapshot(snapshot(scenario_files(), scenario_commits())),
    )
    .with_cancel(cancel);

    let err = engine.analyze_at(&request(), generated_at()).unwrap_err();
    assert!(matches!(err.provider_error(), Some(ProviderError::Cancelled)));
}

#[test]
fn test_unknown_repository_is_not_found() {
    let engine = Engine::new(StaticProvider::new());
    let err = engine.analyze_at(&request(), generated_at()).unwrap_err();
    assert!(matches!(err.provider_error(), Some(ProviderError::NotFound(_))));
}

#[test]
fn test_invalid_names_rejected_before_fetch() {
    let engine = Engine::new(StaticProvider::new());
    for (owner, repo) in [("", "widgets"), ("acme", ""), ("ac me", "widgets"), ("acme", "../etc")] {
        let request = AnalyzeRequest::new(owner, repo, Credentials::anonymous());
        let err = engine.analyze_at(&request, generated_at()).unwrap_err();
        assert!(matches!(err, EngineError::Input { .. }), "{}/{}", owner, repo);
    }
    assert_eq!(engine.provider().calls(), 0);
}

#[test]
fn test_cached_snapshot_is_reused() {
    let engine = Engine::new(
        StaticProvider::new().with_snapshot(snapshot(scenario_files(), scenario_commits())),
    )
    .with_cache(SnapshotCache::new(Duration::from_secs(300)));

    let fresh = request().reuse_within(Duration::from_secs(60));
    let first = engine.analyze_at(&fresh, generated_at()).unwrap();
    let second = engine.analyze_at(&fresh, generated_at()).unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.provider().calls(), 1);

    // Without a freshness bound the cache is bypassed
    engine.analyze_at(&request(), generated_at()).unwrap();
    assert_eq!(engine.provider().calls(), 2);
}
