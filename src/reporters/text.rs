//! Text (terminal) reporter with colors and formatting

use crate::models::{BenchmarkResult, Direction, HealthReport, Priority, Severity};
use anyhow::Result;

/// Grade colors (ANSI escape codes)
fn grade_color(grade: &str) -> &'static str {
    match grade {
        "A" => "\x1b[32m", // Green
        "B" => "\x1b[92m", // Light green
        "C" => "\x1b[33m", // Yellow
        "D" => "\x1b[91m", // Light red
        "F" => "\x1b[31m", // Red
        _ => "\x1b[0m",
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "\x1b[91m",   // Light red
        Priority::Medium => "\x1b[33m", // Yellow
        Priority::Low => "\x1b[34m",    // Blue
    }
}

fn priority_tag(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "[H]",
        Priority::Medium => "[M]",
        Priority::Low => "[L]",
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Render report as formatted terminal output
pub fn render(report: &HealthReport) -> Result<String> {
    let mut out = String::new();
    let repo = &report.repository;

    // Header
    let grade_c = grade_color(&report.grade);
    out.push_str(&format!(
        "\n{BOLD}Technical Health: {}/{}{RESET} {DIM}({}){RESET}\n",
        repo.owner, repo.name, repo.default_branch
    ));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Score: {BOLD}{}/100{RESET}  Grade: {grade_c}{BOLD}{}{RESET}\n\n",
        report.overall_score, report.grade
    ));

    out.push_str(&format!("{BOLD}SCORES{RESET}\n"));
    out.push_str(&format!(
        "  Quality: {}  Activity: {}  Debt: {}\n\n",
        format_score(report.sub_scores.quality),
        format_score(report.sub_scores.activity),
        format_score(report.sub_scores.debt)
    ));

    let q = &report.quality;
    out.push_str(&format!("{BOLD}QUALITY{RESET}\n"));
    out.push_str(&format!(
        "  Complexity: {:.1}  Maintainability: {:.1}  Comments: {:.0}%\n",
        q.cyclomatic_complexity,
        q.maintainability_index,
        q.comment_ratio * 100.0
    ));
    out.push_str(&format!(
        "  Test coverage: {:.0}% {DIM}(estimated from {} test files){RESET}\n",
        q.test_coverage_pct, q.test_files
    ));
    out.push_str(&format!(
        "  Files: {}  LOC: {}\n\n",
        q.files_analyzed, q.lines_of_code
    ));

    let a = &report.activity;
    out.push_str(&format!("{BOLD}ACTIVITY{RESET}\n"));
    out.push_str(&format!(
        "  Commits/week: {:.1}  Commits/month: {:.1}  Contributors: {}  Trend: {}\n",
        a.weekly_average, a.monthly_average, a.contributors_count, a.trend
    ));
    out.push_str(&format!(
        "  {DIM}{} commits, +{} -{}{RESET}\n\n",
        a.total_commits, a.total_additions, a.total_deletions
    ));

    let d = &report.debt;
    out.push_str(&format!("{BOLD}DEBT{RESET}\n"));
    out.push_str(&format!(
        "  Ratio: {:.1}%  Estimated effort: {:.0}h\n",
        d.debt_ratio_pct, d.estimated_hours
    ));
    for file in d.critical_files.iter().take(5) {
        let color = match file.severity {
            Severity::High => "\x1b[91m",
            Severity::Medium => "\x1b[33m",
        };
        out.push_str(&format!(
            "  {color}{:<6}{RESET} {:<40} {DIM}{}{RESET}\n",
            file.severity.to_string(),
            truncate(&file.path, 40),
            file.reason
        ));
    }
    let more = d.critical_files.len().saturating_sub(5);
    if more > 0 {
        out.push_str(&format!("  {DIM}...and {} more critical files{RESET}\n", more));
    }
    out.push('\n');

    if !report.benchmarks.is_empty() {
        out.push_str(&format!("{BOLD}BENCHMARKS{RESET}\n"));
        for b in &report.benchmarks {
            out.push_str(&format!("  {:<24} {}\n", b.metric_name, format_benchmark(b)));
        }
        out.push('\n');
    }

    if !report.recommendations.is_empty() {
        out.push_str(&format!("{BOLD}RECOMMENDATIONS{RESET}\n"));
        for (i, rec) in report.recommendations.iter().enumerate() {
            let color = priority_color(rec.priority);
            out.push_str(&format!(
                "  {DIM}{:>2}{RESET}  {color}{}{RESET}  {}\n",
                i + 1,
                priority_tag(rec.priority),
                rec.title
            ));
            out.push_str(&format!("           {DIM}{}{RESET}\n", rec.rationale));
        }
        out.push('\n');
    }

    let diag = &report.diagnostics;
    if diag.skipped_files > 0 {
        out.push_str(&format!(
            "{DIM}Skipped {} of {} files:{RESET}\n",
            diag.skipped_files, diag.files_considered
        ));
        for skipped in diag.skipped.iter().take(5) {
            out.push_str(&format!("  {DIM}{} ({}){RESET}\n", skipped.path, skipped.reason));
        }
    }
    out.push_str(&format!(
        "{DIM}Generated {}{RESET}\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    Ok(out)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let skip = s.chars().count() - (max - 3);
    format!("...{}", s.chars().skip(skip).collect::<String>())
}

fn format_benchmark(b: &BenchmarkResult) -> String {
    let better = match b.better {
        Direction::Higher => "higher is better",
        Direction::Lower => "lower is better",
    };
    match (b.percentile, b.peer_median) {
        (Some(p), Some(median)) => format!(
            "{:.2}  p{:.0}  {DIM}(peer median {:.2}, {}){RESET}",
            b.value, p, median, better
        ),
        _ => format!("{:.2}  {DIM}(no peer data){RESET}", b.value),
    }
}

/// Format score with color
fn format_score(score: f64) -> String {
    let color = if score >= 80.0 {
        "\x1b[32m"
    } else if score >= 60.0 {
        "\x1b[33m"
    } else {
        "\x1b[31m"
    };
    format!("{color}{:.0}{RESET}", score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_text_render_sections() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("acme/widgets"));
        assert!(out.contains("72/100"));
        assert!(out.contains("RECOMMENDATIONS"));
        assert!(out.contains("Increase automated test coverage"));
        assert!(out.contains("src/engine/core.py"));
        assert!(out.contains("no peer data"));
        assert!(out.contains("Skipped 1 of 43 files"));
    }

    #[test]
    fn test_text_render_empty_sections_omitted() {
        let mut report = test_report();
        report.recommendations.clear();
        report.benchmarks.clear();
        report.diagnostics = Default::default();
        let out = render(&report).unwrap();
        assert!(!out.contains("RECOMMENDATIONS"));
        assert!(!out.contains("BENCHMARKS"));
        assert!(!out.contains("Skipped"));
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate("short.py", 40), "short.py");
        let long = format!("{}/file.py", "a".repeat(60));
        let cut = truncate(&long, 20);
        assert_eq!(cut.chars().count(), 20);
        assert!(cut.ends_with("file.py"));
    }
}
