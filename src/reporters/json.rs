//! JSON reporter
//!
//! Outputs the full HealthReport as pretty-printed JSON.
//! Field names are the stable payload contract renderers bind to.

use crate::models::HealthReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &HealthReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_json_render_valid() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["grade"], "C");
        assert_eq!(parsed["overall_score"], 72);
        assert_eq!(parsed["quality"]["maintainability_index"], 68.3);
        assert_eq!(parsed["debt"]["debt_ratio_pct"], 18.8);
        assert_eq!(parsed["commit_frequency"]["daily_average"], 0.8);
        assert_eq!(parsed["commit_frequency"]["trend"], "rising");
        assert_eq!(parsed["recommendations"][0]["priority"], "high");
    }

    #[test]
    fn test_json_missing_percentile_is_null() {
        let json_str = render(&test_report()).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert!(parsed["benchmarks"][1]["percentile"].is_null());
        assert_eq!(parsed["benchmarks"][0]["better"], "lower");
        assert_eq!(parsed["generated_at"], "2024-06-01T12:00:00Z");
    }
}
