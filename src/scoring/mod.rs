//! Health Scoring
//!
//! Combines the analyzer outputs into three sub-scores and one overall
//! 0-100 health score, then assembles the final [`HealthReport`].
//!
//! # Scoring Formula
//!
//! ```text
//! Overall = round(Quality × 0.40 + Activity × 0.30 + Debt × 0.30)
//!
//! Quality  = 0.40 × MI
//!          + 0.30 × clamp(100 - 5 × (CC - 1))
//!          + 0.15 × coverage
//!          + 0.15 × clamp(comment_ratio / 0.25 × 100)
//!
//! Activity = 0.60 × min(100, weekly × 10)
//!          + 0.25 × min(100, contributors × 20)
//!          + 0.15 × trend      (rising 100, flat 70, declining 30)
//!
//! Debt     = 100 - clamp(debt_ratio_pct)
//! ```
//!
//! Non-finite inputs count as 0. All weights are fixed so scores stay
//! comparable between repositories and between runs.
//!
//! # Grades
//!
//! - A: 90+
//! - B: 80-89
//! - C: 70-79
//! - D: 60-69
//! - F: below 60
//!
//! [`HealthReport`]: crate::models::HealthReport

mod health_scorer;

pub use health_scorer::{
    activity_score, debt_score, quality_score, HealthScorer, PillarWeights, ReportParts,
    ScoreComponent, ACTIVITY_COMPONENTS, QUALITY_COMPONENTS,
};
