use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    pub ticker: String,
    pub company: String,
    /// Composite score scaled by 10 and rounded, so one decimal survives as an integer.
    pub score: i64,
    pub reason: String,
    pub rating: String,
    pub target_from: String,
    pub target_to: String,
    pub time: DateTime<Utc>,
    pub breakdown: ScoreBreakdown,
}

/// Raw (unweighted) sub-scores behind a recommendation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rating: f64,
    pub target: f64,
    pub temporal: f64,
    pub brokerage: f64,
    pub consensus: f64,
    pub bonus: f64,
    pub composite: f64,
}
