//! Reporting projections
//!
//! Read-only aggregates over the run ledger used by dashboards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub active_pipelines: i64,
    pub runs_today: i64,
    /// Percentage of finished runs that completed, over `window_days`
    pub success_rate_pct: f64,
    pub active_codes: i64,
    pub window_days: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSuccessRate {
    pub pipeline_type: String,
    pub total_runs: i64,
    pub completed_runs: i64,
    pub success_rate_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentRunCount {
    pub environment: String,
    pub run_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRunCount {
    pub run_date: NaiveDate,
    pub completed: i64,
    pub failed: i64,
    pub running: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePerformance {
    pub pipeline_id: i64,
    pub pipeline_name: String,
    pub pipeline_type: String,
    pub total_runs: i64,
    pub completed_runs: i64,
    pub failed_runs: i64,
    pub running_runs: i64,
    pub avg_duration_minutes: Option<f64>,
}

/// Look-back window for aggregate reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportWindow {
    #[serde(default = "default_window_days")]
    pub days: i32,
}

impl Default for ReportWindow {
    fn default() -> Self {
        Self {
            days: default_window_days(),
        }
    }
}

fn default_window_days() -> i32 {
    30
}

/// Percentage of `completed` out of `total`, rounded to one decimal place.
///
/// An empty window reports 0.
pub fn success_rate_pct(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = completed as f64 * 100.0 / total as f64;
    (pct * 10.0).round() / 10.0
}
