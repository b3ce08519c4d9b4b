//! Report Service
//!
//! Dashboard projections over the run ledger.

use ledger_core::dto::report::{
    DailyRunCount, EnvironmentRunCount, Overview, PipelinePerformance, ReportWindow,
    TypeSuccessRate,
};
use sqlx::PgPool;

use crate::repository::report_repository;

/// Longest look-back a report accepts
pub const MAX_WINDOW_DAYS: i32 = 3650;

/// Service error type
#[derive(Debug)]
pub enum ReportError {
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for ReportError {
    fn from(err: sqlx::Error) -> Self {
        ReportError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

pub async fn overview(pool: &PgPool, window: ReportWindow) -> Result<Overview> {
    let days = validate_window(window)?;
    Ok(report_repository::overview(pool, days).await?)
}

pub async fn success_by_type(pool: &PgPool, window: ReportWindow) -> Result<Vec<TypeSuccessRate>> {
    let days = validate_window(window)?;
    Ok(report_repository::success_by_type(pool, days).await?)
}

pub async fn runs_by_environment(
    pool: &PgPool,
    window: ReportWindow,
) -> Result<Vec<EnvironmentRunCount>> {
    let days = validate_window(window)?;
    Ok(report_repository::runs_by_environment(pool, days).await?)
}

pub async fn daily_counts(pool: &PgPool, window: ReportWindow) -> Result<Vec<DailyRunCount>> {
    let days = validate_window(window)?;
    Ok(report_repository::daily_counts(pool, days).await?)
}

pub async fn pipeline_performance(
    pool: &PgPool,
    window: ReportWindow,
) -> Result<Vec<PipelinePerformance>> {
    let days = validate_window(window)?;
    Ok(report_repository::pipeline_performance(pool, days).await?)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_window(window: ReportWindow) -> Result<i32> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window.days) {
        return Err(ReportError::ValidationError(format!(
            "Report window must be between 1 and {} days",
            MAX_WINDOW_DAYS
        )));
    }

    Ok(window.days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(validate_window(ReportWindow { days: 0 }).is_err());
        assert!(validate_window(ReportWindow { days: -7 }).is_err());
        assert!(validate_window(ReportWindow { days: MAX_WINDOW_DAYS + 1 }).is_err());
        assert_eq!(validate_window(ReportWindow { days: 30 }).unwrap(), 30);
        assert_eq!(validate_window(ReportWindow { days: 1 }).unwrap(), 1);
    }
}
