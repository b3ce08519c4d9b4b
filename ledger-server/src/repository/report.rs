//! Report Repository
//!
//! Read-only aggregate queries over the run ledger. Every windowed query
//! covers runs started on or after `CURRENT_DATE - days`.

use chrono::NaiveDate;
use ledger_core::dto::report::{
    DailyRunCount, EnvironmentRunCount, Overview, PipelinePerformance, TypeSuccessRate,
    success_rate_pct,
};
use sqlx::PgPool;

pub async fn overview(pool: &PgPool, days: i32) -> Result<Overview, sqlx::Error> {
    let row = sqlx::query_as::<_, OverviewRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM pipeline WHERE is_active) AS active_pipelines,
            (SELECT COUNT(*) FROM pipeline_run WHERE start_dt::date = CURRENT_DATE) AS runs_today,
            (SELECT COUNT(*)
               FROM pipeline_run r
               JOIN system_codes st ON st.code_id = r.status_id
              WHERE st.common_cd = 'COMPLETED'
                AND r.start_dt >= CURRENT_DATE - make_interval(days => $1)) AS window_completed,
            (SELECT COUNT(*)
               FROM pipeline_run
              WHERE start_dt >= CURRENT_DATE - make_interval(days => $1)) AS window_total,
            (SELECT COUNT(*) FROM system_codes WHERE is_active) AS active_codes
        "#,
    )
    .bind(days)
    .fetch_one(pool)
    .await?;

    Ok(Overview {
        active_pipelines: row.active_pipelines,
        runs_today: row.runs_today,
        success_rate_pct: success_rate_pct(row.window_completed, row.window_total),
        active_codes: row.active_codes,
        window_days: days,
    })
}

/// Success rate of finished runs per pipeline type, best first
pub async fn success_by_type(pool: &PgPool, days: i32) -> Result<Vec<TypeSuccessRate>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TypeCountRow>(
        r#"
        SELECT t.common_cd AS pipeline_type,
               COUNT(*) AS total_runs,
               COUNT(*) FILTER (WHERE st.common_cd = 'COMPLETED') AS completed_runs
        FROM pipeline_run r
        JOIN pipeline p ON p.pipeline_id = r.pipeline_id
        JOIN system_codes t ON t.code_id = p.pipeline_type_id
        JOIN system_codes st ON st.code_id = r.status_id
        WHERE r.start_dt >= CURRENT_DATE - make_interval(days => $1)
          AND st.common_cd IN ('COMPLETED', 'FAILED')
        GROUP BY t.common_cd
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    let mut rates: Vec<TypeSuccessRate> = rows
        .into_iter()
        .map(|r| TypeSuccessRate {
            success_rate_pct: success_rate_pct(r.completed_runs, r.total_runs),
            pipeline_type: r.pipeline_type,
            total_runs: r.total_runs,
            completed_runs: r.completed_runs,
        })
        .collect();

    rates.sort_by(|a, b| {
        b.success_rate_pct
            .total_cmp(&a.success_rate_pct)
            .then_with(|| a.pipeline_type.cmp(&b.pipeline_type))
    });

    Ok(rates)
}

pub async fn runs_by_environment(
    pool: &PgPool,
    days: i32,
) -> Result<Vec<EnvironmentRunCount>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EnvironmentCountRow>(
        r#"
        SELECT env.common_cd AS environment, COUNT(*) AS run_count
        FROM pipeline_run r
        JOIN pipeline_environment e ON e.environment_id = r.environment_id
        JOIN system_codes env ON env.code_id = e.env_code_id
        WHERE r.start_dt >= CURRENT_DATE - make_interval(days => $1)
        GROUP BY env.common_cd
        ORDER BY run_count DESC, environment
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| EnvironmentRunCount {
            environment: r.environment,
            run_count: r.run_count,
        })
        .collect())
}

pub async fn daily_counts(pool: &PgPool, days: i32) -> Result<Vec<DailyRunCount>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DailyCountRow>(
        r#"
        SELECT r.start_dt::date AS run_date,
               COUNT(*) FILTER (WHERE st.common_cd = 'COMPLETED') AS completed,
               COUNT(*) FILTER (WHERE st.common_cd = 'FAILED') AS failed,
               COUNT(*) FILTER (WHERE st.common_cd = 'RUNNING') AS running,
               COUNT(*) AS total
        FROM pipeline_run r
        JOIN system_codes st ON st.code_id = r.status_id
        WHERE r.start_dt >= CURRENT_DATE - make_interval(days => $1)
        GROUP BY r.start_dt::date
        ORDER BY run_date
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| DailyRunCount {
            run_date: r.run_date,
            completed: r.completed,
            failed: r.failed,
            running: r.running,
            total: r.total,
        })
        .collect())
}

/// Per-pipeline run counts, including pipelines with no runs in the window
pub async fn pipeline_performance(
    pool: &PgPool,
    days: i32,
) -> Result<Vec<PipelinePerformance>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PerformanceRow>(
        r#"
        SELECT p.pipeline_id, p.pipeline_name, t.common_cd AS pipeline_type,
               COUNT(r.pipeline_run_id) AS total_runs,
               COUNT(r.pipeline_run_id) FILTER (WHERE st.common_cd = 'COMPLETED') AS completed_runs,
               COUNT(r.pipeline_run_id) FILTER (WHERE st.common_cd = 'FAILED') AS failed_runs,
               COUNT(r.pipeline_run_id) FILTER (WHERE st.common_cd = 'RUNNING') AS running_runs,
               (AVG(EXTRACT(EPOCH FROM (r.end_dt - r.start_dt)) / 60)
                   FILTER (WHERE r.end_dt IS NOT NULL))::float8 AS avg_duration_minutes
        FROM pipeline p
        JOIN system_codes t ON t.code_id = p.pipeline_type_id
        LEFT JOIN pipeline_run r
               ON r.pipeline_id = p.pipeline_id
              AND r.start_dt >= CURRENT_DATE - make_interval(days => $1)
        LEFT JOIN system_codes st ON st.code_id = r.status_id
        GROUP BY p.pipeline_id, p.pipeline_name, t.common_cd
        ORDER BY p.pipeline_name, p.pipeline_id
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| PipelinePerformance {
            pipeline_id: r.pipeline_id,
            pipeline_name: r.pipeline_name,
            pipeline_type: r.pipeline_type,
            total_runs: r.total_runs,
            completed_runs: r.completed_runs,
            failed_runs: r.failed_runs,
            running_runs: r.running_runs,
            avg_duration_minutes: r.avg_duration_minutes,
        })
        .collect())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct OverviewRow {
    active_pipelines: i64,
    runs_today: i64,
    window_completed: i64,
    window_total: i64,
    active_codes: i64,
}

#[derive(sqlx::FromRow)]
struct TypeCountRow {
    pipeline_type: String,
    total_runs: i64,
    completed_runs: i64,
}

#[derive(sqlx::FromRow)]
struct EnvironmentCountRow {
    environment: String,
    run_count: i64,
}

#[derive(sqlx::FromRow)]
struct DailyCountRow {
    run_date: NaiveDate,
    completed: i64,
    failed: i64,
    running: i64,
    total: i64,
}

#[derive(sqlx::FromRow)]
struct PerformanceRow {
    pipeline_id: i64,
    pipeline_name: String,
    pipeline_type: String,
    total_runs: i64,
    completed_runs: i64,
    failed_runs: i64,
    running_runs: i64,
    avg_duration_minutes: Option<f64>,
}
