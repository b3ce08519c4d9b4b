//! Reporting projections against a real PostgreSQL database
//!
//! Set `TEST_DATABASE_URL` to run these; they are skipped otherwise.

mod common;

use ledger_core::domain::run::RunOutcome;
use ledger_core::dto::report::ReportWindow;
use ledger_core::dto::run::{CompleteRun, StartRun};
use ledger_server::service::{report_service, run_service};
use serial_test::serial;
use sqlx::PgPool;

async fn finished_run(pool: &PgPool, environment: &str, tag: &str, outcome: RunOutcome) -> i64 {
    let run_id = run_service::start_run(
        pool,
        StartRun {
            environment: environment.to_string(),
            pipeline_tag: tag.to_string(),
        },
    )
    .await
    .unwrap();

    run_service::complete_run(
        pool,
        run_id,
        CompleteRun {
            outcome,
            description: None,
        },
    )
    .await
    .unwrap();

    run_id
}

#[tokio::test]
#[serial]
async fn test_overview_and_breakdowns() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV", "PROD"]).await;

    finished_run(&pool, "DEV", "orders_v1", RunOutcome::Success).await;
    finished_run(&pool, "DEV", "orders_v1", RunOutcome::Success).await;
    finished_run(&pool, "PROD", "orders_v1", RunOutcome::Failure).await;

    let window = ReportWindow::default();

    let overview = report_service::overview(&pool, window).await.unwrap();
    assert_eq!(overview.active_pipelines, 1);
    assert_eq!(overview.runs_today, 3);
    assert_eq!(overview.success_rate_pct, 66.7);
    assert_eq!(overview.window_days, 30);

    let by_type = report_service::success_by_type(&pool, window).await.unwrap();
    assert_eq!(by_type.len(), 1);
    assert_eq!(by_type[0].pipeline_type, "BATCH");
    assert_eq!(by_type[0].total_runs, 3);
    assert_eq!(by_type[0].completed_runs, 2);

    let by_env = report_service::runs_by_environment(&pool, window)
        .await
        .unwrap();
    assert_eq!(by_env[0].environment, "DEV");
    assert_eq!(by_env[0].run_count, 2);
    assert_eq!(by_env[1].environment, "PROD");

    let daily = report_service::daily_counts(&pool, window).await.unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].completed, 2);
    assert_eq!(daily[0].failed, 1);
    assert_eq!(daily[0].total, 3);

    let performance = report_service::pipeline_performance(&pool, window)
        .await
        .unwrap();
    assert_eq!(performance.len(), 1);
    assert_eq!(performance[0].total_runs, 3);
    assert_eq!(performance[0].failed_runs, 1);
    assert!(performance[0].avg_duration_minutes.is_some());
}

#[tokio::test]
#[serial]
async fn test_empty_ledger_reports_zero_success_rate() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let overview = report_service::overview(&pool, ReportWindow::default())
        .await
        .unwrap();
    assert_eq!(overview.runs_today, 0);
    assert_eq!(overview.success_rate_pct, 0.0);

    let performance = report_service::pipeline_performance(&pool, ReportWindow::default())
        .await
        .unwrap();
    assert!(performance.is_empty());
}
