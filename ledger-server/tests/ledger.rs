//! Run ledger behaviour against a real PostgreSQL database
//!
//! Set `TEST_DATABASE_URL` to run these; they are skipped otherwise.

mod common;

use ledger_core::domain::run::{RunOutcome, RunStatus};
use ledger_core::dto::code::CreateSystemCode;
use ledger_core::dto::pipeline::CreatePipelineDetail;
use ledger_core::dto::run::{AddRunDetail, CompleteRun, RunFilter, StartRun};
use ledger_server::service::code_service::{self, CodeError};
use ledger_server::service::pipeline_service::{self, PipelineError};
use ledger_server::service::run_service::{self, RunError};
use serial_test::serial;
use sqlx::PgPool;

fn start(environment: &str, tag: &str) -> StartRun {
    StartRun {
        environment: environment.to_string(),
        pipeline_tag: tag.to_string(),
    }
}

fn complete(outcome: RunOutcome) -> CompleteRun {
    CompleteRun {
        outcome,
        description: None,
    }
}

fn detail(detail_type: &str, data: &str) -> AddRunDetail {
    AddRunDetail {
        detail_type: detail_type.to_string(),
        detail_data: data.to_string(),
        detail_desc: None,
    }
}

async fn run_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pipeline_run")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_ingest_orders_scenario() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let (pipeline, _) = common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;
    assert_eq!(pipeline.pipeline_type, "BATCH");
    assert_eq!(pipeline.pipeline_status, "ACTIVE");

    let run_id = run_service::start_run(&pool, start("dev", "orders_v1"))
        .await
        .unwrap();
    let run = run_service::get_run(&pool, run_id).await.unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.end_dt.is_none());
    assert_eq!(run.env_code, "DEV");

    let detail_id = run_service::add_run_detail(
        &pool,
        run_id,
        detail("CLOUDWATCH_LOG_LINK", "https://logs.example/orders/1"),
    )
    .await
    .unwrap();
    assert!(detail_id > 0);

    let completed = run_service::complete_run(&pool, run_id, complete(RunOutcome::Success))
        .await
        .unwrap();
    assert!(completed);

    let run = run_service::get_run(&pool, run_id).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    let end_dt = run.end_dt.expect("end_dt set on completion");

    let second = run_service::complete_run(&pool, run_id, complete(RunOutcome::Failure)).await;
    assert!(matches!(
        second,
        Err(RunError::InvalidStateTransition {
            from: RunStatus::Completed,
            to: RunStatus::Failed,
            ..
        })
    ));

    let run = run_service::get_run(&pool, run_id).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.end_dt, Some(end_dt));
}

#[tokio::test]
#[serial]
async fn test_failure_outcome_records_reason() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["PROD"]).await;

    let run_id = run_service::start_run(&pool, start("PROD", "orders_v1"))
        .await
        .unwrap();
    run_service::complete_run(
        &pool,
        run_id,
        CompleteRun {
            outcome: RunOutcome::Failure,
            description: Some("source bucket missing".to_string()),
        },
    )
    .await
    .unwrap();

    let run = run_service::get_run(&pool, run_id).await.unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.description.as_deref(), Some("source bucket missing"));
}

#[tokio::test]
#[serial]
async fn test_concurrent_completion_has_one_winner() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;
    let run_id = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        run_service::complete_run(&pool, run_id, complete(RunOutcome::Success)),
        run_service::complete_run(&pool, run_id, complete(RunOutcome::Failure)),
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);

    let expected = if a.is_ok() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(RunError::InvalidStateTransition { .. })));

    let run = run_service::get_run(&pool, run_id).await.unwrap();
    assert_eq!(run.status, expected);
    assert!(run.end_dt.is_some());
}

#[tokio::test]
#[serial]
async fn test_complete_missing_run_is_not_found() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let result = run_service::complete_run(&pool, 424_242, complete(RunOutcome::Success)).await;
    assert!(matches!(result, Err(RunError::NotFound(424_242))));
}

#[tokio::test]
#[serial]
async fn test_run_details_are_append_only() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;
    let run_id = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();

    for count in ["10", "20", "30"] {
        run_service::add_run_detail(&pool, run_id, detail("TOTAL_PROCESSED_COUNT", count))
            .await
            .unwrap();
    }
    run_service::add_run_detail(&pool, run_id, detail("START", "{}"))
        .await
        .unwrap();

    let all = run_service::list_run_details(&pool, run_id).await.unwrap();
    assert_eq!(all.len(), 4);
    let counts: Vec<&str> = all
        .iter()
        .filter(|d| d.detail_type == "TOTAL_PROCESSED_COUNT")
        .map(|d| d.detail_data.as_str())
        .collect();
    assert_eq!(counts, vec!["10", "20", "30"]);

    let latest = run_service::latest_run_details(&pool, run_id).await.unwrap();
    assert_eq!(latest.len(), 2);
    let processed = latest
        .iter()
        .find(|d| d.detail_type == "TOTAL_PROCESSED_COUNT")
        .unwrap();
    assert_eq!(processed.detail_data, "30");
}

#[tokio::test]
#[serial]
async fn test_details_allowed_after_completion() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;
    let run_id = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();
    run_service::complete_run(&pool, run_id, complete(RunOutcome::Success))
        .await
        .unwrap();

    let result =
        run_service::add_run_detail(&pool, run_id, detail("TOTAL_PROCESSED_COUNT", "99")).await;
    assert!(result.is_ok());
}

#[tokio::test]
#[serial]
async fn test_unknown_detail_type_is_rejected() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;
    let run_id = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();

    let result = run_service::add_run_detail(&pool, run_id, detail("NOT_A_TYPE", "x")).await;
    assert!(matches!(result, Err(RunError::UnknownCode(_))));
}

#[tokio::test]
#[serial]
async fn test_unknown_tag_creates_no_run() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;

    let result = run_service::start_run(&pool, start("DEV", "orders_v2")).await;
    assert!(matches!(result, Err(RunError::UnknownPipelineTag(_))));
    assert_eq!(run_count(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_inactive_pipeline_tag_does_not_resolve() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let mut req = common::pipeline_request("legacy_orders", "BATCH", Some("orders_legacy"));
    req.is_active = false;
    pipeline_service::create_pipeline(&pool, req).await.unwrap();

    let result = run_service::start_run(&pool, start("DEV", "orders_legacy")).await;
    assert!(matches!(result, Err(RunError::UnknownPipelineTag(_))));
}

#[tokio::test]
#[serial]
async fn test_shared_tag_is_ambiguous() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "orders_a", "orders", &["DEV"]).await;
    common::seed_pipeline(&pool, "orders_b", "orders", &["DEV"]).await;

    let result = run_service::start_run(&pool, start("DEV", "orders")).await;
    assert!(matches!(result, Err(RunError::AmbiguousPipelineTag(_))));
    assert_eq!(run_count(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_unbound_environment_is_rejected() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;

    let result = run_service::start_run(&pool, start("PROD", "orders_v1")).await;
    assert!(matches!(result, Err(RunError::EnvironmentNotBound { .. })));
}

#[tokio::test]
#[serial]
async fn test_each_start_creates_a_new_run() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let (pipeline, _) = common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;

    let first = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();
    let second = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();
    assert_ne!(first, second);

    let runs = run_service::list_runs(
        &pool,
        RunFilter {
            pipeline_id: Some(pipeline.pipeline_id),
            status: Some(RunStatus::Running),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(runs.len(), 2);
}

#[tokio::test]
#[serial]
async fn test_pipeline_delete_leaves_no_orphans() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let (pipeline, environments) =
        common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV", "PROD"]).await;
    let pipeline_id = pipeline.pipeline_id;

    pipeline_service::add_detail(
        &pool,
        pipeline_id,
        CreatePipelineDetail {
            environment_id: environments[0].environment_id,
            detail_type: "CLOUDWATCH_LOG_LINK".to_string(),
            detail_desc: "Log group".to_string(),
            detail_data: Some("/aws/glue/orders".to_string()),
        },
    )
    .await
    .unwrap();

    let run_id = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();
    run_service::add_run_detail(&pool, run_id, detail("START", "{}"))
        .await
        .unwrap();

    pipeline_service::delete_pipeline(&pool, pipeline_id)
        .await
        .unwrap();

    assert!(matches!(
        pipeline_service::get_pipeline(&pool, pipeline_id).await,
        Err(PipelineError::NotFound(_))
    ));
    assert!(matches!(
        pipeline_service::list_environments(&pool, pipeline_id).await,
        Err(PipelineError::NotFound(_))
    ));
    assert!(matches!(
        run_service::get_run(&pool, run_id).await,
        Err(RunError::NotFound(_))
    ));
    assert!(matches!(
        run_service::list_run_details(&pool, run_id).await,
        Err(RunError::NotFound(_))
    ));

    for table in [
        "pipeline_run_details",
        "pipeline_run",
        "pipeline_details",
        "pipeline_environment",
    ] {
        let remaining: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0, "orphans left in {}", table);
    }

    assert!(matches!(
        pipeline_service::delete_pipeline(&pool, pipeline_id).await,
        Err(PipelineError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_duplicate_environment_binding() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let (pipeline, _) = common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;

    let result = pipeline_service::add_environment(
        &pool,
        pipeline.pipeline_id,
        ledger_core::dto::pipeline::CreateEnvironment {
            env_code: "dev".to_string(),
        },
    )
    .await;
    assert!(matches!(
        result,
        Err(PipelineError::DuplicateEnvironment { .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_detail_environment_must_belong_to_pipeline() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let (first, _) = common::seed_pipeline(&pool, "orders", "orders_v1", &["DEV"]).await;
    let (_, other_envs) = common::seed_pipeline(&pool, "customers", "customers_v1", &["DEV"]).await;

    let result = pipeline_service::add_detail(
        &pool,
        first.pipeline_id,
        CreatePipelineDetail {
            environment_id: other_envs[0].environment_id,
            detail_type: "CLOUDWATCH_LOG_LINK".to_string(),
            detail_desc: "Log group".to_string(),
            detail_data: None,
        },
    )
    .await;
    assert!(matches!(result, Err(PipelineError::ValidationError(_))));
}

#[tokio::test]
#[serial]
async fn test_referenced_code_cannot_be_deleted() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let micro_batch = code_service::create_code(
        &pool,
        CreateSystemCode {
            code_type_cd: "pipeline_type".to_string(),
            common_cd: "micro_batch".to_string(),
            description: "Micro-batch pipeline".to_string(),
            sort_order: 3,
            is_active: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(micro_batch.common_cd, "MICRO_BATCH");

    let pipeline = pipeline_service::create_pipeline(
        &pool,
        common::pipeline_request("clickstream", "micro_batch", Some("clicks")),
    )
    .await
    .unwrap();

    let result = code_service::delete_code(&pool, micro_batch.code_id).await;
    match result {
        Err(CodeError::ReferencedByDependents { dependents, .. }) => {
            assert_eq!(dependents.len(), 1);
            assert_eq!(dependents[0].kind, "pipelines_by_type");
            assert_eq!(dependents[0].count, 1);
        }
        other => panic!("expected ReferencedByDependents, got {:?}", other),
    }

    pipeline_service::delete_pipeline(&pool, pipeline.pipeline_id)
        .await
        .unwrap();

    code_service::delete_code(&pool, micro_batch.code_id)
        .await
        .unwrap();
    assert!(matches!(
        code_service::get_code(&pool, micro_batch.code_id).await,
        Err(CodeError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_inactive_code_does_not_resolve() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let streaming = code_service::resolve(&pool, "PIPELINE_TYPE", "streaming")
        .await
        .unwrap();
    code_service::deactivate_code(&pool, streaming).await.unwrap();

    assert!(matches!(
        code_service::resolve(&pool, "PIPELINE_TYPE", "STREAMING").await,
        Err(CodeError::UnknownCode { .. })
    ));

    let result = pipeline_service::create_pipeline(
        &pool,
        common::pipeline_request("events", "STREAMING", None),
    )
    .await;
    assert!(matches!(result, Err(PipelineError::ValidationError(_))));
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_unknown_type_or_status_is_invalid() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let result = pipeline_service::create_pipeline(
        &pool,
        common::pipeline_request("x", "NOPE", Some("t")),
    )
    .await;
    assert!(matches!(result, Err(PipelineError::ValidationError(_))));

    let (pipeline, _) = common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;
    let mut req = common::pipeline_request("ingest_orders", "BATCH", Some("orders_v1"));
    req.pipeline_status = "PAUSED".to_string();

    let result = pipeline_service::update_pipeline(&pool, pipeline.pipeline_id, req).await;
    assert!(matches!(result, Err(PipelineError::ValidationError(_))));
}

#[tokio::test]
#[serial]
async fn test_run_lifecycle_survives_deactivated_status_codes() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;

    let first = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();

    for status in RunStatus::ALL {
        let code_id = code_service::resolve(&pool, "STATUS", status.as_code())
            .await
            .unwrap();
        code_service::deactivate_code(&pool, code_id).await.unwrap();
    }

    assert!(
        run_service::complete_run(&pool, first, complete(RunOutcome::Success))
            .await
            .unwrap()
    );
    assert_eq!(
        run_service::get_run(&pool, first).await.unwrap().status,
        RunStatus::Completed
    );

    let second = run_service::start_run(&pool, start("DEV", "orders_v1"))
        .await
        .unwrap();
    assert!(
        run_service::complete_run(&pool, second, complete(RunOutcome::Failure))
            .await
            .unwrap()
    );
    assert_eq!(
        run_service::get_run(&pool, second).await.unwrap().status,
        RunStatus::Failed
    );
}

#[tokio::test]
#[serial]
async fn test_start_racing_pipeline_delete_reports_unknown_tag() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let (pipeline, _) = common::seed_pipeline(&pool, "ingest_orders", "orders_v1", &["DEV"]).await;

    // Lock the pipeline and its binding so the run insert blocks on its foreign key checks
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SELECT pipeline_id FROM pipeline WHERE pipeline_id = $1 FOR UPDATE")
        .bind(pipeline.pipeline_id)
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::query("SELECT environment_id FROM pipeline_environment WHERE pipeline_id = $1 FOR UPDATE")
        .bind(pipeline.pipeline_id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let start_pool = pool.clone();
    let starter = tokio::spawn(async move {
        run_service::start_run(&start_pool, start("DEV", "orders_v1")).await
    });

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    sqlx::query("DELETE FROM pipeline_environment WHERE pipeline_id = $1")
        .bind(pipeline.pipeline_id)
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::query("DELETE FROM pipeline WHERE pipeline_id = $1")
        .bind(pipeline.pipeline_id)
        .execute(&mut *tx)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let result = starter.await.unwrap();
    assert!(matches!(result, Err(RunError::UnknownPipelineTag(_))));
    assert_eq!(run_count(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_duplicate_code_and_unknown_type() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let duplicate = code_service::create_code(
        &pool,
        CreateSystemCode {
            code_type_cd: "STATUS".to_string(),
            common_cd: "running".to_string(),
            description: "Running again".to_string(),
            sort_order: 0,
            is_active: true,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(CodeError::DuplicateCode(_))));

    let unknown_type = code_service::create_code(
        &pool,
        CreateSystemCode {
            code_type_cd: "TEST_REGION".to_string(),
            common_cd: "EU".to_string(),
            description: "Europe".to_string(),
            sort_order: 0,
            is_active: true,
        },
    )
    .await;
    assert!(matches!(unknown_type, Err(CodeError::UnknownCodeType(_))));
}
