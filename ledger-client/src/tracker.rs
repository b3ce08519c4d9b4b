//! Run tracking for pipeline jobs
//!
//! [`track_run`] wraps a unit of work in the ledger lifecycle: start a run,
//! execute the job, then complete the run with the job's outcome. A failing
//! job gets an `ERROR_MESSAGE` detail and a `failure` completion carrying the
//! error text.

use async_trait::async_trait;
use ledger_core::domain::run::RunOutcome;
use std::future::Future;

use crate::LedgerClient;
use crate::error::ClientError;

/// Detail type recorded when a tracked job fails
pub const ERROR_MESSAGE_DETAIL: &str = "ERROR_MESSAGE";

/// The three ledger calls a pipeline job makes
#[async_trait]
pub trait RunLedger: Send + Sync {
    async fn start_run(&self, pipeline_tag: &str) -> Result<i64, ClientError>;

    async fn complete_run(
        &self,
        run_id: i64,
        outcome: RunOutcome,
        description: Option<&str>,
    ) -> Result<bool, ClientError>;

    async fn add_run_detail(
        &self,
        run_id: i64,
        detail_type: &str,
        detail_data: &str,
        detail_desc: Option<&str>,
    ) -> Result<i64, ClientError>;
}

#[async_trait]
impl RunLedger for LedgerClient {
    async fn start_run(&self, pipeline_tag: &str) -> Result<i64, ClientError> {
        LedgerClient::start_run(self, pipeline_tag).await
    }

    async fn complete_run(
        &self,
        run_id: i64,
        outcome: RunOutcome,
        description: Option<&str>,
    ) -> Result<bool, ClientError> {
        LedgerClient::complete_run(self, run_id, outcome, description).await
    }

    async fn add_run_detail(
        &self,
        run_id: i64,
        detail_type: &str,
        detail_data: &str,
        detail_desc: Option<&str>,
    ) -> Result<i64, ClientError> {
        LedgerClient::add_run_detail(self, run_id, detail_type, detail_data, detail_desc).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackError<E> {
    #[error("ledger error: {0}")]
    Ledger(#[from] ClientError),

    #[error("job failed: {0}")]
    Job(E),
}

/// Run `job` as a tracked run of the pipeline tagged `pipeline_tag`
///
/// The job receives the run id so it can append its own details. A job
/// error is returned as [`TrackError::Job`] after the run has been marked
/// failed; if the ledger rejects the completion that error wins instead.
pub async fn track_run<L, F, Fut, T, E>(
    ledger: &L,
    pipeline_tag: &str,
    job: F,
) -> Result<T, TrackError<E>>
where
    L: RunLedger + ?Sized,
    F: FnOnce(i64) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let run_id = ledger.start_run(pipeline_tag).await?;
    tracing::info!("Tracking run {} for {}", run_id, pipeline_tag);

    match job(run_id).await {
        Ok(value) => {
            ledger
                .complete_run(run_id, RunOutcome::Success, None)
                .await?;
            tracing::info!("Run {} completed", run_id);
            Ok(value)
        }
        Err(e) => {
            let message = e.to_string();
            tracing::warn!("Run {} failed: {}", run_id, message);

            if let Err(detail_err) = ledger
                .add_run_detail(run_id, ERROR_MESSAGE_DETAIL, &message, None)
                .await
            {
                tracing::warn!(
                    "Failed to record error detail for run {}: {}",
                    run_id,
                    detail_err
                );
            }

            ledger
                .complete_run(run_id, RunOutcome::Failure, Some(&message))
                .await?;

            Err(TrackError::Job(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start(String),
        Complete(i64, RunOutcome, Option<String>),
        Detail(i64, String, String),
    }

    #[derive(Default)]
    struct MockLedger {
        calls: Mutex<Vec<Call>>,
        fail_details: bool,
        reject_start: bool,
    }

    impl MockLedger {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RunLedger for MockLedger {
        async fn start_run(&self, pipeline_tag: &str) -> Result<i64, ClientError> {
            if self.reject_start {
                return Err(ClientError::api_error(
                    404,
                    r#"{"error":"no active pipeline","kind":"UnknownPipelineTag"}"#.to_string(),
                ));
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Start(pipeline_tag.to_string()));
            Ok(42)
        }

        async fn complete_run(
            &self,
            run_id: i64,
            outcome: RunOutcome,
            description: Option<&str>,
        ) -> Result<bool, ClientError> {
            self.calls.lock().unwrap().push(Call::Complete(
                run_id,
                outcome,
                description.map(str::to_string),
            ));
            Ok(true)
        }

        async fn add_run_detail(
            &self,
            run_id: i64,
            detail_type: &str,
            detail_data: &str,
            _detail_desc: Option<&str>,
        ) -> Result<i64, ClientError> {
            if self.fail_details {
                return Err(ClientError::api_error(503, "unavailable".to_string()));
            }
            self.calls.lock().unwrap().push(Call::Detail(
                run_id,
                detail_type.to_string(),
                detail_data.to_string(),
            ));
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_successful_job_completes_run() {
        let ledger = MockLedger::default();

        let result: Result<i32, TrackError<String>> =
            track_run(&ledger, "orders_v1", |run_id| async move {
                assert_eq!(run_id, 42);
                Ok(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(
            ledger.calls(),
            vec![
                Call::Start("orders_v1".to_string()),
                Call::Complete(42, RunOutcome::Success, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_job_records_error_and_fails_run() {
        let ledger = MockLedger::default();

        let result: Result<(), TrackError<String>> =
            track_run(&ledger, "orders_v1", |_| async { Err("disk full".to_string()) }).await;

        assert!(matches!(result, Err(TrackError::Job(ref msg)) if msg == "disk full"));
        assert_eq!(
            ledger.calls(),
            vec![
                Call::Start("orders_v1".to_string()),
                Call::Detail(42, "ERROR_MESSAGE".to_string(), "disk full".to_string()),
                Call::Complete(42, RunOutcome::Failure, Some("disk full".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_detail_failure_still_completes_run() {
        let ledger = MockLedger {
            fail_details: true,
            ..Default::default()
        };

        let result: Result<(), TrackError<String>> =
            track_run(&ledger, "orders_v1", |_| async { Err("boom".to_string()) }).await;

        assert!(matches!(result, Err(TrackError::Job(_))));
        assert_eq!(
            ledger.calls().last(),
            Some(&Call::Complete(42, RunOutcome::Failure, Some("boom".to_string())))
        );
    }

    #[tokio::test]
    async fn test_start_failure_skips_job() {
        let ledger = MockLedger {
            reject_start: true,
            ..Default::default()
        };
        let ran = Mutex::new(false);
        let ran_ref = &ran;

        let result: Result<(), TrackError<String>> =
            track_run(&ledger, "missing", move |_| async move {
                *ran_ref.lock().unwrap() = true;
                Ok(())
            })
            .await;

        match result {
            Err(TrackError::Ledger(e)) => assert!(e.is_not_found()),
            other => panic!("expected ledger error, got {:?}", other.map(|_| ())),
        }
        assert!(!*ran.lock().unwrap());
        assert!(ledger.calls().is_empty());
    }
}
