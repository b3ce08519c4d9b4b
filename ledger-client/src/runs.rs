//! Run ledger endpoints

use crate::LedgerClient;
use crate::error::{ClientError, Result};
use ledger_core::domain::run::{PipelineRun, PipelineRunDetail, RunOutcome};
use ledger_core::dto::run::{
    AddRunDetail, AddedRunDetail, CompleteRun, CompletedRun, RunFilter, StartRun, StartedRun,
};

impl LedgerClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Start a run of the active pipeline tagged `pipeline_tag`
    ///
    /// The run is recorded in this client's environment.
    ///
    /// # Returns
    /// The new `pipeline_run_id`
    pub async fn start_run(&self, pipeline_tag: &str) -> Result<i64> {
        if pipeline_tag.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "pipeline tag cannot be empty".to_string(),
            ));
        }

        let req = StartRun {
            environment: self.environment.clone(),
            pipeline_tag: pipeline_tag.to_string(),
        };

        let response = self
            .client
            .post(self.url("/runs/start"))
            .json(&req)
            .send()
            .await?;

        let started: StartedRun = self.handle_response(response).await?;

        tracing::debug!(
            "Started run {} for tag {} in {}",
            started.pipeline_run_id,
            pipeline_tag,
            self.environment
        );

        Ok(started.pipeline_run_id)
    }

    /// Mark a run finished
    ///
    /// Fails with an `InvalidStateTransition` API error when the run was
    /// already completed; see [`ClientError::is_invalid_state_transition`].
    pub async fn complete_run(
        &self,
        run_id: i64,
        outcome: RunOutcome,
        description: Option<&str>,
    ) -> Result<bool> {
        let req = CompleteRun {
            outcome,
            description: description.map(str::to_string),
        };

        let response = self
            .client
            .post(self.url(&format!("/runs/{}/complete", run_id)))
            .json(&req)
            .send()
            .await?;

        let completed: CompletedRun = self.handle_response(response).await?;
        Ok(completed.completed)
    }

    /// Append a detail row to a run
    ///
    /// # Returns
    /// The new `detail_id`
    pub async fn add_run_detail(
        &self,
        run_id: i64,
        detail_type: &str,
        detail_data: &str,
        detail_desc: Option<&str>,
    ) -> Result<i64> {
        let req = AddRunDetail {
            detail_type: detail_type.to_string(),
            detail_data: detail_data.to_string(),
            detail_desc: detail_desc.map(str::to_string),
        };

        let response = self
            .client
            .post(self.url(&format!("/runs/{}/details", run_id)))
            .json(&req)
            .send()
            .await?;

        let added: AddedRunDetail = self.handle_response(response).await?;
        Ok(added.detail_id)
    }

    // =============================================================================
    // Run Reads
    // =============================================================================

    pub async fn get_run(&self, run_id: i64) -> Result<PipelineRun> {
        let response = self
            .client
            .get(self.url(&format!("/runs/{}", run_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List runs, newest first
    pub async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<PipelineRun>> {
        let response = self
            .client
            .get(self.url("/runs"))
            .query(filter)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Details of a run; with `latest` only the newest row per detail type
    pub async fn list_run_details(&self, run_id: i64, latest: bool) -> Result<Vec<PipelineRunDetail>> {
        let response = self
            .client
            .get(self.url(&format!("/runs/{}/details", run_id)))
            .query(&[("latest", latest)])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
