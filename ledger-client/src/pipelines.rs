//! Pipeline catalog endpoints

use crate::LedgerClient;
use crate::error::Result;
use ledger_core::domain::pipeline::{Pipeline, PipelineDetail, PipelineEnvironment};
use ledger_core::dto::pipeline::{
    CreateEnvironment, CreatePipeline, CreatePipelineDetail, PipelineSummary,
};

impl LedgerClient {
    // =============================================================================
    // Pipelines
    // =============================================================================

    pub async fn create_pipeline(&self, req: CreatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .post(self.url("/pipelines"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List all pipelines with their run counts
    pub async fn list_pipelines(&self) -> Result<Vec<PipelineSummary>> {
        let response = self.client.get(self.url("/pipelines")).send().await?;
        self.handle_response(response).await
    }

    pub async fn get_pipeline(&self, pipeline_id: i64) -> Result<Pipeline> {
        let response = self
            .client
            .get(self.url(&format!("/pipelines/{}", pipeline_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn update_pipeline(&self, pipeline_id: i64, req: CreatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .put(self.url(&format!("/pipelines/{}", pipeline_id)))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline and everything recorded for it
    pub async fn delete_pipeline(&self, pipeline_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/pipelines/{}", pipeline_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Environments
    // =============================================================================

    pub async fn add_environment(
        &self,
        pipeline_id: i64,
        env_code: &str,
    ) -> Result<PipelineEnvironment> {
        let req = CreateEnvironment {
            env_code: env_code.to_string(),
        };

        let response = self
            .client
            .post(self.url(&format!("/pipelines/{}/environments", pipeline_id)))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn list_environments(&self, pipeline_id: i64) -> Result<Vec<PipelineEnvironment>> {
        let response = self
            .client
            .get(self.url(&format!("/pipelines/{}/environments", pipeline_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn remove_environment(&self, environment_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/environments/{}", environment_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Details
    // =============================================================================

    pub async fn add_detail(
        &self,
        pipeline_id: i64,
        req: CreatePipelineDetail,
    ) -> Result<PipelineDetail> {
        let response = self
            .client
            .post(self.url(&format!("/pipelines/{}/details", pipeline_id)))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn list_details(&self, pipeline_id: i64) -> Result<Vec<PipelineDetail>> {
        let response = self
            .client
            .get(self.url(&format!("/pipelines/{}/details", pipeline_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn update_detail(
        &self,
        detail_id: i64,
        req: CreatePipelineDetail,
    ) -> Result<PipelineDetail> {
        let response = self
            .client
            .put(self.url(&format!("/details/{}", detail_id)))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn delete_detail(&self, detail_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/details/{}", detail_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
