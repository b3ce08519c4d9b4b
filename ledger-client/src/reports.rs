//! Reporting endpoints

use crate::LedgerClient;
use crate::error::Result;
use ledger_core::dto::report::{
    DailyRunCount, EnvironmentRunCount, Overview, PipelinePerformance, TypeSuccessRate,
};
use serde::de::DeserializeOwned;

impl LedgerClient {
    async fn report<T: DeserializeOwned>(&self, name: &str, days: i32) -> Result<T> {
        let response = self
            .client
            .get(self.url(&format!("/reports/{}", name)))
            .query(&[("days", days)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn report_overview(&self, days: i32) -> Result<Overview> {
        self.report("overview", days).await
    }

    pub async fn report_success_by_type(&self, days: i32) -> Result<Vec<TypeSuccessRate>> {
        self.report("by-type", days).await
    }

    pub async fn report_runs_by_environment(&self, days: i32) -> Result<Vec<EnvironmentRunCount>> {
        self.report("by-environment", days).await
    }

    pub async fn report_daily_counts(&self, days: i32) -> Result<Vec<DailyRunCount>> {
        self.report("daily", days).await
    }

    pub async fn report_pipeline_performance(
        &self,
        days: i32,
    ) -> Result<Vec<PipelinePerformance>> {
        self.report("pipelines", days).await
    }
}
