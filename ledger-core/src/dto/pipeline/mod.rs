//! Pipeline catalog DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::pipeline::Pipeline;

/// Request to create or update a pipeline
///
/// `pipeline_type` and `pipeline_status` are common codes of the
/// `PIPELINE_TYPE` and `PIPELINE_STATUS` code types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipeline {
    pub pipeline_name: String,
    pub pipeline_type: String,
    pub pipeline_status: String,
    pub description: Option<String>,
    pub tag: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Pipeline row for listings, with its run count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub pipeline_id: i64,
    pub pipeline_name: String,
    pub pipeline_type: String,
    pub pipeline_status: String,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub run_count: i64,
}

impl PipelineSummary {
    pub fn from_pipeline(pipeline: Pipeline, run_count: i64) -> Self {
        Self {
            pipeline_id: pipeline.pipeline_id,
            pipeline_name: pipeline.pipeline_name,
            pipeline_type: pipeline.pipeline_type,
            pipeline_status: pipeline.pipeline_status,
            description: pipeline.description,
            tag: pipeline.tag,
            is_active: pipeline.is_active,
            created_at: pipeline.created_at,
            run_count,
        }
    }
}

/// Request to bind a pipeline to an environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEnvironment {
    /// `PIPELINE_ENVIRONMENT` common code, e.g. `DEV`
    pub env_code: String,
}

/// Request to add or replace a pipeline configuration detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipelineDetail {
    pub environment_id: i64,
    /// `PIPELINE_RUN_DETAIL_TYPE` common code
    pub detail_type: String,
    pub detail_desc: String,
    pub detail_data: Option<String>,
}

fn default_active() -> bool {
    true
}
