//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline definition
///
/// Code-valued attributes carry both the surrogate id (the stored foreign key)
/// and the resolved mnemonic for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub pipeline_id: i64,
    pub pipeline_name: String,
    pub pipeline_type_id: i64,
    pub pipeline_type: String,
    pub pipeline_status_id: i64,
    pub pipeline_status: String,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Binding of a pipeline to one environment (dev, test, prod...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEnvironment {
    pub environment_id: i64,
    pub pipeline_id: i64,
    pub env_code_id: i64,
    pub env_code: String,
    pub created_at: DateTime<Utc>,
}

/// Typed configuration value scoped to a pipeline environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDetail {
    pub detail_id: i64,
    pub pipeline_id: i64,
    pub environment_id: i64,
    pub env_code: String,
    pub detail_type_id: i64,
    pub detail_type: String,
    pub detail_desc: String,
    pub detail_data: Option<String>,
    pub created_at: DateTime<Utc>,
}
