//! Run ledger DTOs
//!
//! Bodies for the three ledger client calls and the run list filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::run::{RunOutcome, RunStatus};

/// Request to start a run of the pipeline carrying `pipeline_tag`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRun {
    /// `PIPELINE_ENVIRONMENT` common code the run executes in
    pub environment: String,
    pub pipeline_tag: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartedRun {
    pub pipeline_run_id: i64,
}

/// Request to move a run to its terminal status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRun {
    pub outcome: RunOutcome,
    /// Free text, typically a failure reason
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompletedRun {
    pub completed: bool,
}

/// Request to append a detail row to a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRunDetail {
    /// `PIPELINE_RUN_DETAIL_TYPE` common code
    pub detail_type: String,
    pub detail_data: String,
    #[serde(default)]
    pub detail_desc: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AddedRunDetail {
    pub detail_id: i64,
}

/// Filter for run listings; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunFilter {
    pub pipeline_id: Option<i64>,
    /// `PIPELINE_ENVIRONMENT` common code
    pub environment: Option<String>,
    pub status: Option<RunStatus>,
    pub started_after: Option<DateTime<Utc>>,
    pub started_before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}
