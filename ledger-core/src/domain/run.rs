//! Run ledger domain types
//!
//! A run is created already `RUNNING` and moves exactly once to a terminal
//! status (`COMPLETED` or `FAILED`). Details attached to a run are append-only;
//! readers that want the current value per detail type use [`latest_per_type`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Run status
///
/// Variants map one-to-one onto the `STATUS` system codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub const ALL: [RunStatus; 3] = [RunStatus::Running, RunStatus::Completed, RunStatus::Failed];

    /// The `STATUS` common code backing this status
    pub fn as_code(&self) -> &'static str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "RUNNING" => Some(RunStatus::Running),
            "COMPLETED" => Some(RunStatus::Completed),
            "FAILED" => Some(RunStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Running, RunStatus::Completed) | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunStatus::from_code(s).ok_or_else(|| format!("unknown run status: {}", s))
    }
}

/// Outcome reported by a pipeline when it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failure,
}

impl RunOutcome {
    /// Terminal status recorded for this outcome
    pub fn terminal_status(&self) -> RunStatus {
        match self {
            RunOutcome::Success => RunStatus::Completed,
            RunOutcome::Failure => RunStatus::Failed,
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "success"),
            RunOutcome::Failure => write!(f, "failure"),
        }
    }
}

impl FromStr for RunOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(RunOutcome::Success),
            "failure" => Ok(RunOutcome::Failure),
            other => Err(format!(
                "invalid outcome '{}': expected 'success' or 'failure'",
                other
            )),
        }
    }
}

/// One execution of a pipeline in one environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub pipeline_run_id: i64,
    pub pipeline_id: i64,
    pub pipeline_name: String,
    pub environment_id: i64,
    pub env_code: String,
    pub status: RunStatus,
    pub start_dt: DateTime<Utc>,
    pub end_dt: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl PipelineRun {
    /// Wall-clock duration of a finished run
    pub fn duration(&self) -> Option<Duration> {
        self.end_dt.map(|end| end - self.start_dt)
    }
}

/// Typed key/value attachment to a run (log links, processed counts...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunDetail {
    pub detail_id: i64,
    pub pipeline_run_id: i64,
    pub detail_type_id: i64,
    pub detail_type: String,
    pub detail_data: String,
    pub detail_desc: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PipelineRunDetail {
    /// Parse `detail_data` as JSON, if it is JSON
    pub fn data_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.detail_data).ok()
    }
}

/// Collapse run details to the most recent row per detail type.
///
/// Most recent means greatest `created_at`; rows sharing a timestamp are
/// ordered by `detail_id`, highest wins. Output is sorted by detail type.
pub fn latest_per_type<I>(details: I) -> Vec<PipelineRunDetail>
where
    I: IntoIterator<Item = PipelineRunDetail>,
{
    let mut latest: BTreeMap<String, PipelineRunDetail> = BTreeMap::new();

    for detail in details {
        match latest.get(&detail.detail_type) {
            Some(current)
                if (current.created_at, current.detail_id)
                    >= (detail.created_at, detail.detail_id) => {}
            _ => {
                latest.insert(detail.detail_type.clone(), detail);
            }
        }
    }

    latest.into_values().collect()
}
