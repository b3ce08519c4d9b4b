//! ID resolver module
//!
//! Resolves pipeline tags to pipeline ids by querying the API, so users can
//! address a pipeline by the tag its jobs use.

use anyhow::{Context, Result, anyhow};
use ledger_client::LedgerClient;
use ledger_core::dto::pipeline::PipelineSummary;

use crate::types::PipelineRef;

/// Resolve a pipeline id or tag to a pipeline id
///
/// Ids are returned as-is. Tags are matched against active pipelines first,
/// then against all pipelines.
///
/// # Errors
/// Returns an error if:
/// - No pipeline carries the tag
/// - Multiple pipelines carry the tag (ambiguous)
/// - API call fails
pub async fn resolve_pipeline_id(client: &LedgerClient, pipeline: &PipelineRef) -> Result<i64> {
    let tag = match pipeline {
        PipelineRef::Id(id) => return Ok(*id),
        PipelineRef::Tag(tag) => tag,
    };

    let pipelines = client
        .list_pipelines()
        .await
        .context("Failed to fetch pipelines for tag resolution")?;

    match_tag(&pipelines, tag)
}

fn match_tag(pipelines: &[PipelineSummary], tag: &str) -> Result<i64> {
    let tagged: Vec<_> = pipelines
        .iter()
        .filter(|p| p.tag.as_deref() == Some(tag))
        .collect();

    let active: Vec<_> = tagged.iter().filter(|p| p.is_active).collect();
    let candidates: Vec<i64> = if active.is_empty() {
        tagged.iter().map(|p| p.pipeline_id).collect()
    } else {
        active.iter().map(|p| p.pipeline_id).collect()
    };

    match candidates.as_slice() {
        [] => Err(anyhow!("No pipeline found with tag '{}'", tag)),
        [id] => Ok(*id),
        ids => Err(anyhow!(
            "Ambiguous tag '{}' matches multiple pipelines: {}",
            tag,
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}
