//! Reference code domain types
//!
//! System codes are the vocabulary every other table points at: run statuses,
//! pipeline types, environments and detail types. Codes are grouped by a
//! code type and addressed either by surrogate id or by `(code_type, common_cd)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known code types seeded by the server migrations
pub mod code_types {
    pub const STATUS: &str = "STATUS";
    pub const PIPELINE_TYPE: &str = "PIPELINE_TYPE";
    pub const PIPELINE_STATUS: &str = "PIPELINE_STATUS";
    pub const PIPELINE_ENVIRONMENT: &str = "PIPELINE_ENVIRONMENT";
    pub const PIPELINE_RUN_DETAIL_TYPE: &str = "PIPELINE_RUN_DETAIL_TYPE";
}

/// Grouping of system codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeType {
    pub code_type_cd: String,
    pub description: String,
}

/// A single reference value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCode {
    pub code_id: i64,
    pub code_type_cd: String,
    pub common_cd: String,
    pub description: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical form of a code mnemonic.
///
/// Codes are stored upper-case; callers may pass `dev` or ` Dev ` and still
/// resolve `DEV`.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
