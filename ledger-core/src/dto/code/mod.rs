//! Reference code DTOs

use serde::{Deserialize, Serialize};

/// Request to create a new code type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCodeType {
    pub code_type_cd: String,
    pub description: String,
}

/// Request to create a new system code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSystemCode {
    pub code_type_cd: String,
    pub common_cd: String,
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Editable attributes of a system code
///
/// The `(code_type_cd, common_cd)` identity is fixed once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSystemCode {
    pub description: String,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Rows of one kind that still reference a system code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDependent {
    pub kind: String,
    pub count: i64,
}

fn default_active() -> bool {
    true
}
