//! Service Module
//!
//! Business logic layer for the ledger server.
//! Services validate requests, resolve codes and orchestrate repositories.

pub mod code;
pub mod pipeline;
pub mod report;
pub mod run;

// Re-export for convenience
pub use code as code_service;
pub use pipeline as pipeline_service;
pub use report as report_service;
pub use run as run_service;
