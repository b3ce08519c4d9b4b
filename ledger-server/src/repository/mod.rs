//! Repository Module
//!
//! Data access layer for the ledger server.
//! Each repository handles database operations for a specific table family.

pub mod code;
pub mod detail;
pub mod environment;
pub mod pipeline;
pub mod report;
pub mod run;

// Re-export for convenience
pub use code as code_repository;
pub use detail as detail_repository;
pub use environment as environment_repository;
pub use pipeline as pipeline_repository;
pub use report as report_repository;
pub use run as run_repository;
