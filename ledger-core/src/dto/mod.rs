//! Data Transfer Objects for the ledger HTTP API
//!
//! Request and response bodies exchanged between the server and its callers
//! (external pipeline processes through the client, and the admin CLI).

pub mod code;
pub mod pipeline;
pub mod report;
pub mod run;
