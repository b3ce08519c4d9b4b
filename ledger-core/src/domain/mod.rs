//! Core domain types
//!
//! This module contains the core domain structures used across the ledger crates.
//! These types represent the fundamental business entities and are shared between
//! the server (for persistence) and the client (for reporting and display).

pub mod code;
pub mod pipeline;
pub mod run;
