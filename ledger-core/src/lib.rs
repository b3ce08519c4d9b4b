//! Ledger Core
//!
//! Core types and abstractions for the pipeline run ledger.
//!
//! This crate contains:
//! - Domain types: Core business entities (SystemCode, Pipeline, PipelineRun, etc.)
//! - DTOs: Data transfer objects shared by the server, client and CLI

pub mod domain;
pub mod dto;
