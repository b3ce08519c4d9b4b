//! Ledger Server
//!
//! HTTP service that records pipeline runs against PostgreSQL.
//!
//! Layers, outermost first:
//! - `api`: axum handlers and error mapping
//! - `service`: validation and lifecycle rules
//! - `repository`: SQL for each entity
//! - `db`: connection pool and schema migrations

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
