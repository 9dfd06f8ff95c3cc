//! Fulltext Server Library
//!
//! Loads page-level EDM fulltext annotation documents and serves them as
//! IIIF Presentation v2/v3 annotation pages with ETag-based conditional
//! requests.
//!
//! # Modules
//!
//! - `loader`: streaming XML parser and batch ingestion
//! - `cache`: ETags, preconditions and conditional responses
//! - `iiif`: format negotiation and JSON-LD templates
//! - `db`: SQLite page repository

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod iiif;
pub mod loader;
pub mod model;
pub mod routes;
pub mod state;
