//! Core types for bulkops.
//!
//! This crate provides the data model shared by the bulk operation engine
//! and the UI state models: per-item tracking records, aggregate progress,
//! run results and engine configuration.

mod config;
mod error;
mod item;
mod progress;

pub use config::{BulkConfig, BulkConfigBuilder, BulkConfigBuilderError};
pub use error::{BulkError, ItemFailure, Result};
pub use item::{BulkItem, ItemStatus};
pub use progress::{BulkProgress, BulkResult};

/// Message recorded on an item whose failure carried no message of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Operation failed";
