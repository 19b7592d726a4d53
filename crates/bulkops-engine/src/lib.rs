//! Bulk operation engine for bulkops.
//!
//! This crate runs an async per-item operation over a list of source items
//! in fixed-size batches, tracking each item's lifecycle, reporting progress
//! per settled item, and supporting cooperative cancellation and retry of
//! failed items.

mod batch;
mod engine;
mod operation;
mod state;

pub use engine::{BulkOperation, CompleteCallback, ProgressCallback};
pub use operation::{BoxFuture, ItemOperation};
pub use state::BulkSnapshot;

pub use bulkops_core::{
    BulkConfig, BulkError, BulkItem, BulkProgress, BulkResult, ItemFailure, ItemStatus, Result,
};
