//! Observable engine state.

use bulkops_core::{BulkItem, BulkProgress, ItemStatus};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the engine's state.
///
/// Published through [`BulkOperation::subscribe`](crate::BulkOperation::subscribe)
/// on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSnapshot {
    /// Current items, in input order.
    pub items: Vec<BulkItem>,
    /// Whether a run is in progress.
    pub is_running: bool,
    /// Whether cancellation was requested for the current (or last) run.
    pub is_cancelled: bool,
}

impl BulkSnapshot {
    /// Aggregate progress over the current items.
    pub fn progress(&self) -> BulkProgress {
        BulkProgress::from_items(&self.items)
    }

    /// Number of items in the given state.
    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    /// Look up an item by id.
    pub fn item(&self, id: &str) -> Option<&BulkItem> {
        self.items.iter().find(|item| item.id == id)
    }
}
