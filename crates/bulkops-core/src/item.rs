//! Per-item tracking records.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Lifecycle state of a single item within a run.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet attempted (or reverted after cancellation).
    #[default]
    Pending,
    /// Dispatched and awaiting its operation.
    Processing,
    /// The operation completed successfully.
    Success,
    /// The operation failed; see [`BulkItem::error`].
    Error,
}

impl ItemStatus {
    /// Whether the item has settled (success or error).
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// Tracking record for one source item during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    /// Caller-supplied identifier, unique within a run.
    pub id: String,
    /// Human-readable display name.
    pub label: String,
    /// Current lifecycle state.
    pub status: ItemStatus,
    /// Failure message, present only when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItem {
    /// Create a new pending item.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status: ItemStatus::Pending,
            error: None,
        }
    }

    /// Revert to the not-yet-attempted state.
    pub fn mark_pending(&mut self) {
        self.status = ItemStatus::Pending;
        self.error = None;
    }

    /// Mark as dispatched.
    pub fn mark_processing(&mut self) {
        self.status = ItemStatus::Processing;
        self.error = None;
    }

    /// Mark as successfully completed.
    pub fn mark_success(&mut self) {
        self.status = ItemStatus::Success;
        self.error = None;
    }

    /// Mark as failed with the given message.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = ItemStatus::Error;
        self.error = Some(message.into());
    }

    pub fn is_pending(&self) -> bool {
        self.status == ItemStatus::Pending
    }

    pub fn is_processing(&self) -> bool {
        self.status == ItemStatus::Processing
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == ItemStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_lifecycle() {
        let mut item = BulkItem::new("p-1", "Product 1");
        assert!(item.is_pending());

        item.mark_processing();
        assert!(item.is_processing());

        item.mark_error("boom");
        assert!(item.is_error());
        assert_eq!(item.error.as_deref(), Some("boom"));

        item.mark_pending();
        assert!(item.is_pending());
        assert!(item.error.is_none());

        item.mark_success();
        assert!(item.is_success());
        assert!(item.error.is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ItemStatus::Processing.to_string(), "processing");
        let name: &'static str = ItemStatus::Error.into();
        assert_eq!(name, "error");
        assert!(ItemStatus::Success.is_settled());
        assert!(!ItemStatus::Pending.is_settled());
    }
}
