//! Aggregate progress and run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{BulkItem, ItemStatus};

/// Aggregate progress derived from an item list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkProgress {
    /// Number of items in the run.
    pub total: usize,
    /// Number of settled items (`successful + failed`).
    pub completed: usize,
    /// Number of items that succeeded.
    pub successful: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Number of items currently dispatched.
    pub processing: usize,
    /// Number of items not yet attempted.
    pub pending: usize,
    /// Completion as a percentage (0.0 to 100.0).
    pub percentage: f64,
}

impl BulkProgress {
    /// Recompute progress from the given items.
    pub fn from_items(items: &[BulkItem]) -> Self {
        let mut progress = Self {
            total: items.len(),
            ..Self::default()
        };

        for item in items {
            match item.status {
                ItemStatus::Pending => progress.pending += 1,
                ItemStatus::Processing => progress.processing += 1,
                ItemStatus::Success => progress.successful += 1,
                ItemStatus::Error => progress.failed += 1,
            }
        }

        progress.completed = progress.successful + progress.failed;
        progress.percentage = if progress.total > 0 {
            (progress.completed as f64 / progress.total as f64) * 100.0
        } else {
            0.0
        };

        progress
    }

    /// Check if every item has settled.
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    /// Number of items in the run.
    pub total: usize,
    /// Number of items that succeeded.
    pub successful: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Snapshot of all items at the end of the run.
    pub items: Vec<BulkItem>,
    /// Whether the run was stopped by cancellation.
    pub cancelled: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub finished_at: DateTime<Utc>,
}

impl BulkResult {
    /// Build a result from the final item snapshot.
    pub fn from_items(items: Vec<BulkItem>, cancelled: bool, started_at: DateTime<Utc>) -> Self {
        let progress = BulkProgress::from_items(&items);
        Self {
            total: progress.total,
            successful: progress.successful,
            failed: progress.failed,
            items,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Check if the run settled every item without failure.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.successful == self.total
    }

    /// Number of items left unattempted.
    pub fn not_attempted(&self) -> usize {
        self.total - self.successful - self.failed
    }

    /// Ids of items that failed, in input order.
    pub fn failed_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.is_error())
            .map(|item| item.id.clone())
            .collect()
    }

    /// Recompute aggregate progress for this result.
    pub fn progress(&self) -> BulkProgress {
        BulkProgress::from_items(&self.items)
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        let mut summary = if self.failed == 0 {
            format!("{} succeeded", self.successful)
        } else {
            format!("{} succeeded, {} failed", self.successful, self.failed)
        };

        if self.cancelled {
            summary.push_str(&format!(" (cancelled, {} not attempted)", self.not_attempted()));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(statuses: &[ItemStatus]) -> Vec<BulkItem> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut item = BulkItem::new(format!("{i}"), format!("Item {i}"));
                item.status = *status;
                item
            })
            .collect()
    }

    #[test]
    fn test_progress_empty() {
        let progress = BulkProgress::from_items(&[]);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percentage, 0.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_counts() {
        let progress = BulkProgress::from_items(&items(&[
            ItemStatus::Success,
            ItemStatus::Error,
            ItemStatus::Processing,
            ItemStatus::Pending,
        ]));

        assert_eq!(progress.total, 4);
        assert_eq!(progress.successful, 1);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.processing, 1);
        assert_eq!(progress.pending, 1);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percentage, 50.0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_result_summary() {
        let result = BulkResult::from_items(
            items(&[ItemStatus::Success, ItemStatus::Error, ItemStatus::Success]),
            false,
            Utc::now(),
        );
        assert_eq!(result.summary(), "2 succeeded, 1 failed");
        assert_eq!(result.failed_ids(), vec!["1".to_string()]);
        assert!(!result.is_success());

        let cancelled = BulkResult::from_items(
            items(&[ItemStatus::Success, ItemStatus::Pending]),
            true,
            Utc::now(),
        );
        assert_eq!(cancelled.summary(), "1 succeeded (cancelled, 1 not attempted)");
        assert_eq!(cancelled.not_attempted(), 1);
    }
}
