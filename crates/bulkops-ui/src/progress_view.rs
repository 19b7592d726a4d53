//! Read-only view over a run's items for a progress modal.

use bulkops_core::{BulkItem, BulkProgress, ItemStatus};
use serde::Serialize;

/// Number of items in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub success: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn get(&self, status: ItemStatus) -> usize {
        match status {
            ItemStatus::Pending => self.pending,
            ItemStatus::Processing => self.processing,
            ItemStatus::Success => self.success,
            ItemStatus::Error => self.error,
        }
    }
}

/// One line of the per-item status list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressRow<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub status: ItemStatus,
    pub error: Option<&'a str>,
}

/// Presentation state for a progress modal.
///
/// Owns nothing: it reflects whatever items and flags it is given.
#[derive(Debug, Clone)]
pub struct ProgressView<'a> {
    title: String,
    items: &'a [BulkItem],
    is_running: bool,
    is_cancelled: bool,
    allow_cancel: bool,
}

impl<'a> ProgressView<'a> {
    pub fn new(items: &'a [BulkItem], is_running: bool) -> Self {
        Self {
            title: "Processing items".to_string(),
            items,
            is_running,
            is_cancelled: false,
            allow_cancel: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Whether the owner supports cancelling this run.
    pub fn with_cancel_allowed(mut self, allow: bool) -> Self {
        self.allow_cancel = allow;
        self
    }

    /// Whether cancellation was already requested.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.is_cancelled = cancelled;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for item in self.items {
            match item.status {
                ItemStatus::Pending => counts.pending += 1,
                ItemStatus::Processing => counts.processing += 1,
                ItemStatus::Success => counts.success += 1,
                ItemStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn progress(&self) -> BulkProgress {
        BulkProgress::from_items(self.items)
    }

    /// Completion percentage, 0 when there are no items.
    pub fn percentage(&self) -> f64 {
        self.progress().percentage
    }

    pub fn rows(&self) -> impl Iterator<Item = ProgressRow<'a>> + 'a {
        let items = self.items;
        items.iter().map(|item| ProgressRow {
            id: &item.id,
            label: &item.label,
            status: item.status,
            error: item.error.as_deref(),
        })
    }

    /// Whether the cancel affordance should be offered.
    pub fn can_cancel(&self) -> bool {
        self.allow_cancel && self.is_running && !self.is_cancelled
    }

    /// Whether the run has stopped (the modal may be closed).
    pub fn is_finished(&self) -> bool {
        !self.is_running
    }

    pub fn failed_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.is_error())
            .map(|item| item.id.clone())
            .collect()
    }

    /// Ids to hand to the caller's retry handler, if retry is available.
    pub fn retry_request(&self) -> Option<Vec<String>> {
        if self.is_running {
            return None;
        }
        let failed = self.failed_ids();
        (!failed.is_empty()).then_some(failed)
    }
}
