//! The bulk operation engine and its public operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bulkops_core::{BulkConfig, BulkError, BulkItem, BulkProgress, BulkResult, Result};
use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::operation::ItemOperation;
use crate::state::BulkSnapshot;

/// Callback invoked after each item settles.
pub type ProgressCallback = Arc<dyn Fn(&BulkProgress) + Send + Sync>;

/// Callback invoked once when a run ends.
pub type CompleteCallback = Arc<dyn Fn(&BulkResult) + Send + Sync>;

/// Executes an async operation over a list of items in batches.
///
/// Only one run may be active at a time; [`execute`](Self::execute) and
/// [`retry_failed`](Self::retry_failed) return [`BulkError::AlreadyRunning`]
/// otherwise. [`cancel`](Self::cancel) takes `&self` so it can be called
/// while a run is being awaited elsewhere. Dropping a run future also ends
/// the run: in-flight items go back to pending.
pub struct BulkOperation<T> {
    pub(crate) sources: Vec<T>,
    ids: Vec<String>,
    labels: Vec<String>,
    index: HashMap<String, usize>,
    pub(crate) operation: Arc<dyn ItemOperation<T>>,
    pub(crate) config: BulkConfig,
    pub(crate) on_progress: Option<ProgressCallback>,
    pub(crate) on_complete: Option<CompleteCallback>,
    pub(crate) state: watch::Sender<BulkSnapshot>,
    cancel: Mutex<CancellationToken>,
}

/// What a run was asked to process.
pub(crate) enum RunStart {
    /// Pairs of (item position, source index) to process.
    Started {
        work: Vec<(usize, usize)>,
        token: CancellationToken,
    },
    /// Nothing to do; the current items are returned untouched.
    Idle(Vec<BulkItem>),
}

impl<T> BulkOperation<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an engine over `items`.
    ///
    /// `id_of` and `label_of` project each source item to its tracking id
    /// and display label. Ids must be unique.
    pub fn new<O>(
        items: Vec<T>,
        id_of: impl Fn(&T) -> String,
        label_of: impl Fn(&T) -> String,
        operation: O,
        config: BulkConfig,
    ) -> Result<Self>
    where
        O: ItemOperation<T> + 'static,
    {
        config.validate()?;

        let ids: Vec<String> = items.iter().map(&id_of).collect();
        let labels: Vec<String> = items.iter().map(&label_of).collect();

        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(BulkError::DuplicateId { id: id.clone() });
            }
        }

        let (state, _) = watch::channel(BulkSnapshot::default());

        Ok(Self {
            sources: items,
            ids,
            labels,
            index,
            operation: Arc::new(operation),
            config,
            on_progress: None,
            on_complete: None,
            state,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Set the callback invoked after each item settles.
    pub fn with_on_progress(
        mut self,
        callback: impl Fn(&BulkProgress) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Set the callback invoked when a run ends.
    pub fn with_on_complete(
        mut self,
        callback: impl Fn(&BulkResult) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// Run the operation over every source item.
    ///
    /// All items are reset to pending first. Item failures are recorded on
    /// the items; they never fail the run.
    pub async fn execute(&self) -> Result<BulkResult> {
        let started_at = Utc::now();
        let start = self.begin_run(|items| {
            *items = self.fresh_items();
            Some((0..items.len()).map(|i| (i, i)).collect())
        })?;

        match start {
            RunStart::Started { work, token } => {
                info!(
                    total = work.len(),
                    batch_size = self.config.batch_size,
                    "Starting bulk run"
                );
                Ok(self.run_batches(work, token, started_at).await)
            }
            RunStart::Idle(items) => Ok(BulkResult::from_items(items, false, started_at)),
        }
    }

    /// Re-run the operation for items that failed in the previous run.
    ///
    /// Failed items are reset to pending; successful and never-attempted
    /// items are left as they are. The result covers the full item list.
    /// With no failed items this returns the current state unchanged.
    pub async fn retry_failed(&self) -> Result<BulkResult> {
        let started_at = Utc::now();
        let start = self.begin_run(|items| {
            let work: Vec<(usize, usize)> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.is_error())
                .filter_map(|(pos, item)| self.index.get(&item.id).map(|&src| (pos, src)))
                .collect();

            if work.is_empty() {
                return None;
            }
            for &(pos, _) in &work {
                items[pos].mark_pending();
            }
            Some(work)
        })?;

        match start {
            RunStart::Started { work, token } => {
                info!(retrying = work.len(), "Retrying failed items");
                Ok(self.run_batches(work, token, started_at).await)
            }
            RunStart::Idle(items) => {
                debug!("No failed items to retry");
                Ok(BulkResult::from_items(items, false, started_at))
            }
        }
    }

    /// Request cancellation of the active run.
    ///
    /// Operations already dispatched run to completion; no further batch is
    /// dispatched. A no-op when nothing is running.
    pub fn cancel(&self) {
        self.state.send_if_modified(|state| {
            if !state.is_running || state.is_cancelled {
                return false;
            }
            state.is_cancelled = true;
            self.token().cancel();
            true
        });
    }

    /// Clear all items and flags.
    pub fn reset(&self) -> Result<()> {
        let mut running = false;
        self.state.send_if_modified(|state| {
            if state.is_running {
                running = true;
                return false;
            }
            let changed = !state.items.is_empty() || state.is_cancelled;
            state.items.clear();
            state.is_cancelled = false;
            changed
        });

        if running {
            return Err(BulkError::AlreadyRunning);
        }
        Ok(())
    }

    /// Current items.
    pub fn items(&self) -> Vec<BulkItem> {
        self.state.borrow().items.clone()
    }

    /// Aggregate progress over the current items.
    pub fn progress(&self) -> BulkProgress {
        self.state.borrow().progress()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().is_cancelled
    }

    /// Copy of the full current state.
    pub fn snapshot(&self) -> BulkSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<BulkSnapshot> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    /// Atomically claim the engine for a run.
    ///
    /// `prepare` edits the item list and returns the work to do, or `None`
    /// to leave the state untouched.
    fn begin_run(
        &self,
        prepare: impl FnOnce(&mut Vec<BulkItem>) -> Option<Vec<(usize, usize)>>,
    ) -> Result<RunStart> {
        let mut start = None;
        let mut running = false;

        self.state.send_if_modified(|state| {
            if state.is_running {
                running = true;
                return false;
            }

            let mut items = state.items.clone();
            match prepare(&mut items) {
                Some(work) => {
                    let token = CancellationToken::new();
                    *self.token() = token.clone();
                    state.items = items;
                    state.is_running = true;
                    state.is_cancelled = false;
                    start = Some(RunStart::Started { work, token });
                    true
                }
                None => {
                    start = Some(RunStart::Idle(state.items.clone()));
                    false
                }
            }
        });

        if running {
            return Err(BulkError::AlreadyRunning);
        }
        start.ok_or(BulkError::AlreadyRunning)
    }

    fn fresh_items(&self) -> Vec<BulkItem> {
        self.ids
            .iter()
            .zip(&self.labels)
            .map(|(id, label)| BulkItem::new(id.clone(), label.clone()))
            .collect()
    }

    fn token(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> std::fmt::Debug for BulkOperation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkOperation")
            .field("items", &self.ids.len())
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
