//! The batch loop shared by `execute` and `retry_failed`.

use bulkops_core::{BulkItem, BulkProgress, BulkResult};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::BulkOperation;
use crate::operation::settle;

impl<T> BulkOperation<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Process `work` in batches, then finish the run.
    ///
    /// Each entry pairs an item position in the live list with the index of
    /// its source item. Cancellation is honoured only at batch boundaries.
    pub(crate) async fn run_batches(
        &self,
        work: Vec<(usize, usize)>,
        token: CancellationToken,
        started_at: DateTime<Utc>,
    ) -> BulkResult {
        let batch_size = self.config.batch_size;
        let batch_count = work.len().div_ceil(batch_size);
        let delay = self.config.delay();
        let mut stopped = false;
        let claim = RunClaim::new(self);

        for (n, batch) in work.chunks(batch_size).enumerate() {
            if self.state.borrow().is_cancelled {
                let remaining = &work[n * batch_size..];
                self.state.send_modify(|state| {
                    for &(pos, _) in remaining {
                        state.items[pos].mark_pending();
                    }
                });
                info!(
                    batch = n + 1,
                    remaining = remaining.len(),
                    "Bulk run cancelled"
                );
                stopped = true;
                break;
            }

            self.state.send_modify(|state| {
                for &(pos, _) in batch {
                    state.items[pos].mark_processing();
                }
            });
            debug!(batch = n + 1, of = batch_count, size = batch.len(), "Dispatching batch");

            let operation = self.operation.as_ref();
            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .map(|&(pos, src)| {
                    let item = self.sources[src].clone();
                    async move { (pos, settle(operation, item).await) }
                })
                .collect();

            while let Some((pos, outcome)) = in_flight.next().await {
                let mut progress = BulkProgress::default();
                self.state.send_modify(|state| {
                    let item = &mut state.items[pos];
                    match outcome {
                        Ok(()) => item.mark_success(),
                        Err(failure) => {
                            warn!(id = %item.id, error = %failure, "Item operation failed");
                            item.mark_error(failure.message);
                        }
                    }
                    progress = state.progress();
                });

                if let Some(callback) = &self.on_progress {
                    callback(&progress);
                }
            }

            let is_last = n + 1 == batch_count;
            if !is_last && !delay.is_zero() && !token.is_cancelled() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {}
                }
            }
        }

        let items = claim.release();
        let result = BulkResult::from_items(items, stopped, started_at);
        info!(
            total = result.total,
            successful = result.successful,
            failed = result.failed,
            cancelled = result.cancelled,
            "Bulk run finished"
        );

        if let Some(callback) = &self.on_complete {
            callback(&result);
        }

        result
    }
}

/// The engine's running flag for one run.
///
/// Dropping the run future mid-run drops the claim unreleased, which clears
/// the flag and returns dispatched items to pending.
struct RunClaim<'a, T> {
    engine: Option<&'a BulkOperation<T>>,
}

impl<'a, T> RunClaim<'a, T> {
    fn new(engine: &'a BulkOperation<T>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// End the run normally, returning the final items.
    fn release(mut self) -> Vec<BulkItem> {
        let mut items = Vec::new();
        if let Some(engine) = self.engine.take() {
            engine.state.send_modify(|state| {
                state.is_running = false;
                items = state.items.clone();
            });
        }
        items
    }
}

impl<T> Drop for RunClaim<'_, T> {
    fn drop(&mut self) {
        let Some(engine) = self.engine.take() else {
            return;
        };

        let mut abandoned = 0usize;
        engine.state.send_modify(|state| {
            for item in state.items.iter_mut().filter(|item| item.is_processing()) {
                item.mark_pending();
                abandoned += 1;
            }
            state.is_running = false;
        });
        warn!(abandoned, "Bulk run dropped before finishing");
    }
}
