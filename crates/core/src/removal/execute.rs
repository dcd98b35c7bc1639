//! Batched deletion execution
//!
//! Issues one bulk-delete call per batch with a small bounded number of
//! calls in flight. The remote API may partially fail a batch, so every
//! per-item outcome is recorded rather than treating a batch as atomic.
//! Items that failed with a transient code are re-batched and retried with
//! backoff; permanent failures are recorded and never retried.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::{Error, is_transient_code};
use crate::retry::RetryConfig;
use crate::store::BucketStore;
use crate::types::{DeleteItem, DeletionBatch, DeletionOutcome, DeletionReport, EndpointBinding};

/// Batch-delete calls in flight at once per cleanup pass. Deletes are
/// idempotent and order-independent, so batches may complete in any order.
const MAX_IN_FLIGHT: usize = 4;

/// Error code recorded for items whose delete call was never issued because
/// the pass was aborted. They are unresolved, and the report must say so.
pub const ABORTED_CODE: &str = "OperationAborted";

/// Executes deletion batches and aggregates a [`DeletionReport`].
pub struct DeletionExecutor {
    store: Arc<dyn BucketStore>,
    binding: EndpointBinding,
    retry: RetryConfig,
    cancel: CancellationToken,
    max_in_flight: usize,
    tasks: JoinSet<Vec<DeletionOutcome>>,
    report: DeletionReport,
}

impl DeletionExecutor {
    pub fn new(
        store: Arc<dyn BucketStore>,
        binding: EndpointBinding,
        retry: RetryConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            binding,
            retry,
            cancel,
            max_in_flight: MAX_IN_FLIGHT,
            tasks: JoinSet::new(),
            report: DeletionReport::default(),
        }
    }

    /// Submit a batch, waiting for a slot when the in-flight cap is reached.
    ///
    /// After cancellation no further calls go out; the batch's items are
    /// recorded as unresolved failures instead of being dropped.
    pub async fn submit(&mut self, batch: DeletionBatch) {
        if batch.is_empty() {
            return;
        }

        if self.cancel.is_cancelled() {
            for item in batch.items() {
                self.report.record(DeletionOutcome::failure(item, ABORTED_CODE));
            }
            return;
        }

        while self.tasks.len() >= self.max_in_flight {
            if let Some(joined) = self.tasks.join_next().await {
                self.collect(joined);
            }
        }

        let store = Arc::clone(&self.store);
        let binding = self.binding.clone();
        let retry = self.retry.clone();
        let cancel = self.cancel.clone();
        self.tasks
            .spawn(async move { execute_batch(store, binding, batch, retry, cancel).await });
    }

    /// Wait for all in-flight batches and hand back the aggregate report.
    pub async fn finish(mut self) -> DeletionReport {
        while let Some(joined) = self.tasks.join_next().await {
            self.collect(joined);
        }
        self.report
    }

    fn collect(&mut self, joined: std::result::Result<Vec<DeletionOutcome>, tokio::task::JoinError>) {
        match joined {
            Ok(outcomes) => self.report.merge(outcomes),
            Err(e) => {
                error!(error = %e, "batch deletion task failed to join");
            }
        }
    }
}

/// Run one batch to completion: issue the call, record outcomes, and retry
/// the transient subset until it drains or attempts run out.
async fn execute_batch(
    store: Arc<dyn BucketStore>,
    binding: EndpointBinding,
    batch: DeletionBatch,
    retry: RetryConfig,
    cancel: CancellationToken,
) -> Vec<DeletionOutcome> {
    let mut outcomes = Vec::with_capacity(batch.len());
    let mut current = batch;
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            outcomes.extend(
                current
                    .items()
                    .iter()
                    .map(|item| DeletionOutcome::failure(item, ABORTED_CODE)),
            );
            return outcomes;
        }

        match store.delete_batch(&binding, &current).await {
            Ok(results) => {
                let mut retry_items: Vec<DeleteItem> = Vec::new();
                for outcome in results {
                    let transient = !outcome.succeeded
                        && outcome
                            .error_code
                            .as_deref()
                            .is_some_and(is_transient_code);
                    if transient && attempt < retry.max_attempts {
                        retry_items.push(DeleteItem {
                            key: outcome.key,
                            version_id: outcome.version_id,
                        });
                    } else {
                        outcomes.push(outcome);
                    }
                }

                if retry_items.is_empty() {
                    return outcomes;
                }

                warn!(
                    bucket = binding.bucket,
                    items = retry_items.len(),
                    attempt,
                    "retrying throttled delete items"
                );
                tokio::time::sleep(retry.backoff(attempt)).await;
                attempt += 1;
                current = DeletionBatch::from_items(retry_items);
            }
            Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                warn!(
                    bucket = binding.bucket,
                    attempt,
                    error = %e,
                    "bulk delete call failed, retrying batch"
                );
                tokio::time::sleep(retry.backoff(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                let code = failure_code(&e);
                outcomes.extend(
                    current
                        .items()
                        .iter()
                        .map(|item| DeletionOutcome::failure(item, code)),
                );
                return outcomes;
            }
        }
    }
}

fn failure_code(e: &Error) -> &'static str {
    match e {
        Error::AccessDenied(_) => "AccessDenied",
        Error::NotFound(_) => "NoSuchBucket",
        Error::Transient(_) => "ServiceUnavailable",
        Error::NetworkUnavailable(_) => "NetworkUnavailable",
        Error::Cancelled => ABORTED_CODE,
        _ => "InternalError",
    }
}
