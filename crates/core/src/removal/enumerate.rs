//! Exhaustive enumeration of a bucket's contents
//!
//! Produces every live object, every non-current version, and every delete
//! marker, one record at a time. Pagination markers are internal state; the
//! consumer only sees "next record or exhausted". A transient error
//! mid-pagination retries the current page with the same marker pair
//! instead of restarting from the beginning.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use crate::store::BucketStore;
use crate::types::{EndpointBinding, ObjectVersionRecord, VersionMarker, VersionPage};

/// Default page size requested from the version listing.
const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Lazy, finite sequence of [`ObjectVersionRecord`]s for one bucket.
///
/// Not restartable mid-stream; construct a new enumerator to list again
/// from the beginning. No global ordering across pages is guaranteed, only
/// that every live item is produced exactly once per pass.
pub struct ObjectVersionEnumerator {
    store: Arc<dyn BucketStore>,
    binding: EndpointBinding,
    retry: RetryConfig,
    cancel: CancellationToken,
    page_size: i32,
    buffer: VecDeque<ObjectVersionRecord>,
    /// Marker for the next page fetch; `None` once the listing is exhausted.
    pending: Option<VersionMarker>,
}

impl ObjectVersionEnumerator {
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
            page_size: DEFAULT_PAGE_SIZE,
            buffer: VecDeque::new(),
            pending: Some(VersionMarker::default()),
        }
    }

    #[cfg(test)]
    fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Produce the next record, or `None` once every page is consumed.
    pub async fn next(&mut self) -> Result<Option<ObjectVersionRecord>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }

            let Some(marker) = self.pending.clone() else {
                return Ok(None);
            };

            let page = self.fetch_page(&marker).await?;
            debug!(
                bucket = self.binding.bucket,
                records = page.records.len(),
                more = page.next.is_some(),
                "fetched version listing page"
            );
            self.pending = page.next;
            self.buffer.extend(page.records);
            // An empty page with a continuation marker loops for the next one
        }
    }

    async fn fetch_page(&self, marker: &VersionMarker) -> Result<VersionPage> {
        let mut attempt = 1;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self
                .store
                .list_version_page(&self.binding, marker, self.page_size)
                .await
            {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        bucket = self.binding.bucket,
                        attempt,
                        error = %e,
                        "version listing page failed, retrying same markers"
                    );
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
