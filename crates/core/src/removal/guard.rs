//! Emptiness pre-flight check
//!
//! Classifies a bucket before any deletion is offered, and again right
//! before the bucket-removal call. A bucket is never removed on a stale or
//! optimistic assumption of emptiness.

use tracing::debug;

use crate::error::Result;
use crate::store::BucketStore;
use crate::types::{BucketState, EndpointBinding, VersionMarker};

/// Classify a bucket as empty, non-empty, or non-empty with version
/// history.
///
/// The head probe runs first so a true "bucket does not exist" surfaces as
/// `NotFound` and a denied request as `AccessDenied`, distinctly. The
/// listing probe is bounded to a single entry; no full enumeration happens
/// here.
pub async fn check(store: &dyn BucketStore, binding: &EndpointBinding) -> Result<BucketState> {
    store.head_bucket(binding).await?;

    let state = if store.versioning_enabled(binding).await? {
        let page = store
            .list_version_page(binding, &VersionMarker::default(), 1)
            .await?;
        if page.records.is_empty() {
            BucketState::Empty
        } else {
            BucketState::NonEmptyVersioned
        }
    } else {
        let page = store.list_current_page(binding, None, None, 1).await?;
        if page.records.is_empty() {
            BucketState::Empty
        } else {
            BucketState::NonEmptyCurrent
        }
    };

    debug!(bucket = binding.bucket, state = %state, "bucket contents classified");
    Ok(state)
}
