//! BucketStore trait definition
//!
//! This trait defines the interface for the storage-provider operations the
//! workflow consumes. It keeps the core decoupled from the specific SDK and
//! lets the workflow components be tested against a mock.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    BucketSummary, CurrentPage, DeletionBatch, DeletionOutcome, EndpointBinding, ObjectStat,
    VersionMarker, VersionPage,
};

/// Provider operations for buckets and objects.
///
/// Region-scoped calls take an [`EndpointBinding`] so they are always sent
/// to the bucket's home endpoint; only account-level calls
/// (`list_buckets`, `bucket_location`, `create_bucket`) use the session's
/// default endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// List buckets in the account
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>>;

    /// Query the bucket's location metadata.
    ///
    /// Returns `None` for the legacy "unspecified/classic" marker the
    /// provider emits for buckets created in its oldest region; callers map
    /// that to the provider's default region.
    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>>;

    /// Create a bucket in the given region
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;

    /// Existence/reachability probe distinguishing NotFound from
    /// AccessDenied
    async fn head_bucket(&self, binding: &EndpointBinding) -> Result<()>;

    /// Whether versioning is (or was ever) enabled on the bucket
    async fn versioning_enabled(&self, binding: &EndpointBinding) -> Result<bool>;

    /// One page of the current-object listing
    async fn list_current_page(
        &self,
        binding: &EndpointBinding,
        prefix: Option<String>,
        continuation: Option<String>,
        max_keys: i32,
    ) -> Result<CurrentPage>;

    /// One page of the version listing (versions and delete markers),
    /// continued via the opaque marker pair
    async fn list_version_page(
        &self,
        binding: &EndpointBinding,
        marker: &VersionMarker,
        max_keys: i32,
    ) -> Result<VersionPage>;

    /// Bulk delete. May partially fail; returns one outcome per submitted
    /// item.
    async fn delete_batch(
        &self,
        binding: &EndpointBinding,
        batch: &DeletionBatch,
    ) -> Result<Vec<DeletionOutcome>>;

    /// Remove the bucket itself (only valid once empty)
    async fn delete_bucket(&self, binding: &EndpointBinding) -> Result<()>;

    /// Object metadata
    async fn head_object(&self, binding: &EndpointBinding, key: &str) -> Result<ObjectStat>;

    /// Fetch object content
    async fn get_object(&self, binding: &EndpointBinding, key: &str) -> Result<Vec<u8>>;

    /// Store object content
    async fn put_object(
        &self,
        binding: &EndpointBinding,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()>;

    /// Delete a single current object
    async fn delete_object(&self, binding: &EndpointBinding, key: &str) -> Result<()>;
}
