//! Shared data types for the bucket-removal workflow
//!
//! These types are SDK-independent; the adapter crate converts provider
//! responses into them at the trait boundary.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Hard ceiling on items per bulk-delete request, imposed by the remote API.
pub const MAX_DELETE_BATCH: usize = 1000;

/// A bucket identified by name. Does not own any remote state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketRef(String);

impl BucketRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bucket pinned to its home region and regional endpoint.
///
/// Immutable once resolved; every data-plane call for the bucket within a
/// session goes through the same binding. Using a global endpoint for a
/// region-pinned bucket fails signature validation at the protocol layer,
/// so a binding is the only way the rest of the workflow addresses a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointBinding {
    /// Bucket name
    pub bucket: String,

    /// Resolved home region of the bucket
    pub region: String,

    /// Regional endpoint URL all calls for this bucket are sent to
    pub endpoint_url: String,
}

/// One distinct (key, version) entry produced by enumeration.
///
/// `Current` is a non-versioned (current) object; `Version` and
/// `DeleteMarker` carry the version id required for a version-specific
/// delete. Delete markers must themselves be deleted to truly remove
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectVersionRecord {
    Current {
        key: String,
        size: Option<u64>,
        last_modified: Option<Timestamp>,
    },
    Version {
        key: String,
        version_id: String,
        size: Option<u64>,
        last_modified: Option<Timestamp>,
    },
    DeleteMarker {
        key: String,
        version_id: String,
        last_modified: Option<Timestamp>,
    },
}

impl ObjectVersionRecord {
    pub fn key(&self) -> &str {
        match self {
            Self::Current { key, .. } => key,
            Self::Version { key, .. } => key,
            Self::DeleteMarker { key, .. } => key,
        }
    }

    pub fn version_id(&self) -> Option<&str> {
        match self {
            Self::Current { .. } => None,
            Self::Version { version_id, .. } => Some(version_id),
            Self::DeleteMarker { version_id, .. } => Some(version_id),
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            Self::Current { size, .. } => *size,
            Self::Version { size, .. } => *size,
            Self::DeleteMarker { .. } => None,
        }
    }

    pub fn last_modified(&self) -> Option<Timestamp> {
        match self {
            Self::Current { last_modified, .. } => *last_modified,
            Self::Version { last_modified, .. } => *last_modified,
            Self::DeleteMarker { last_modified, .. } => *last_modified,
        }
    }

    pub fn is_delete_marker(&self) -> bool {
        matches!(self, Self::DeleteMarker { .. })
    }
}

/// One item of a bulk-delete request.
///
/// `version_id = None` is a current-object delete; `Some` (including delete
/// markers) is a version-specific delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItem {
    pub key: String,
    pub version_id: Option<String>,
}

impl From<&ObjectVersionRecord> for DeleteItem {
    fn from(record: &ObjectVersionRecord) -> Self {
        Self {
            key: record.key().to_string(),
            version_id: record.version_id().map(String::from),
        }
    }
}

/// An ordered group of at most [`MAX_DELETE_BATCH`] delete items.
///
/// The ceiling is enforced here; `push` refuses the item once the batch is
/// full so no oversized request can reach the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionBatch {
    items: Vec<DeleteItem>,
}

impl DeletionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from items already known to fit.
    ///
    /// Used when re-batching the failed subset of an executed batch, which
    /// can never grow past the original size.
    pub fn from_items(items: Vec<DeleteItem>) -> Self {
        debug_assert!(items.len() <= MAX_DELETE_BATCH);
        Self { items }
    }

    /// Add an item. Returns `false` (leaving the batch unchanged) when the
    /// batch is already at the ceiling.
    pub fn push(&mut self, item: DeleteItem) -> bool {
        if self.items.len() >= MAX_DELETE_BATCH {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn items(&self) -> &[DeleteItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_DELETE_BATCH
    }

    pub fn take(&mut self) -> Self {
        Self {
            items: std::mem::take(&mut self.items),
        }
    }
}

/// Per-item result of a bulk-delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl DeletionOutcome {
    pub fn success(item: &DeleteItem) -> Self {
        Self {
            key: item.key.clone(),
            version_id: item.version_id.clone(),
            succeeded: true,
            error_code: None,
        }
    }

    pub fn failure(item: &DeleteItem, code: impl Into<String>) -> Self {
        Self {
            key: item.key.clone(),
            version_id: item.version_id.clone(),
            succeeded: false,
            error_code: Some(code.into()),
        }
    }
}

/// Aggregate result of a cleanup pass.
///
/// Failures are never dropped: every item that could not be deleted appears
/// in `failures` with its error code, and an aborted pass records why it
/// stopped in `abort_reason`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub total_attempted: u64,
    pub total_succeeded: u64,
    pub failures: Vec<DeletionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
}

impl DeletionReport {
    pub fn record(&mut self, outcome: DeletionOutcome) {
        self.total_attempted += 1;
        if outcome.succeeded {
            self.total_succeeded += 1;
        } else {
            self.failures.push(outcome);
        }
    }

    pub fn merge(&mut self, outcomes: Vec<DeletionOutcome>) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    /// The pass deleted everything it set out to delete and was not cut
    /// short.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.abort_reason.is_none()
    }
}

/// Pre-flight classification of a bucket's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketState {
    /// No current objects, no versions, no delete markers
    Empty,
    /// Objects present, versioning never enabled
    NonEmptyCurrent,
    /// Versioning enabled and at least one version or delete marker exists
    NonEmptyVersioned,
}

impl fmt::Display for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::NonEmptyCurrent => f.write_str("non-empty"),
            Self::NonEmptyVersioned => f.write_str("non-empty (versioned)"),
        }
    }
}

/// Whether a bucket-removal request was carried out or refused.
///
/// Refusal is a first-class result, not an error: removal is refused by
/// design whenever emptiness cannot be certified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalDecision {
    Removed,
    Refused(String),
}

/// One page of the current-object listing.
#[derive(Debug, Clone, Default)]
pub struct CurrentPage {
    pub records: Vec<ObjectVersionRecord>,
    /// Opaque continuation token; `None` means the listing is exhausted.
    pub continuation: Option<String>,
}

/// Continuation state for the version listing: an opaque (key, version-id)
/// marker pair fed back verbatim on the follow-up call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMarker {
    pub key_marker: Option<String>,
    pub version_id_marker: Option<String>,
}

/// One page of the version listing: versions and delete markers together.
#[derive(Debug, Clone, Default)]
pub struct VersionPage {
    pub records: Vec<ObjectVersionRecord>,
    /// Marker pair for the next page; `None` means the listing is exhausted.
    pub next: Option<VersionMarker>,
}

/// Summary line for a bucket in the account listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
}

/// Metadata for a single object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStat {
    pub key: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}
