//! pail-core: Core library for the pail object-storage session manager
//!
//! This crate provides the core functionality for the pail CLI, including:
//! - Configuration and profile management
//! - The BucketStore trait abstracting the storage provider
//! - The guarded bucket-removal workflow (endpoint resolution, exhaustive
//!   version enumeration, batched deletion, emptiness certification)
//!
//! This crate is independent of any specific storage SDK; the pail-s3 crate
//! supplies the provider implementation.

pub mod config;
pub mod error;
pub mod profile;
pub mod removal;
pub mod retry;
pub mod store;
pub mod types;

pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use profile::{Profile, ProfileManager, TimeoutConfig};
pub use removal::{RemovalSummary, RemovalWorkflow};
pub use retry::RetryConfig;
pub use store::BucketStore;
pub use types::{
    BucketRef, BucketState, BucketSummary, CurrentPage, DeleteItem, DeletionBatch,
    DeletionOutcome, DeletionReport, EndpointBinding, MAX_DELETE_BATCH, ObjectStat,
    ObjectVersionRecord, RemovalDecision, VersionMarker, VersionPage,
};
