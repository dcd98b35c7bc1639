//! pail-s3: S3 SDK adapter for pail
//!
//! This crate provides the implementation of the BucketStore trait using
//! the aws-sdk-s3 crate. It is the only crate that directly depends on the
//! AWS SDK.

mod classify;
pub mod client;
pub mod presign;

pub use client::S3Store;
pub use presign::DEFAULT_EXPIRY;
