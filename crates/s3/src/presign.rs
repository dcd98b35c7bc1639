//! Presigned URL generation
//!
//! Produces time-limited GET URLs for sharing objects without credentials.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;

use pail_core::{EndpointBinding, Error, Result};

use crate::client::S3Store;

/// Default lifetime of a presigned URL: one hour.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(3600);

impl S3Store {
    /// Generate a presigned GET URL for an object, valid for `expires`.
    pub async fn presigned_get(
        &self,
        binding: &EndpointBinding,
        key: &str,
        expires: Duration,
    ) -> Result<String> {
        let config = PresigningConfig::expires_in(expires)
            .map_err(|e| Error::Config(format!("invalid presign expiry: {e}")))?;

        let request = self
            .client_for(binding)
            .get_object()
            .bucket(&binding.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| crate::classify::classify_sdk(&e, "GetObject (presign)"))?;

        Ok(request.uri().to_string())
    }
}
