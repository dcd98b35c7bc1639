//! Endpoint resolution
//!
//! Every bucket lives in exactly one region, and data-plane calls must be
//! signed for and sent to that region's endpoint; a mismatch fails
//! signature validation at the protocol layer. The resolver queries the
//! bucket's location metadata once per session and pins the answer in a
//! session-scoped cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::store::BucketStore;
use crate::types::{BucketRef, EndpointBinding};

/// Region assumed when the location metadata carries the legacy
/// "unspecified/classic" marker. Buckets created in the provider's oldest
/// region report an empty location rather than naming it.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Build the regional endpoint URL for a region.
pub fn regional_endpoint(region: &str) -> Result<String> {
    let endpoint = format!("https://s3.{region}.amazonaws.com");
    // A malformed region name (whitespace, slashes) must not produce a
    // malformed request target.
    Url::parse(&endpoint)
        .map_err(|e| Error::Config(format!("invalid endpoint for region '{region}': {e}")))?;
    Ok(endpoint)
}

/// Resolves buckets to their regional endpoint bindings.
///
/// The cache is owned by the resolver and the resolver by the session; no
/// process-wide state. Only successful resolutions are cached, so an
/// errored lookup is retried on the next call.
pub struct EndpointResolver {
    store: Arc<dyn BucketStore>,
    cache: Mutex<HashMap<String, EndpointBinding>>,
}

impl EndpointResolver {
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a bucket to its endpoint binding.
    ///
    /// A cache hit short-circuits the remote metadata call; resolving the
    /// same bucket twice in one session issues exactly one.
    pub async fn resolve(&self, bucket: &BucketRef) -> Result<EndpointBinding> {
        if let Some(binding) = self.cache.lock().unwrap().get(bucket.name()) {
            debug!(bucket = bucket.name(), region = binding.region, "endpoint cache hit");
            return Ok(binding.clone());
        }

        let location = self.store.bucket_location(bucket.name()).await?;
        let region = location
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint_url = regional_endpoint(&region)?;

        let binding = EndpointBinding {
            bucket: bucket.name().to_string(),
            region: region.clone(),
            endpoint_url,
        };

        debug!(bucket = bucket.name(), region, "resolved bucket endpoint");
        self.cache
            .lock()
            .unwrap()
            .insert(bucket.name().to_string(), binding.clone());

        Ok(binding)
    }
}
