//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the BucketStore trait from pail-core.
//! One SDK client is built per resolved region, because a client signs for
//! exactly one region and a region-pinned bucket rejects requests signed
//! for any other. The SDK's own retry layer is disabled; retries are the
//! workflow's job and follow its policy.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, Delete,
    ObjectIdentifier,
};
use aws_smithy_types::timeout::TimeoutConfig;
use tracing::debug;

use pail_core::removal::{DEFAULT_REGION, regional_endpoint};
use pail_core::{
    BucketStore, BucketSummary, CurrentPage, DeleteItem, DeletionBatch, DeletionOutcome,
    EndpointBinding, Error, ObjectStat, ObjectVersionRecord, Profile, Result, VersionMarker,
    VersionPage,
};

use crate::classify::classify_sdk;

/// S3-backed implementation of [`BucketStore`].
pub struct S3Store {
    base: SdkConfig,
    default_region: String,
    clients: Mutex<HashMap<String, Client>>,
}

impl S3Store {
    /// Create a new store from a profile's credentials.
    ///
    /// The profile's region (default `us-east-1`) only scopes account-level
    /// calls; data-plane calls are scoped by the binding they carry.
    pub async fn new(profile: Profile) -> Result<Self> {
        let default_region = profile
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = regional_endpoint(&default_region)?;
        let timeout = profile.timeout_config();

        let credentials = aws_credential_types::Credentials::new(
            profile.access_key.clone(),
            profile.secret_key.clone(),
            profile.session_token.clone(),
            None, // expiry
            "pail-profile",
        );

        let base = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(default_region.clone()))
            .endpoint_url(&endpoint)
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(Duration::from_millis(timeout.connect_ms))
                    .read_timeout(Duration::from_millis(timeout.read_ms))
                    .build(),
            )
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .load()
            .await;

        Ok(Self {
            base,
            default_region,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// Get (building and caching on first use) the client for a region.
    fn client_for_region(&self, region: &str, endpoint_url: &str) -> Client {
        let mut clients = self.clients.lock().unwrap();
        if let Some(client) = clients.get(region) {
            return client.clone();
        }

        debug!(region, endpoint_url, "building regional S3 client");
        let config = aws_sdk_s3::config::Builder::from(&self.base)
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint_url)
            .build();
        let client = Client::from_conf(config);
        clients.insert(region.to_string(), client.clone());
        client
    }

    /// Client for a resolved bucket binding.
    pub(crate) fn client_for(&self, binding: &EndpointBinding) -> Client {
        self.client_for_region(&binding.region, &binding.endpoint_url)
    }

    /// Client for account-level calls on the session's default region.
    fn default_client(&self) -> Result<Client> {
        let endpoint = regional_endpoint(&self.default_region)?;
        Ok(self.client_for_region(&self.default_region, &endpoint))
    }
}

#[async_trait]
impl BucketStore for S3Store {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        let response = self
            .default_client()?
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "ListBuckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| BucketSummary {
                name: b.name().unwrap_or_default().to_string(),
                created: b
                    .creation_date()
                    .and_then(|d| jiff::Timestamp::from_second(d.secs()).ok()),
            })
            .collect();

        Ok(buckets)
    }

    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        let response = self
            .default_client()?
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "GetBucketLocation"))?;

        // Buckets in the classic region answer with an empty constraint
        Ok(response
            .location_constraint()
            .map(|c| c.as_str().to_string())
            .filter(|c| !c.is_empty()))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let endpoint = regional_endpoint(region)?;
        let client = self.client_for_region(region, &endpoint);

        let mut request = client.create_bucket().bucket(bucket);
        // The classic region rejects an explicit location constraint
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "CreateBucket"))?;
        Ok(())
    }

    async fn head_bucket(&self, binding: &EndpointBinding) -> Result<()> {
        self.client_for(binding)
            .head_bucket()
            .bucket(&binding.bucket)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "HeadBucket"))?;
        Ok(())
    }

    async fn versioning_enabled(&self, binding: &EndpointBinding) -> Result<bool> {
        let response = self
            .client_for(binding)
            .get_bucket_versioning()
            .bucket(&binding.bucket)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "GetBucketVersioning"))?;

        // A suspended bucket can still hold old versions and delete
        // markers, so it gets the versioned treatment too
        Ok(matches!(
            response.status(),
            Some(BucketVersioningStatus::Enabled | BucketVersioningStatus::Suspended)
        ))
    }

    async fn list_current_page(
        &self,
        binding: &EndpointBinding,
        prefix: Option<String>,
        continuation: Option<String>,
        max_keys: i32,
    ) -> Result<CurrentPage> {
        let response = self
            .client_for(binding)
            .list_objects_v2()
            .bucket(&binding.bucket)
            .set_prefix(prefix)
            .set_continuation_token(continuation)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "ListObjectsV2"))?;

        let records = response
            .contents()
            .iter()
            .map(|object| ObjectVersionRecord::Current {
                key: object.key().unwrap_or_default().to_string(),
                size: object.size().and_then(|s| u64::try_from(s).ok()),
                last_modified: object
                    .last_modified()
                    .and_then(|d| jiff::Timestamp::from_second(d.secs()).ok()),
            })
            .collect();

        let continuation = if response.is_truncated() == Some(true) {
            response.next_continuation_token().map(String::from)
        } else {
            None
        };

        Ok(CurrentPage {
            records,
            continuation,
        })
    }

    async fn list_version_page(
        &self,
        binding: &EndpointBinding,
        marker: &VersionMarker,
        max_keys: i32,
    ) -> Result<VersionPage> {
        let response = self
            .client_for(binding)
            .list_object_versions()
            .bucket(&binding.bucket)
            .set_key_marker(marker.key_marker.clone())
            .set_version_id_marker(marker.version_id_marker.clone())
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "ListObjectVersions"))?;

        let mut records = Vec::new();
        for version in response.versions() {
            records.push(ObjectVersionRecord::Version {
                key: version.key().unwrap_or_default().to_string(),
                version_id: version.version_id().unwrap_or_default().to_string(),
                size: version.size().and_then(|s| u64::try_from(s).ok()),
                last_modified: version
                    .last_modified()
                    .and_then(|d| jiff::Timestamp::from_second(d.secs()).ok()),
            });
        }
        for marker_entry in response.delete_markers() {
            records.push(ObjectVersionRecord::DeleteMarker {
                key: marker_entry.key().unwrap_or_default().to_string(),
                version_id: marker_entry.version_id().unwrap_or_default().to_string(),
                last_modified: marker_entry
                    .last_modified()
                    .and_then(|d| jiff::Timestamp::from_second(d.secs()).ok()),
            });
        }

        let next = if response.is_truncated() == Some(true) {
            Some(VersionMarker {
                key_marker: response.next_key_marker().map(String::from),
                version_id_marker: response.next_version_id_marker().map(String::from),
            })
        } else {
            None
        };

        Ok(VersionPage { records, next })
    }

    async fn delete_batch(
        &self,
        binding: &EndpointBinding,
        batch: &DeletionBatch,
    ) -> Result<Vec<DeletionOutcome>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::with_capacity(batch.len());
        for item in batch.items() {
            objects.push(
                ObjectIdentifier::builder()
                    .key(&item.key)
                    .set_version_id(item.version_id.clone())
                    .build()
                    .map_err(|e| Error::General(format!("invalid delete item: {e}")))?,
            );
        }

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::General(format!("invalid delete request: {e}")))?;

        let response = self
            .client_for(binding)
            .delete_objects()
            .bucket(&binding.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "DeleteObjects"))?;

        let failures: HashMap<(String, Option<String>), String> = response
            .errors()
            .iter()
            .map(|e| {
                (
                    (
                        e.key().unwrap_or_default().to_string(),
                        e.version_id().map(String::from),
                    ),
                    e.code().unwrap_or("InternalError").to_string(),
                )
            })
            .collect();

        Ok(split_outcomes(batch.items(), &failures))
    }

    async fn delete_bucket(&self, binding: &EndpointBinding) -> Result<()> {
        self.client_for(binding)
            .delete_bucket()
            .bucket(&binding.bucket)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "DeleteBucket"))?;
        Ok(())
    }

    async fn head_object(&self, binding: &EndpointBinding, key: &str) -> Result<ObjectStat> {
        let response = self
            .client_for(binding)
            .head_object()
            .bucket(&binding.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "HeadObject"))?;

        Ok(ObjectStat {
            key: key.to_string(),
            size: response
                .content_length()
                .and_then(|s| u64::try_from(s).ok())
                .unwrap_or(0),
            content_type: response.content_type().map(String::from),
            last_modified: response
                .last_modified()
                .and_then(|d| jiff::Timestamp::from_second(d.secs()).ok()),
            etag: response.e_tag().map(|t| t.trim_matches('"').to_string()),
        })
    }

    async fn get_object(&self, binding: &EndpointBinding, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client_for(binding)
            .get_object()
            .bucket(&binding.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "GetObject"))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Transient(format!("GetObject: body read failed: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        binding: &EndpointBinding,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client_for(binding)
            .put_object()
            .bucket(&binding.bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "PutObject"))?;
        Ok(())
    }

    async fn delete_object(&self, binding: &EndpointBinding, key: &str) -> Result<()> {
        self.client_for(binding)
            .delete_object()
            .bucket(&binding.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk(&e, "DeleteObject"))?;
        Ok(())
    }
}

/// Pair every submitted item with its outcome.
///
/// The bulk-delete response enumerates failures explicitly; any submitted
/// item not named there was deleted (deleting an already-absent version is
/// reported as success by the service, which suits the workflow: deletes
/// are idempotent).
fn split_outcomes(
    items: &[DeleteItem],
    failures: &HashMap<(String, Option<String>), String>,
) -> Vec<DeletionOutcome> {
    items
        .iter()
        .map(|item| {
            match failures.get(&(item.key.clone(), item.version_id.clone())) {
                Some(code) => DeletionOutcome::failure(item, code.clone()),
                None => DeletionOutcome::success(item),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, version_id: Option<&str>) -> DeleteItem {
        DeleteItem {
            key: key.to_string(),
            version_id: version_id.map(String::from),
        }
    }

    #[test]
    fn test_split_outcomes_all_succeed() {
        let items = vec![item("a", None), item("b", Some("v1"))];
        let outcomes = split_outcomes(&items, &HashMap::new());

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.succeeded));
    }

    #[test]
    fn test_split_outcomes_partial_failure() {
        let items = vec![item("a", None), item("b", Some("v1")), item("c", None)];
        let mut failures = HashMap::new();
        failures.insert(
            ("b".to_string(), Some("v1".to_string())),
            "AccessDenied".to_string(),
        );

        let outcomes = split_outcomes(&items, &failures);

        assert!(outcomes[0].succeeded);
        assert!(!outcomes[1].succeeded);
        assert_eq!(outcomes[1].error_code.as_deref(), Some("AccessDenied"));
        assert!(outcomes[2].succeeded);
    }

    #[test]
    fn test_split_outcomes_distinguishes_versions_of_same_key() {
        let items = vec![item("a", Some("v1")), item("a", Some("v2"))];
        let mut failures = HashMap::new();
        failures.insert(
            ("a".to_string(), Some("v2".to_string())),
            "InternalError".to_string(),
        );

        let outcomes = split_outcomes(&items, &failures);

        assert!(outcomes[0].succeeded);
        assert!(!outcomes[1].succeeded);
    }
}
