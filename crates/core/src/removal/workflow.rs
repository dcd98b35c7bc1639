//! The guarded bucket-removal workflow
//!
//! Session object tying the resolver, emptiness check, enumeration,
//! planning, and execution together. The one rule everything here serves:
//! the bucket-removal call is only ever issued after an emptiness check in
//! this same session, run after any cleanup pass, certified the bucket
//! empty. Anything less is a refusal, not an error.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use crate::store::BucketStore;
use crate::types::{
    BucketRef, BucketState, DeletionReport, EndpointBinding, RemovalDecision,
};

use super::enumerate::ObjectVersionEnumerator;
use super::execute::DeletionExecutor;
use super::guard;
use super::plan::DeletionPlanner;
use super::resolver::EndpointResolver;

/// Result of a composed removal request.
#[derive(Debug, Clone)]
pub struct RemovalSummary {
    /// What the pre-flight check found before any cleanup
    pub state_before: BucketState,
    /// The cleanup report, when a cleanup pass ran
    pub report: Option<DeletionReport>,
    /// Whether the bucket was removed or the removal refused
    pub decision: RemovalDecision,
}

/// Per-session deletion workflow.
///
/// Owns the endpoint cache and the degraded-mode indicator; both live and
/// die with the session. Deletion workflows are serialized per bucket: a
/// second request for a bucket already being worked on fails with
/// `Conflict`.
pub struct RemovalWorkflow {
    store: Arc<dyn BucketStore>,
    resolver: EndpointResolver,
    retry: RetryConfig,
    cancel: CancellationToken,
    degraded: AtomicBool,
    active: Arc<Mutex<HashSet<String>>>,
}

impl RemovalWorkflow {
    pub fn new(store: Arc<dyn BucketStore>, retry: RetryConfig, cancel: CancellationToken) -> Self {
        let resolver = EndpointResolver::new(Arc::clone(&store));
        Self {
            store,
            resolver,
            retry,
            cancel,
            degraded: AtomicBool::new(false),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether the session has lost connectivity and not yet re-verified it.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Probe the service and clear the degraded indicator on success.
    pub async fn verify_connectivity(&self) -> Result<()> {
        match self.store.list_buckets().await {
            Ok(_) => {
                self.degraded.store(false, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                self.observe(&e);
                Err(e)
            }
        }
    }

    /// Resolve a bucket to its regional endpoint binding (cached per
    /// session).
    pub async fn resolve_endpoint(&self, bucket: &BucketRef) -> Result<EndpointBinding> {
        self.ensure_online()?;
        self.resolver.resolve(bucket).await.inspect_err(|e| self.observe(e))
    }

    /// Pre-flight emptiness classification.
    pub async fn check_emptiness(&self, binding: &EndpointBinding) -> Result<BucketState> {
        self.ensure_online()?;
        guard::check(self.store.as_ref(), binding)
            .await
            .inspect_err(|e| self.observe(e))
    }

    /// Enumerate and delete everything in the bucket.
    ///
    /// Enumeration, planning, and execution are pipelined; deletion of
    /// early batches proceeds while later pages are still being fetched.
    /// An abort (cancellation, lost connectivity, fatal listing error)
    /// stops new work promptly and the report gathered so far is returned,
    /// with every unresolved item listed in its failures.
    pub async fn plan_and_execute_cleanup(
        &self,
        binding: &EndpointBinding,
    ) -> Result<DeletionReport> {
        self.ensure_online()?;
        let _claim = self.claim(&binding.bucket)?;
        Ok(self.cleanup_inner(binding).await)
    }

    /// Remove the bucket, re-checking emptiness immediately beforehand.
    pub async fn delete_bucket(&self, binding: &EndpointBinding) -> Result<RemovalDecision> {
        self.ensure_online()?;
        let _claim = self.claim(&binding.bucket)?;
        self.delete_bucket_inner(binding).await
    }

    /// The composed workflow: resolve, classify, optionally clean up, and
    /// remove (or refuse).
    ///
    /// `authorize_cleanup` is the caller's explicit go-ahead for recursive
    /// deletion of a non-empty bucket; without it, a non-empty bucket is a
    /// refusal.
    pub async fn remove_bucket(
        &self,
        bucket: &BucketRef,
        authorize_cleanup: bool,
    ) -> Result<RemovalSummary> {
        self.ensure_online()?;
        let _claim = self.claim(bucket.name())?;

        let binding = self.resolver.resolve(bucket).await.inspect_err(|e| self.observe(e))?;
        let state_before = guard::check(self.store.as_ref(), &binding)
            .await
            .inspect_err(|e| self.observe(e))?;

        let mut report = None;
        if state_before != BucketState::Empty {
            if !authorize_cleanup {
                return Ok(RemovalSummary {
                    state_before,
                    report,
                    decision: RemovalDecision::Refused(format!(
                        "bucket '{bucket}' is {state_before} and recursive cleanup was not authorized"
                    )),
                });
            }

            let cleanup = self.cleanup_inner(&binding).await;
            let complete = cleanup.is_complete();
            let unresolved = cleanup.failures.len();
            let reason = cleanup.abort_reason.clone();
            report = Some(cleanup);

            if !complete {
                let decision = RemovalDecision::Refused(match reason {
                    Some(reason) => format!("cleanup aborted: {reason}"),
                    None => format!("cleanup left {unresolved} items unresolved"),
                });
                return Ok(RemovalSummary {
                    state_before,
                    report,
                    decision,
                });
            }
        }

        let decision = self.delete_bucket_inner(&binding).await?;
        Ok(RemovalSummary {
            state_before,
            report,
            decision,
        })
    }

    async fn cleanup_inner(&self, binding: &EndpointBinding) -> DeletionReport {
        info!(bucket = binding.bucket, region = binding.region, "starting cleanup pass");

        let mut enumerator = ObjectVersionEnumerator::new(
            Arc::clone(&self.store),
            binding.clone(),
            self.retry.clone(),
            self.cancel.clone(),
        );
        let mut planner = DeletionPlanner::new();
        let mut executor = DeletionExecutor::new(
            Arc::clone(&self.store),
            binding.clone(),
            self.retry.clone(),
            self.cancel.clone(),
        );

        let mut abort_reason = None;
        loop {
            match enumerator.next().await {
                Ok(Some(record)) => {
                    if let Some(batch) = planner.push(&record) {
                        executor.submit(batch).await;
                    }
                }
                Ok(None) => break,
                Err(Error::Cancelled) => {
                    warn!(bucket = binding.bucket, "cleanup cancelled mid-enumeration");
                    abort_reason = Some("cancelled".to_string());
                    break;
                }
                Err(e) => {
                    warn!(bucket = binding.bucket, error = %e, "enumeration aborted");
                    self.observe(&e);
                    abort_reason = Some(e.to_string());
                    break;
                }
            }
        }

        // Records already enumerated are still attempted, or recorded as
        // unresolved after cancellation; they are never dropped.
        if let Some(batch) = planner.finish() {
            executor.submit(batch).await;
        }

        let mut report = executor.finish().await;
        report.abort_reason = abort_reason;

        if report
            .failures
            .iter()
            .any(|f| f.error_code.as_deref() == Some("NetworkUnavailable"))
        {
            self.degraded.store(true, Ordering::SeqCst);
        }

        info!(
            bucket = binding.bucket,
            attempted = report.total_attempted,
            succeeded = report.total_succeeded,
            failed = report.failures.len(),
            "cleanup pass finished"
        );
        report
    }

    async fn delete_bucket_inner(&self, binding: &EndpointBinding) -> Result<RemovalDecision> {
        // Mandatory re-check: never remove on a stale view of the bucket.
        let state = guard::check(self.store.as_ref(), binding)
            .await
            .inspect_err(|e| self.observe(e))?;
        if state != BucketState::Empty {
            return Ok(RemovalDecision::Refused(format!(
                "bucket '{}' still reports {state}; removal refused",
                binding.bucket
            )));
        }

        self.store
            .delete_bucket(binding)
            .await
            .inspect_err(|e| self.observe(e))?;
        info!(bucket = binding.bucket, region = binding.region, "bucket removed");
        Ok(RemovalDecision::Removed)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.is_degraded() {
            return Err(Error::NetworkUnavailable(
                "session is in degraded mode; re-verify connectivity before retrying".into(),
            ));
        }
        Ok(())
    }

    fn observe(&self, e: &Error) {
        if matches!(e, Error::NetworkUnavailable(_)) {
            warn!("connectivity lost; session entering degraded mode");
            self.degraded.store(true, Ordering::SeqCst);
        }
    }

    fn claim(&self, bucket: &str) -> Result<BucketClaim> {
        let mut active = self.active.lock().unwrap();
        if !active.insert(bucket.to_string()) {
            return Err(Error::Conflict(format!(
                "a deletion workflow for bucket '{bucket}' is already in progress"
            )));
        }
        Ok(BucketClaim {
            active: Arc::clone(&self.active),
            bucket: bucket.to_string(),
        })
    }
}

/// In-session exclusive hold on a bucket, released on drop.
#[derive(Debug)]
struct BucketClaim {
    active: Arc<Mutex<HashSet<String>>>,
    bucket: String,
}

impl Drop for BucketClaim {
    fn drop(&mut self) {
        self.active.lock().unwrap().remove(&self.bucket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::removal::execute::ABORTED_CODE;
    use crate::store::MockBucketStore;
    use crate::types::{
        CurrentPage, DeletionOutcome, ObjectVersionRecord, VersionMarker, VersionPage,
    };
    use std::sync::atomic::AtomicUsize;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    fn workflow(store: MockBucketStore) -> RemovalWorkflow {
        RemovalWorkflow::new(Arc::new(store), fast_retry(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_empty_bucket_removed_without_enumeration() {
        let mut store = MockBucketStore::new();
        store
            .expect_bucket_location()
            .times(1)
            .returning(|_| Ok(Some("eu-north-1".to_string())));
        store.expect_head_bucket().returning(|_| Ok(()));
        store.expect_versioning_enabled().returning(|_| Ok(false));
        // Only the two bounded guard probes; the enumerator never runs
        store
            .expect_list_current_page()
            .withf(|_, _, _, max_keys| *max_keys == 1)
            .times(2)
            .returning(|_, _, _, _| Ok(CurrentPage::default()));
        store.expect_list_version_page().never();
        store.expect_delete_batch().never();
        store.expect_delete_bucket().times(1).returning(|_| Ok(()));

        let workflow = workflow(store);
        let summary = workflow
            .remove_bucket(&BucketRef::new("empty-bucket"), false)
            .await
            .unwrap();

        assert_eq!(summary.state_before, BucketState::Empty);
        assert!(summary.report.is_none());
        assert_eq!(summary.decision, RemovalDecision::Removed);
    }

    #[tokio::test]
    async fn test_non_empty_bucket_refused_without_authorization() {
        let mut store = MockBucketStore::new();
        store
            .expect_bucket_location()
            .returning(|_| Ok(Some("eu-north-1".to_string())));
        store.expect_head_bucket().returning(|_| Ok(()));
        store.expect_versioning_enabled().returning(|_| Ok(false));
        store.expect_list_current_page().returning(|_, _, _, _| {
            Ok(CurrentPage {
                records: vec![ObjectVersionRecord::Current {
                    key: "a.txt".into(),
                    size: Some(1),
                    last_modified: None,
                }],
                continuation: None,
            })
        });
        store.expect_delete_batch().never();
        store.expect_delete_bucket().never();

        let workflow = workflow(store);
        let summary = workflow
            .remove_bucket(&BucketRef::new("full-bucket"), false)
            .await
            .unwrap();

        assert_eq!(summary.state_before, BucketState::NonEmptyCurrent);
        assert!(matches!(summary.decision, RemovalDecision::Refused(_)));
    }

    /// 2500 versioned objects, each with one delete marker: 5000 records,
    /// 5 batches, 5 delete calls, then removal once the re-check is clean.
    #[tokio::test]
    async fn test_versioned_bucket_full_cleanup_and_removal() {
        const OBJECTS: usize = 2500;
        const RECORDS: usize = OBJECTS * 2;

        let deleted = Arc::new(AtomicUsize::new(0));
        let delete_calls = Arc::new(AtomicUsize::new(0));

        let mut store = MockBucketStore::new();
        store
            .expect_bucket_location()
            .times(1)
            .returning(|_| Ok(Some("eu-north-1".to_string())));
        store.expect_head_bucket().returning(|_| Ok(()));
        store.expect_versioning_enabled().returning(|_| Ok(true));

        let deleted_for_list = Arc::clone(&deleted);
        store
            .expect_list_version_page()
            .returning(move |_, marker, max_keys| {
                if max_keys == 1 {
                    // Guard probe: non-empty until everything is deleted
                    if deleted_for_list.load(Ordering::SeqCst) >= RECORDS {
                        return Ok(VersionPage::default());
                    }
                    return Ok(VersionPage {
                        records: vec![ObjectVersionRecord::Version {
                            key: "k00000".into(),
                            version_id: "v0".into(),
                            size: Some(1),
                            last_modified: None,
                        }],
                        next: None,
                    });
                }

                // Enumeration: pages of 1000 records, marker carries the
                // next start index
                let start: usize = marker
                    .key_marker
                    .as_deref()
                    .map_or(0, |m| m.parse().unwrap());
                let end = (start + 1000).min(RECORDS);
                let records = (start..end)
                    .map(|i| {
                        let object = i / 2;
                        if i % 2 == 0 {
                            ObjectVersionRecord::Version {
                                key: format!("k{object:05}"),
                                version_id: format!("v{object}"),
                                size: Some(1),
                                last_modified: None,
                            }
                        } else {
                            ObjectVersionRecord::DeleteMarker {
                                key: format!("k{object:05}"),
                                version_id: format!("dm{object}"),
                                last_modified: None,
                            }
                        }
                    })
                    .collect();
                let next = (end < RECORDS).then(|| VersionMarker {
                    key_marker: Some(end.to_string()),
                    version_id_marker: Some(end.to_string()),
                });
                Ok(VersionPage { records, next })
            });

        let deleted_for_delete = Arc::clone(&deleted);
        let delete_calls_clone = Arc::clone(&delete_calls);
        store.expect_delete_batch().returning(move |_, batch| {
            delete_calls_clone.fetch_add(1, Ordering::SeqCst);
            deleted_for_delete.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(batch.items().iter().map(DeletionOutcome::success).collect())
        });
        store.expect_delete_bucket().times(1).returning(|_| Ok(()));

        let workflow = workflow(store);
        let summary = workflow
            .remove_bucket(&BucketRef::new("b1"), true)
            .await
            .unwrap();

        assert_eq!(summary.state_before, BucketState::NonEmptyVersioned);
        assert_eq!(summary.decision, RemovalDecision::Removed);

        let report = summary.report.unwrap();
        assert_eq!(report.total_attempted, RECORDS as u64);
        assert_eq!(report.total_succeeded, RECORDS as u64);
        assert!(report.failures.is_empty());
        assert_eq!(delete_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_removal_refused_when_recheck_still_non_empty() {
        // Every delete succeeds, but a concurrent writer keeps the bucket
        // non-empty: the re-check must refuse removal regardless.
        let mut store = MockBucketStore::new();
        store
            .expect_bucket_location()
            .returning(|_| Ok(Some("eu-north-1".to_string())));
        store.expect_head_bucket().returning(|_| Ok(()));
        store.expect_versioning_enabled().returning(|_| Ok(true));
        store
            .expect_list_version_page()
            .returning(|_, marker, max_keys| {
                if max_keys == 1 {
                    // Guard probe: always non-empty
                    return Ok(VersionPage {
                        records: vec![ObjectVersionRecord::Version {
                            key: "straggler".into(),
                            version_id: "v1".into(),
                            size: Some(1),
                            last_modified: None,
                        }],
                        next: None,
                    });
                }
                if marker == &VersionMarker::default() {
                    Ok(VersionPage {
                        records: vec![ObjectVersionRecord::Version {
                            key: "a".into(),
                            version_id: "v1".into(),
                            size: Some(1),
                            last_modified: None,
                        }],
                        next: None,
                    })
                } else {
                    Ok(VersionPage::default())
                }
            });
        store.expect_delete_batch().returning(|_, batch| {
            Ok(batch.items().iter().map(DeletionOutcome::success).collect())
        });
        store.expect_delete_bucket().never();

        let workflow = workflow(store);
        let summary = workflow
            .remove_bucket(&BucketRef::new("busy"), true)
            .await
            .unwrap();

        let report = summary.report.unwrap();
        assert!(report.is_complete());
        assert!(matches!(summary.decision, RemovalDecision::Refused(_)));
    }

    #[tokio::test]
    async fn test_network_drop_mid_enumeration_preserves_partial_report() {
        let mut store = MockBucketStore::new();
        store
            .expect_bucket_location()
            .returning(|_| Ok(Some("eu-north-1".to_string())));
        store.expect_head_bucket().returning(|_| Ok(()));
        store.expect_versioning_enabled().returning(|_| Ok(true));

        let mut list_calls = 0;
        store
            .expect_list_version_page()
            .returning(move |_, _, max_keys| {
                if max_keys == 1 {
                    return Ok(VersionPage {
                        records: vec![ObjectVersionRecord::Version {
                            key: "a".into(),
                            version_id: "v1".into(),
                            size: Some(1),
                            last_modified: None,
                        }],
                        next: None,
                    });
                }
                list_calls += 1;
                if list_calls == 1 {
                    Ok(VersionPage {
                        records: vec![ObjectVersionRecord::Version {
                            key: "a".into(),
                            version_id: "v1".into(),
                            size: Some(1),
                            last_modified: None,
                        }],
                        next: Some(VersionMarker {
                            key_marker: Some("a".into()),
                            version_id_marker: Some("v1".into()),
                        }),
                    })
                } else {
                    Err(Error::NetworkUnavailable("connection lost".into()))
                }
            });
        store
            .expect_delete_batch()
            .returning(|_, _| Err(Error::NetworkUnavailable("connection lost".into())));
        store.expect_delete_bucket().never();

        let workflow = workflow(store);
        let summary = workflow
            .remove_bucket(&BucketRef::new("b1"), true)
            .await
            .unwrap();

        let report = summary.report.unwrap();
        assert!(report.abort_reason.is_some());
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(summary.decision, RemovalDecision::Refused(_)));
        assert!(workflow.is_degraded());

        // Degraded mode: nothing starts until connectivity is re-verified
        let err = workflow
            .check_emptiness(&EndpointBinding {
                bucket: "b1".into(),
                region: "eu-north-1".into(),
                endpoint_url: "https://s3.eu-north-1.amazonaws.com".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_verify_connectivity_clears_degraded_mode() {
        let mut store = MockBucketStore::new();
        store.expect_list_buckets().returning(|| Ok(Vec::new()));

        let workflow = workflow(store);
        workflow.degraded.store(true, Ordering::SeqCst);
        assert!(workflow.is_degraded());

        workflow.verify_connectivity().await.unwrap();
        assert!(!workflow.is_degraded());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_and_reports_unresolved_items() {
        let cancel = CancellationToken::new();

        let mut store = MockBucketStore::new();
        store
            .expect_bucket_location()
            .returning(|_| Ok(Some("eu-north-1".to_string())));
        store.expect_head_bucket().returning(|_| Ok(()));
        store.expect_versioning_enabled().returning(|_| Ok(true));

        let cancel_in_mock = cancel.clone();
        store
            .expect_list_version_page()
            .returning(move |_, _, max_keys| {
                if max_keys == 1 {
                    return Ok(VersionPage {
                        records: vec![ObjectVersionRecord::Version {
                            key: "a".into(),
                            version_id: "v1".into(),
                            size: Some(1),
                            last_modified: None,
                        }],
                        next: None,
                    });
                }
                // The user hits Ctrl-C while the first page is in flight
                cancel_in_mock.cancel();
                Ok(VersionPage {
                    records: vec![ObjectVersionRecord::Version {
                        key: "a".into(),
                        version_id: "v1".into(),
                        size: Some(1),
                        last_modified: None,
                    }],
                    next: Some(VersionMarker {
                        key_marker: Some("a".into()),
                        version_id_marker: Some("v1".into()),
                    }),
                })
            });
        store.expect_delete_batch().never();
        store.expect_delete_bucket().never();

        let workflow =
            RemovalWorkflow::new(Arc::new(store), fast_retry(), cancel.clone());
        let summary = workflow
            .remove_bucket(&BucketRef::new("b1"), true)
            .await
            .unwrap();

        let report = summary.report.unwrap();
        assert_eq!(report.abort_reason.as_deref(), Some("cancelled"));
        // The enumerated-but-never-deleted record is reported, not dropped
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error_code.as_deref(), Some(ABORTED_CODE));
        assert!(matches!(summary.decision, RemovalDecision::Refused(_)));
    }

    #[tokio::test]
    async fn test_per_bucket_serialization() {
        let store = MockBucketStore::new();
        let workflow = workflow(store);

        let first = workflow.claim("b1").unwrap();
        let err = workflow.claim("b1").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // A different bucket is unaffected
        let _other = workflow.claim("b2").unwrap();

        drop(first);
        assert!(workflow.claim("b1").is_ok());
    }

    #[tokio::test]
    async fn test_resolve_endpoint_refused_while_degraded() {
        let mut store = MockBucketStore::new();
        store.expect_bucket_location().never();

        let workflow = workflow(store);
        workflow.degraded.store(true, Ordering::SeqCst);

        let err = workflow
            .resolve_endpoint(&BucketRef::new("b1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NetworkUnavailable(_)));
    }
}
