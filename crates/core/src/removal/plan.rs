//! Batching of deletion work
//!
//! Groups enumerated records into bulk-delete batches at the remote API's
//! per-request ceiling. Batches are emitted the moment they fill, so
//! enumeration and deletion pipeline without materializing the full object
//! list; memory stays bounded no matter how large the bucket is.

use crate::types::{DeleteItem, DeletionBatch, ObjectVersionRecord};

/// Incremental planner: feed records in enumeration order, collect full
/// batches as they appear, and flush the remainder at the end.
#[derive(Debug, Default)]
pub struct DeletionPlanner {
    pending: DeletionBatch,
}

impl DeletionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns a batch exactly when this record fills one.
    pub fn push(&mut self, record: &ObjectVersionRecord) -> Option<DeletionBatch> {
        let pushed = self.pending.push(DeleteItem::from(record));
        debug_assert!(pushed, "planner batch exceeded the delete ceiling");

        if self.pending.is_full() {
            Some(self.pending.take())
        } else {
            None
        }
    }

    /// Flush the final partial batch, if any records remain.
    pub fn finish(mut self) -> Option<DeletionBatch> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.take())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_DELETE_BATCH;

    fn current(key: String) -> ObjectVersionRecord {
        ObjectVersionRecord::Current {
            key,
            size: None,
            last_modified: None,
        }
    }

    fn plan_all(count: usize) -> Vec<DeletionBatch> {
        let mut planner = DeletionPlanner::new();
        let mut batches = Vec::new();
        for i in 0..count {
            if let Some(batch) = planner.push(&current(format!("k{i:05}"))) {
                batches.push(batch);
            }
        }
        if let Some(batch) = planner.finish() {
            batches.push(batch);
        }
        batches
    }

    #[test]
    fn test_batch_count_is_ceiling_division() {
        // ceil(N / 1000) batches, each at most 1000 items
        for (count, expected) in [(0, 0), (1, 1), (999, 1), (1000, 1), (1001, 2), (2500, 3)] {
            let batches = plan_all(count);
            assert_eq!(batches.len(), expected, "count = {count}");
            assert!(batches.iter().all(|b| b.len() <= MAX_DELETE_BATCH));
            let total: usize = batches.iter().map(DeletionBatch::len).sum();
            assert_eq!(total, count);
        }
    }

    #[test]
    fn test_every_record_covered_exactly_once() {
        let batches = plan_all(2345);
        let mut keys: Vec<String> = batches
            .iter()
            .flat_map(|b| b.items().iter().map(|i| i.key.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 2345);
    }

    #[test]
    fn test_batch_emitted_as_soon_as_full() {
        let mut planner = DeletionPlanner::new();
        for i in 0..MAX_DELETE_BATCH - 1 {
            assert!(planner.push(&current(format!("k{i}"))).is_none());
        }
        // The 1000th record triggers the emission immediately
        let batch = planner.push(&current("last".into())).unwrap();
        assert_eq!(batch.len(), MAX_DELETE_BATCH);
        assert!(planner.finish().is_none());
    }

    #[test]
    fn test_version_ids_preserved_in_order() {
        let mut planner = DeletionPlanner::new();

        assert!(
            planner
                .push(&ObjectVersionRecord::Version {
                    key: "a".into(),
                    version_id: "v1".into(),
                    size: None,
                    last_modified: None,
                })
                .is_none()
        );
        assert!(
            planner
                .push(&ObjectVersionRecord::DeleteMarker {
                    key: "a".into(),
                    version_id: "dm1".into(),
                    last_modified: None,
                })
                .is_none()
        );
        assert!(planner.push(&current("b".into())).is_none());

        let batch = planner.finish().unwrap();
        let items = batch.items();
        assert_eq!(items[0].version_id.as_deref(), Some("v1"));
        assert_eq!(items[1].version_id.as_deref(), Some("dm1"));
        assert_eq!(items[2].version_id, None);
    }
}
