//! Local/remote reconciliation.
//!
//! The merge is a pure, flat override: records are keyed by their dedup key
//! and a remote record replaces a local one with the same key wholesale.
//! There is no timestamp comparison and no field-level merging; the remote
//! copy is authoritative whenever both sides hold one.

use std::collections::HashMap;

use tracing::{debug, warn};

use pricetag_core::DesignRecord;

use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::StoreResult;

/// Merge local and remote records into one view.
///
/// Keyed by [`DesignRecord::dedup_key`]. Local records appear in their input
/// order; a remote record with a matching key replaces the local one in
/// place, and remote records with fresh keys are appended in their input
/// order. Inputs are not modified.
#[must_use]
pub fn merged_view(local: &[DesignRecord], remote: &[DesignRecord]) -> Vec<DesignRecord> {
    let mut merged: Vec<DesignRecord> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in local.iter().chain(remote) {
        let key = record.dedup_key();
        match index.get(&key) {
            Some(&slot) => merged[slot] = record.clone(),
            None => {
                index.insert(key, merged.len());
                merged.push(record.clone());
            }
        }
    }

    merged
}

/// Outcome tally of a push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records written to the remote store.
    pub succeeded: usize,
    /// Records that failed; each failure is logged, none aborts the batch.
    pub failed: usize,
}

impl SyncReport {
    /// True when every record was written.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Folds a [`LocalStore`] and a [`RemoteStore`] into one logical store.
pub struct Synchronizer {
    local: LocalStore,
    remote: RemoteStore,
}

impl Synchronizer {
    /// Pair a local store with a remote store.
    #[must_use]
    pub const fn new(local: LocalStore, remote: RemoteStore) -> Self {
        Self { local, remote }
    }

    /// The local side.
    #[must_use]
    pub const fn local(&self) -> &LocalStore {
        &self.local
    }

    /// The remote side.
    #[must_use]
    pub const fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    /// The merged view of both stores, remote taking precedence.
    ///
    /// Reads degrade instead of failing: a missing principal means the view
    /// is local-only, and any other remote failure is logged and treated as
    /// an empty remote side.
    pub async fn merged_designs(&self) -> Vec<DesignRecord> {
        let local = self.local.list_designs().await;

        let remote = match self.remote.list_designs().await {
            Ok(records) => records,
            Err(e) if e.is_not_authenticated() => {
                debug!("not signed in, merged view is local-only");
                Vec::new()
            }
            Err(e) => {
                warn!("remote listing failed, merged view is local-only: {e}");
                Vec::new()
            }
        };

        merged_view(&local, &remote)
    }

    /// Push the given records to the remote store, one upsert each.
    ///
    /// Failures are isolated per record: each is logged and tallied, and the
    /// remaining records are still attempted.
    ///
    /// # Errors
    ///
    /// [`crate::StoreError::NotAuthenticated`] before any write when no
    /// principal is available; per-record failures land in the report
    /// instead.
    pub async fn push_to_remote(&self, records: &[DesignRecord]) -> StoreResult<SyncReport> {
        let mut report = SyncReport::default();

        for record in records {
            match self.remote.put_design(record.clone()).await {
                Ok(_) => report.succeeded += 1,
                Err(e) if e.is_not_authenticated() => return Err(e),
                Err(e) => {
                    warn!("failed to push design '{}': {e}", record.display_name());
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Push every locally stored design to the remote store.
    ///
    /// # Errors
    ///
    /// Same as [`Synchronizer::push_to_remote`].
    pub async fn push_local_to_remote(&self) -> StoreResult<SyncReport> {
        let local = self.local.list_designs().await;
        self.push_to_remote(&local).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use pricetag_core::{DesignId, LabelSize, ProductInfo};

    use crate::remote::{Principal, StaticAuth};

    fn record(name: &str, id: Option<DesignId>) -> DesignRecord {
        let mut record =
            DesignRecord::new(ProductInfo::new(name, 1.0), LabelSize::new(40.0, 30.0));
        record.id = id;
        record
    }

    #[test]
    fn test_remote_replaces_local_with_same_id() {
        let id = DesignId::new();
        let local = vec![record("Local copy", Some(id))];
        let remote = vec![record("Remote copy", Some(id))];

        let merged = merged_view(&local, &remote);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].product.name, "Remote copy");
    }

    #[test]
    fn test_merge_preserves_insertion_order() {
        let shared = DesignId::new();
        let local = vec![
            record("A", Some(DesignId::new())),
            record("B", Some(shared)),
            record("C", Some(DesignId::new())),
        ];
        let remote = vec![
            record("B remote", Some(shared)),
            record("D", Some(DesignId::new())),
        ];

        let merged = merged_view(&local, &remote);
        let names: Vec<&str> = merged.iter().map(|r| r.product.name.as_str()).collect();
        assert_eq!(names, ["A", "B remote", "C", "D"]);
    }

    #[test]
    fn test_unsaved_records_collapse_on_product_name() {
        let local = vec![record("Same tea", None)];
        let remote = vec![record("Same tea", None)];

        let merged = merged_view(&local, &remote);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let shared = DesignId::new();
        let local = vec![record("L", Some(shared)), record("Only local", None)];
        let remote = vec![record("R", Some(shared)), record("Only remote", None)];

        let once = merged_view(&local, &remote);
        let twice = merged_view(&local, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let id = DesignId::new();
        let local = vec![record("Local", Some(id))];
        let remote = vec![record("Remote", Some(id))];

        let _ = merged_view(&local, &remote);
        assert_eq!(local[0].product.name, "Local");
        assert_eq!(remote[0].product.name, "Remote");
    }

    async fn synchronizer_for(
        dir: &tempfile::TempDir,
        server: &MockServer,
        auth: StaticAuth,
    ) -> Synchronizer {
        let local = LocalStore::open(dir.path()).await.expect("local store");
        let remote = RemoteStore::new(server.uri(), Arc::new(auth)).expect("remote store");
        Synchronizer::new(local, remote)
    }

    fn principal() -> Principal {
        Principal {
            user_id: "user-1".to_string(),
            access_token: "token-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_merged_view_is_local_only_when_signed_out() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let sync = synchronizer_for(&dir, &server, StaticAuth::anonymous()).await;

        sync.local()
            .put_design(record("Offline only", None))
            .await
            .expect("put");

        let merged = sync.merged_designs().await;
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].product.name, "Offline only");
    }

    #[tokio::test]
    async fn test_merged_view_degrades_on_remote_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let sync = synchronizer_for(&dir, &server, StaticAuth::signed_in(principal())).await;
        sync.local()
            .put_design(record("Survives", None))
            .await
            .expect("put");

        let merged = sync.merged_designs().await;
        assert_eq!(merged.len(), 1);
    }

    #[tokio::test]
    async fn test_push_isolates_per_record_failures() {
        let server = MockServer::start().await;
        // First upsert fails, the second succeeds.
        Mock::given(method("POST"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let sync = synchronizer_for(&dir, &server, StaticAuth::signed_in(principal())).await;
        let batch = vec![
            record("First", Some(DesignId::new())),
            record("Second", Some(DesignId::new())),
        ];

        let report = sync.push_to_remote(&batch).await.expect("push");
        assert_eq!(report, SyncReport { succeeded: 1, failed: 1 });
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_push_requires_a_principal() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let sync = synchronizer_for(&dir, &server, StaticAuth::anonymous()).await;

        let err = sync
            .push_to_remote(&[record("Nope", None)])
            .await
            .expect_err("must fail");
        assert!(err.is_not_authenticated());
    }
}
