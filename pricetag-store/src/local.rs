//! Device-local persistence for design records.
//!
//! Records are JSON files under a data directory, one collection per
//! subdirectory:
//!
//! ```text
//! data_dir/
//!   designs/{design_id}.json       versioned DesignDocument payloads
//!   products/{name}.json           product catalog
//!   history/{entry_id}.json        print/usage history, capped at 100
//!   saved_labels/{id}.json         legacy SavedLabel payloads
//!   settings.json                  AppSettings
//! ```
//!
//! Writes surface their errors; best-effort reads (listing, settings)
//! degrade to an empty result plus a logged condition.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use pricetag_core::{AppSettings, DesignDocument, DesignId, DesignRecord, ProductInfo, SavedLabel};

use crate::error::{StoreError, StoreResult};

const DESIGNS_DIR: &str = "designs";
const PRODUCTS_DIR: &str = "products";
const HISTORY_DIR: &str = "history";
const SAVED_LABELS_DIR: &str = "saved_labels";
const SETTINGS_FILE: &str = "settings.json";

/// Number of history entries retained by [`LocalStore::prune_history`].
pub const HISTORY_CAP: usize = 100;

/// One history record: a design was used (printed or exported).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry identifier.
    pub id: String,
    /// The design/template this entry refers to.
    pub template_id: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

/// Keyed, versioned on-device store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    /// Open (and lay out) a store under the given data directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directories cannot be created.
    pub async fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        for sub in [DESIGNS_DIR, PRODUCTS_DIR, HISTORY_DIR, SAVED_LABELS_DIR] {
            tokio::fs::create_dir_all(data_dir.join(sub)).await?;
        }
        Ok(Self { data_dir })
    }

    /// The store's data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn design_path(&self, id: DesignId) -> PathBuf {
        self.data_dir.join(DESIGNS_DIR).join(format!("{id}.json"))
    }

    // -----------------------------------------------------------------------
    // Designs
    // -----------------------------------------------------------------------

    /// Persist a design, assigning an id at first save.
    ///
    /// `updated_at` is stamped on every put; a record saved for the first
    /// time also gets `created_at` stamped. Returns the stamped record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Model`] for invalid records and
    /// [`StoreError::Io`] if the write fails.
    pub async fn put_design(&self, mut record: DesignRecord) -> StoreResult<DesignRecord> {
        record.validate()?;
        let first_save = record.id.is_none();
        let id = record.ensure_id();
        if first_save {
            record.created_at = Utc::now();
        }
        record.touch();

        write_json(&self.design_path(id), &DesignDocument::from(&record)).await?;
        Ok(record)
    }

    /// Fetch a design by id. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on read failure and [`StoreError::Parse`]
    /// if the stored payload is not a valid design document.
    pub async fn get_design(&self, id: DesignId) -> StoreResult<Option<DesignRecord>> {
        match read_json::<DesignDocument>(&self.design_path(id)).await? {
            Some(doc) => {
                let record = doc
                    .into_record()
                    .map_err(|e| StoreError::Parse(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all designs, most recently updated first.
    ///
    /// Best-effort: an unreadable directory yields an empty list and a
    /// logged condition; an unparseable file is skipped the same way.
    pub async fn list_designs(&self) -> Vec<DesignRecord> {
        let dir = self.data_dir.join(DESIGNS_DIR);
        let mut records: Vec<DesignRecord> = Vec::new();

        for path in json_files(&dir).await {
            match read_json::<DesignDocument>(&path).await {
                Ok(Some(doc)) => match doc.into_record() {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("skipping design {}: {e}", path.display()),
                },
                Ok(None) => {}
                Err(e) => warn!("skipping design {}: {e}", path.display()),
            }
        }

        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records
    }

    /// Delete a design. Deleting a missing design is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be removed.
    pub async fn delete_design(&self, id: DesignId) -> StoreResult<()> {
        match tokio::fs::remove_file(self.design_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Mutate a design in place through a closure, restamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the design does not exist, plus
    /// the usual read/write errors.
    pub async fn update_design<F>(&self, id: DesignId, f: F) -> StoreResult<DesignRecord>
    where
        F: FnOnce(&mut DesignRecord),
    {
        let mut record = self
            .get_design(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(&mut record);
        record.validate()?;
        record.touch();
        write_json(&self.design_path(id), &DesignDocument::from(&record)).await?;
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Record that a template was used just now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub async fn record_history(&self, template_id: &str) -> StoreResult<HistoryEntry> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            template_id: template_id.to_string(),
            created_at: Utc::now(),
        };
        let path = self
            .data_dir
            .join(HISTORY_DIR)
            .join(format!("{}.json", entry.id));
        write_json(&path, &entry).await?;
        Ok(entry)
    }

    /// List history entries, most recently created first. Best-effort.
    pub async fn list_history(&self) -> Vec<HistoryEntry> {
        let dir = self.data_dir.join(HISTORY_DIR);
        let mut entries: Vec<HistoryEntry> = Vec::new();

        for path in json_files(&dir).await {
            match read_json::<HistoryEntry>(&path).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => warn!("skipping history entry {}: {e}", path.display()),
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    /// Retain only the [`HISTORY_CAP`] most recently created entries.
    ///
    /// Returns how many entries were deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if an entry file cannot be removed.
    pub async fn prune_history(&self) -> StoreResult<usize> {
        let entries = self.list_history().await;
        let mut removed = 0;

        for entry in entries.iter().skip(HISTORY_CAP) {
            let path = self
                .data_dir
                .join(HISTORY_DIR)
                .join(format!("{}.json", entry.id));
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }

        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Legacy saved labels
    // -----------------------------------------------------------------------

    /// Persist a legacy saved label.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub async fn put_saved_label(&self, label: &SavedLabel) -> StoreResult<()> {
        let path = self
            .data_dir
            .join(SAVED_LABELS_DIR)
            .join(format!("{}.json", sanitize_filename(&label.id)));
        write_json(&path, label).await
    }

    /// List legacy saved labels, newest first. Best-effort.
    pub async fn list_saved_labels(&self) -> Vec<SavedLabel> {
        let dir = self.data_dir.join(SAVED_LABELS_DIR);
        let mut labels: Vec<SavedLabel> = Vec::new();

        for path in json_files(&dir).await {
            match read_json::<SavedLabel>(&path).await {
                Ok(Some(label)) => labels.push(label),
                Ok(None) => {}
                Err(e) => warn!("skipping saved label {}: {e}", path.display()),
            }
        }

        labels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        labels
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    /// Persist a catalog product, keyed by its name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub async fn put_product(&self, product: &ProductInfo) -> StoreResult<()> {
        let path = self
            .data_dir
            .join(PRODUCTS_DIR)
            .join(format!("{}.json", sanitize_filename(&product.name)));
        write_json(&path, product).await
    }

    /// List catalog products. Best-effort.
    pub async fn list_products(&self) -> Vec<ProductInfo> {
        let dir = self.data_dir.join(PRODUCTS_DIR);
        let mut products: Vec<ProductInfo> = Vec::new();

        for path in json_files(&dir).await {
            match read_json::<ProductInfo>(&path).await {
                Ok(Some(product)) => products.push(product),
                Ok(None) => {}
                Err(e) => warn!("skipping product {}: {e}", path.display()),
            }
        }

        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Load settings, degrading to defaults when absent or unreadable.
    pub async fn load_settings(&self) -> AppSettings {
        let path = self.data_dir.join(SETTINGS_FILE);
        match read_json::<AppSettings>(&path).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("no settings file yet, using defaults");
                AppSettings::default()
            }
            Err(e) => {
                warn!("settings unreadable ({e}), using defaults");
                AppSettings::default()
            }
        }
    }

    /// Persist settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub async fn save_settings(&self, settings: &AppSettings) -> StoreResult<()> {
        write_json(&self.data_dir.join(SETTINGS_FILE), settings).await
    }
}

/// Sanitize an arbitrary key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Paths of all `.json` files in a directory; empty (and logged) on error.
async fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read {}: {e}", dir.display());
            return paths;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    paths.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("error while listing {}: {e}", dir.display());
                break;
            }
        }
    }

    paths
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = serde_json::from_str(&contents).map_err(|e| StoreError::Parse(e.to_string()))?;
    Ok(Some(value))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Parse(e.to_string()))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricetag_core::{ElementKind, LabelSize, LayoutElement};

    fn sample_record(name: &str) -> DesignRecord {
        let mut record =
            DesignRecord::new(ProductInfo::new(name, 4.2), LabelSize::new(40.0, 30.0));
        record.push_element(LayoutElement::new(ElementKind::Text {
            content: name.to_string(),
        }));
        record
    }

    async fn open_store(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::open(dir.path()).await.expect("open store")
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let saved = store
            .put_design(sample_record("Green Tea"))
            .await
            .expect("put");
        let id = saved.id.expect("id assigned at first save");

        let loaded = store.get_design(id).await.expect("get").expect("exists");
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_put_stamps_updated_at() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let first = store
            .put_design(sample_record("Green Tea"))
            .await
            .expect("put");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.put_design(first.clone()).await.expect("re-put");

        assert_eq!(second.id, first.id, "identity never reassigned");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_put_rejects_invalid_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let mut record = sample_record("Broken");
        record.size = LabelSize::new(0.0, 30.0);
        assert!(matches!(
            store.put_design(record).await,
            Err(StoreError::Model(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_and_skips_corrupt_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let a = store.put_design(sample_record("A")).await.expect("put a");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = store.put_design(sample_record("B")).await.expect("put b");

        // A corrupt payload must be skipped, not abort the listing.
        std::fs::write(dir.path().join("designs/corrupt.json"), "{ not json")
            .expect("write corrupt");

        let listed = store.list_designs().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, b.id, "most recently updated first");
        assert_eq!(listed[1].id, a.id);
    }

    #[tokio::test]
    async fn test_update_through_closure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let saved = store
            .put_design(sample_record("Rename me"))
            .await
            .expect("put");
        let id = saved.id.expect("id");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = store
            .update_design(id, |record| {
                record.name = Some("Renamed".to_string());
            })
            .await
            .expect("update");

        assert_eq!(updated.display_name(), "Renamed");
        assert!(updated.updated_at > saved.updated_at);

        let missing = DesignId::new();
        assert!(matches!(
            store.update_design(missing, |_| {}).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let saved = store.put_design(sample_record("Gone")).await.expect("put");
        let id = saved.id.expect("id");

        store.delete_design(id).await.expect("delete");
        assert!(store.get_design(id).await.expect("get").is_none());
        store.delete_design(id).await.expect("delete again");
    }

    #[tokio::test]
    async fn test_history_prune_retains_newest_hundred() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        for i in 0..150 {
            store
                .record_history(&format!("template-{i}"))
                .await
                .expect("record");
        }

        let before = store.list_history().await;
        assert_eq!(before.len(), 150);
        let expected_kept: Vec<String> = before
            .iter()
            .take(HISTORY_CAP)
            .map(|e| e.id.clone())
            .collect();

        let removed = store.prune_history().await.expect("prune");
        assert_eq!(removed, 50);

        let after = store.list_history().await;
        assert_eq!(after.len(), HISTORY_CAP);
        let kept: Vec<String> = after.iter().map(|e| e.id.clone()).collect();
        assert_eq!(kept, expected_kept, "the most recently created survive");
    }

    #[tokio::test]
    async fn test_settings_default_then_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        assert_eq!(store.load_settings().await, AppSettings::default());

        let mut settings = AppSettings::default();
        settings.language = "en-US".to_string();
        store.save_settings(&settings).await.expect("save");
        assert_eq!(store.load_settings().await, settings);
    }

    #[tokio::test]
    async fn test_saved_labels_surface() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        let label = SavedLabel::from_record(
            &store.put_design(sample_record("Soap")).await.expect("put"),
            Some("data:image/png;base64,AAAA".to_string()),
        );
        store.put_saved_label(&label).await.expect("put label");

        let listed = store.list_saved_labels().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, label.id);
    }

    #[tokio::test]
    async fn test_products_keyed_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = open_store(&dir).await;

        store
            .put_product(&ProductInfo::new("Olive Oil 500ml", 8.9))
            .await
            .expect("put");
        store
            .put_product(&ProductInfo::new("Olive Oil 500ml", 7.9))
            .await
            .expect("overwrite same key");

        let products = store.list_products().await;
        assert_eq!(products.len(), 1);
        assert!((products[0].price - 7.9).abs() < f64::EPSILON);
    }
}
