//! Authenticated persistence in the shared backend.
//!
//! The backend exposes one REST-style `projects` relation
//! (`user_id, label_id, name, data, created_at, updated_at`); the whole
//! design record travels as a serialized [`DesignDocument`] in the `data`
//! column, and writes are idempotent upserts with `label_id` as the
//! conflict target.
//!
//! Every operation first resolves a principal from the injected
//! [`AuthProvider`]; a missing principal is the distinct, recoverable
//! [`StoreError::NotAuthenticated`] condition, not a storage failure.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use pricetag_core::{DesignDocument, DesignId, DesignRecord};

use crate::error::{StoreError, StoreResult};

/// An authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Backend user id; rows are scoped to it.
    pub user_id: String,
    /// Bearer token sent with every request.
    pub access_token: String,
}

/// Source of the current principal.
///
/// An explicit handle injected into [`RemoteStore`]; the embedding
/// application adapts its session machinery to this trait.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in principal, if any.
    async fn principal(&self) -> Option<Principal>;
}

/// [`AuthProvider`] holding a principal set by the embedder.
#[derive(Debug, Default)]
pub struct StaticAuth {
    principal: RwLock<Option<Principal>>,
}

impl StaticAuth {
    /// An anonymous provider (no principal).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A provider already signed in as the given principal.
    #[must_use]
    pub fn signed_in(principal: Principal) -> Self {
        Self {
            principal: RwLock::new(Some(principal)),
        }
    }

    /// Replace the current principal.
    pub fn set(&self, principal: Option<Principal>) {
        let mut guard = self
            .principal
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = principal;
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn principal(&self) -> Option<Principal> {
        self.principal
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// One row of the `projects` relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectRow {
    user_id: String,
    label_id: String,
    name: String,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Keyed persistence in the shared backend, scoped to one principal.
#[derive(Clone)]
pub struct RemoteStore {
    inner: Arc<InnerStore>,
}

struct InnerStore {
    http: Client,
    projects_url: Url,
    auth: Arc<dyn AuthProvider>,
}

impl RemoteStore {
    /// Create a store against the given backend base URL.
    ///
    /// `base_url` is the API root; the `projects` resource path is appended.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] for a malformed URL and
    /// [`StoreError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>, auth: Arc<dyn AuthProvider>) -> StoreResult<Self> {
        let mut url = Url::parse(base_url.as_ref())
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("projects");

        let http = Client::builder().user_agent("pricetag-store").build()?;

        Ok(Self {
            inner: Arc::new(InnerStore {
                http,
                projects_url: url,
                auth,
            }),
        })
    }

    async fn resolve(&self) -> StoreResult<Principal> {
        self.inner
            .auth
            .principal()
            .await
            .ok_or(StoreError::NotAuthenticated)
    }

    async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::RemoteStatus {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Upsert a design, keyed by its stable id.
    ///
    /// The id is assigned before the write when missing so the upsert key is
    /// stable from then on. An id conflict is resolved by the backend as
    /// last write wins; the adapter performs no merge of its own.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a principal; otherwise the
    /// usual HTTP and validation errors.
    pub async fn put_design(&self, mut record: DesignRecord) -> StoreResult<DesignRecord> {
        let principal = self.resolve().await?;
        record.validate()?;

        let first_save = record.id.is_none();
        let id = record.ensure_id();
        if first_save {
            record.created_at = Utc::now();
        }
        record.touch();

        let row = ProjectRow {
            user_id: principal.user_id.clone(),
            label_id: id.to_string(),
            name: record.display_name().to_string(),
            data: serde_json::to_value(DesignDocument::from(&record))
                .map_err(|e| StoreError::Parse(e.to_string()))?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };

        let mut url = self.inner.projects_url.clone();
        url.query_pairs_mut().append_pair("on_conflict", "label_id");

        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(&principal.access_token)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row])
            .send()
            .await?;
        Self::check_status(response).await?;

        Ok(record)
    }

    /// Fetch one of the principal's designs. `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a principal; a row whose
    /// payload cannot be parsed is [`StoreError::Parse`].
    pub async fn get_design(&self, id: DesignId) -> StoreResult<Option<DesignRecord>> {
        let principal = self.resolve().await?;

        let mut url = self.inner.projects_url.clone();
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{}", principal.user_id))
            .append_pair("label_id", &format!("eq.{id}"));

        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(&principal.access_token)
            .send()
            .await?;
        let rows: Vec<ProjectRow> = Self::check_status(response).await?.json().await?;

        match rows.into_iter().next() {
            Some(row) => {
                let record = parse_row(row).map_err(StoreError::Parse)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all of the principal's designs, most recently updated first.
    ///
    /// Rows whose embedded payload fails to parse are excluded from the
    /// result (and logged) rather than failing the whole read.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a principal; HTTP errors
    /// otherwise.
    pub async fn list_designs(&self) -> StoreResult<Vec<DesignRecord>> {
        let principal = self.resolve().await?;

        let mut url = self.inner.projects_url.clone();
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{}", principal.user_id))
            .append_pair("order", "updated_at.desc");

        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(&principal.access_token)
            .send()
            .await?;
        let rows: Vec<ProjectRow> = Self::check_status(response).await?.json().await?;

        let records = rows
            .into_iter()
            .filter_map(|row| {
                let label_id = row.label_id.clone();
                match parse_row(row) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("skipping remote design {label_id}: {e}");
                        None
                    }
                }
            })
            .collect();

        Ok(records)
    }

    /// Delete one of the principal's designs. Missing rows are a no-op.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a principal; HTTP errors
    /// otherwise.
    pub async fn delete_design(&self, id: DesignId) -> StoreResult<()> {
        let principal = self.resolve().await?;

        let mut url = self.inner.projects_url.clone();
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{}", principal.user_id))
            .append_pair("label_id", &format!("eq.{id}"));

        let response = self
            .inner
            .http
            .delete(url)
            .bearer_auth(&principal.access_token)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Read-modify-upsert a design through a closure.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the design does not exist remotely,
    /// plus the errors of [`RemoteStore::get_design`] and
    /// [`RemoteStore::put_design`].
    pub async fn update_design<F>(&self, id: DesignId, f: F) -> StoreResult<DesignRecord>
    where
        F: FnOnce(&mut DesignRecord) + Send,
    {
        let mut record = self
            .get_design(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(&mut record);
        self.put_design(record).await
    }
}

/// Decode a row's embedded payload into a record.
fn parse_row(row: ProjectRow) -> Result<DesignRecord, String> {
    let doc: DesignDocument = serde_json::from_value(row.data).map_err(|e| e.to_string())?;
    doc.into_record().map_err(|e| e.to_string())
}
