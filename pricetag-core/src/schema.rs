//! Versioned serialized form of design records.
//!
//! [`DesignDocument`] is the wire/disk shape shared by the local and remote
//! stores. Every field carries a serde default so records written by older
//! releases (or missing optional data) still load; unknown extra fields are
//! ignored. [`SavedLabel`] is the flattened legacy format of the older
//! storage surface, mapped onto the same conceptual entity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DesignResult;
use crate::record::{
    DesignId, DesignRecord, ElementId, FontConfig, LabelSize, LayoutElement, ProductInfo,
};

/// Current payload schema version.
///
/// Payloads written before versioning carry no `schema_version` field and
/// deserialize as version 0.
pub const SCHEMA_VERSION: u32 = 1;

fn default_timestamp() -> DateTime<Utc> {
    // Legacy payloads without timestamps sort oldest, not newest.
    DateTime::<Utc>::UNIX_EPOCH
}

/// Document form of a [`DesignRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignDocument {
    /// Payload schema version; 0 means pre-versioning.
    #[serde(default)]
    pub schema_version: u32,
    /// Stable identity as a UUID string, absent before first save.
    #[serde(default)]
    pub id: Option<String>,
    /// Optional human label.
    #[serde(default)]
    pub name: Option<String>,
    /// Physical size in millimeters.
    #[serde(default)]
    pub size: LabelSize,
    /// Product attributes.
    #[serde(default)]
    pub product: ProductInfo,
    /// Layout elements in z-order.
    #[serde(default)]
    pub layout: Vec<LayoutElement>,
    /// Font styling keyed by element id string.
    #[serde(default)]
    pub font_configs: HashMap<String, FontConfig>,
    /// Creation timestamp.
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last-mutation timestamp.
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<&DesignRecord> for DesignDocument {
    fn from(record: &DesignRecord) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: record.id.map(|id| id.to_string()),
            name: record.name.clone(),
            size: record.size,
            product: record.product.clone(),
            layout: record.layout.clone(),
            font_configs: record
                .font_configs
                .iter()
                .map(|(id, cfg)| (id.to_string(), cfg.clone()))
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl DesignDocument {
    /// Convert the document back into a runtime record.
    ///
    /// Font-config entries whose key is not a valid element id are dropped;
    /// they cannot be matched to anything and keeping them would poison
    /// later saves.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DesignError::InvalidId`] if the design id is present
    /// but malformed.
    pub fn into_record(self) -> DesignResult<DesignRecord> {
        let id = self.id.as_deref().map(DesignId::parse).transpose()?;

        let font_configs = self
            .font_configs
            .into_iter()
            .filter_map(|(key, cfg)| ElementId::parse(&key).ok().map(|id| (id, cfg)))
            .collect();

        Ok(DesignRecord {
            id,
            name: self.name,
            size: self.size,
            product: self.product,
            layout: self.layout,
            font_configs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Flattened record used by the legacy storage surface.
///
/// Not the canonical shape; [`SavedLabel::into_record`] maps it onto a
/// [`DesignRecord`] so both serializations describe the same entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLabel {
    /// Legacy identifier; arbitrary string, not necessarily a UUID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Preview image as a data URI.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Loose product payload (`{"name": ..., "price": ...}` and friends).
    #[serde(default)]
    pub product_data: serde_json::Value,
    /// Physical size in millimeters.
    #[serde(default)]
    pub label_size: LabelSize,
    /// Creation timestamp.
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl SavedLabel {
    /// Build a legacy label from a canonical record.
    #[must_use]
    pub fn from_record(record: &DesignRecord, thumbnail: Option<String>) -> Self {
        Self {
            id: record.dedup_key(),
            name: record.name.clone(),
            thumbnail,
            product_data: serde_json::json!({
                "name": record.product.name,
                "price": record.product.price,
            }),
            label_size: record.size,
            created_at: record.created_at,
        }
    }

    /// Map the legacy label onto the canonical record shape.
    ///
    /// A legacy id that is not a UUID becomes an unsaved record (`id: None`)
    /// so the next save assigns a stable identity; the product name and
    /// price are lifted out of `product_data` when present.
    #[must_use]
    pub fn into_record(self) -> DesignRecord {
        let id = DesignId::parse(&self.id).ok();
        let name = self
            .product_data
            .get("name")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_default();
        let price = self
            .product_data
            .get("price")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or_default();

        DesignRecord {
            id,
            name: self.name,
            size: self.label_size,
            product: ProductInfo::new(name, price),
            layout: Vec::new(),
            font_configs: HashMap::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
