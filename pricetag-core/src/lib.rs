//! # Pricetag Core
//!
//! Canonical data model for price-label designs.
//!
//! A [`DesignRecord`] describes one print-ready label: physical size in
//! millimeters, the product it advertises, an ordered layout of positioned
//! elements, and per-element font styling. The model is I/O-free; the store
//! and export crates build on it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               pricetag-core                 │
//! ├──────────────────────┬──────────────────────┤
//! │  Record model        │  Versioned schema    │
//! │  - DesignRecord      │  - DesignDocument    │
//! │  - LayoutElement     │  - SavedLabel legacy │
//! ├──────────────────────┼──────────────────────┤
//! │  Unit conversion     │  Settings            │
//! │  - mm ↔ px @ dpi     │  - paper/label sizes │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod record;
pub mod schema;
pub mod settings;
pub mod units;

pub use error::{DesignError, DesignResult};
pub use record::{
    DesignId, DesignRecord, ElementId, ElementKind, FontConfig, Frame, ImageFormat, LabelSize,
    LayoutElement, ProductInfo, ShapeKind, TextAlign,
};
pub use schema::{DesignDocument, SavedLabel, SCHEMA_VERSION};
pub use settings::{AppSettings, PaperSize};

/// Core crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
