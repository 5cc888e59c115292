//! # Pricetag Export
//!
//! Print-ready output for label designs.
//!
//! The host application supplies a [`RenderSurface`] for the label it shows;
//! [`LabelExporter`] snapshots it at print density and encodes PNG, JPEG, or
//! a single-page PDF whose physical page size equals the label.
//!
//! ```text
//! RenderSurface ──snapshot(scale)──▶ raster bytes
//!                                        │
//!                          verify + re-encode (image)
//!                                        │
//!                  PNG / JPEG ◀──────────┴──────────▶ PDF (printpdf)
//! ```
//!
//! Output filenames are deterministic: sanitized design name plus the export
//! timestamp.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod filename;
pub mod surface;

pub use error::{ExportError, ExportResult};
pub use export::{BatchItem, ExportArtifact, ExportFormat, ExportOptions, LabelExporter};
pub use filename::{generate_filename, sanitize_base};
pub use surface::{decode_data_uri, RasterFormat, RenderSurface};
