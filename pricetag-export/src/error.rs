//! Export error taxonomy.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while exporting a label.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A batch slot had no render surface attached.
    #[error("no render surface attached")]
    MissingSurface,

    /// The surface failed to produce a snapshot.
    #[error("surface snapshot failed: {0}")]
    Snapshot(String),

    /// Snapshot bytes could not be decoded as an image.
    #[error("snapshot could not be decoded: {0}")]
    Decode(String),

    /// The output image could not be encoded.
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// PDF assembly failed.
    #[error("document generation failed: {0}")]
    Document(String),
}
