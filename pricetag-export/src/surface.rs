//! The rendering seam between the exporter and the host UI.
//!
//! The exporter never rasterizes label content itself; the embedding
//! application supplies a [`RenderSurface`] whose snapshot is whatever the
//! editor currently shows. Surface pixels are interpreted at the 96 dpi
//! reference density, so a snapshot taken at scale `dpi / 96` carries enough
//! resolution for print.

use async_trait::async_trait;

use crate::error::{ExportError, ExportResult};

/// Pixel formats a surface can snapshot to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
}

impl RasterFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// A view that can rasterize its current content.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Surface width in reference (96 dpi) pixels.
    fn width(&self) -> u32;

    /// Surface height in reference (96 dpi) pixels.
    fn height(&self) -> u32;

    /// Capture the surface at the given scale.
    ///
    /// `scale` multiplies the reference dimensions; `quality` is 0.0 to 1.0
    /// and only meaningful for lossy formats.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Snapshot`] if the capture fails.
    async fn snapshot(
        &self,
        scale: f64,
        format: RasterFormat,
        quality: f32,
    ) -> ExportResult<Vec<u8>>;
}

/// Decode a base64 data URI into raw bytes.
///
/// Accepts the `data:<mime>;base64,<payload>` form surfaces and image
/// elements use for embedded content.
///
/// # Errors
///
/// Returns [`ExportError::Decode`] if the URI is malformed or the payload is
/// not valid base64.
pub fn decode_data_uri(uri: &str) -> ExportResult<Vec<u8>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Err(ExportError::Decode("not a data URI".to_string()));
    };

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::Decode("data URI is missing a comma".to_string()))?;

    if !metadata.contains(";base64") {
        return Err(ExportError::Decode("data URI is not base64".to_string()));
    }

    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ExportError::Decode(format!("invalid base64 payload: {e}")))
}
