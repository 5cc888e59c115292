//! Label export to image and document formats.
//!
//! Takes a snapshot of a [`RenderSurface`] scaled for the requested print
//! density, verifies and re-encodes it, and names the output
//! deterministically. PDF output is a single page whose physical size equals
//! the label, with the raster embedded edge to edge.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use image::ImageEncoder;
use tracing::debug;

use pricetag_core::units::{px_to_mm, scale_factor, REFERENCE_DPI};

use crate::error::{ExportError, ExportResult};
use crate::filename::generate_filename;
use crate::surface::{RasterFormat, RenderSurface};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// Single-page PDF with the label embedded at physical size.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

/// Configuration for label export.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Output format.
    pub format: ExportFormat,
    /// Print density in dots per inch (default: 300.0).
    pub dpi: f64,
    /// Lossy-encoder quality, 0.0 to 1.0 (default: 1.0). Ignored for PNG.
    pub quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            dpi: 300.0,
            quality: 1.0,
        }
    }
}

/// One finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Deterministic output filename, extension included.
    pub filename: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

/// A batch slot: the surface rendering one label, if it produced one.
pub struct BatchItem<'a> {
    /// Render surface, absent when the label failed to render upstream.
    pub surface: Option<&'a dyn RenderSurface>,
    /// Filename base for this label, usually its display name.
    pub filename_base: &'a str,
}

/// Exports label surfaces to PNG, JPEG, or PDF.
pub struct LabelExporter {
    options: ExportOptions,
}

impl LabelExporter {
    /// Create an exporter with the given options.
    #[must_use]
    pub const fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Create an exporter with default options (PNG at 300 dpi).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportOptions::default())
    }

    /// Export one surface, timestamping the filename with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot, re-encode, or document assembly
    /// fails.
    pub async fn export(
        &self,
        surface: &dyn RenderSurface,
        filename_base: &str,
    ) -> ExportResult<ExportArtifact> {
        self.export_at(surface, filename_base, Utc::now()).await
    }

    /// Export one surface with an explicit filename timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`LabelExporter::export`].
    pub async fn export_at(
        &self,
        surface: &dyn RenderSurface,
        filename_base: &str,
        at: DateTime<Utc>,
    ) -> ExportResult<ExportArtifact> {
        let bytes = match self.options.format {
            ExportFormat::Png => self.raster(surface, RasterFormat::Png).await?,
            ExportFormat::Jpeg => self.raster(surface, RasterFormat::Jpeg).await?,
            ExportFormat::Pdf => self.pdf(surface, filename_base).await?,
        };

        let filename = generate_filename(filename_base, self.options.format.extension(), at);
        debug!("exported {filename} ({} bytes)", bytes.len());

        Ok(ExportArtifact { filename, bytes })
    }

    /// Export a batch of labels, one result per slot.
    ///
    /// Failures are isolated per slot: an empty slot yields
    /// [`ExportError::MissingSurface`] and a failing one its own error, while
    /// the rest of the batch still completes. All filenames share one
    /// timestamp.
    pub async fn export_batch(
        &self,
        items: &[BatchItem<'_>],
    ) -> Vec<ExportResult<ExportArtifact>> {
        let at = Utc::now();
        let jobs = items.iter().map(|item| async move {
            match item.surface {
                Some(surface) => self.export_at(surface, item.filename_base, at).await,
                None => Err(ExportError::MissingSurface),
            }
        });
        join_all(jobs).await
    }

    /// Snapshot the surface at print density, verify, and re-encode.
    async fn raster(
        &self,
        surface: &dyn RenderSurface,
        format: RasterFormat,
    ) -> ExportResult<Vec<u8>> {
        let scale = scale_factor(self.options.dpi);
        let quality = self.options.quality.clamp(0.0, 1.0);

        let snapshot = surface.snapshot(scale, format, quality).await?;
        let decoded = image::load_from_memory(&snapshot)
            .map_err(|e| ExportError::Decode(e.to_string()))?;

        match format {
            RasterFormat::Png => {
                let mut buf = std::io::Cursor::new(Vec::new());
                decoded
                    .write_to(&mut buf, image::ImageFormat::Png)
                    .map_err(|e| ExportError::Encode(format!("PNG encoding failed: {e}")))?;
                Ok(buf.into_inner())
            }
            RasterFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = decoded.to_rgb8();
                let (width, height) = rgb.dimensions();

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let jpeg_quality = ((quality * 100.0).round() as u8).max(1);

                let mut buf = std::io::Cursor::new(Vec::new());
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
                encoder
                    .write_image(rgb.as_raw(), width, height, image::ColorType::Rgb8.into())
                    .map_err(|e| ExportError::Encode(format!("JPEG encoding failed: {e}")))?;
                Ok(buf.into_inner())
            }
        }
    }

    /// Render to PNG and embed it in a single PDF page at physical size.
    #[allow(clippy::cast_possible_truncation)]
    async fn pdf(&self, surface: &dyn RenderSurface, title: &str) -> ExportResult<Vec<u8>> {
        let png = self.raster(surface, RasterFormat::Png).await?;

        // Surface pixels are reference-density pixels, so the page's
        // physical size is the surface interpreted at 96 dpi.
        let page_width_mm = px_to_mm(f64::from(surface.width()), REFERENCE_DPI);
        let page_height_mm = px_to_mm(f64::from(surface.height()), REFERENCE_DPI);

        let (doc, page, layer) = printpdf::PdfDocument::new(
            title,
            printpdf::Mm(page_width_mm as f32),
            printpdf::Mm(page_height_mm as f32),
            "Label",
        );
        let current_layer = doc.get_page(page).get_layer(layer);

        let dynamic_image = printpdf::image_crate::load_from_memory(&png)
            .map_err(|e| ExportError::Document(format!("failed to decode raster: {e}")))?;
        let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

        // The snapshot holds dpi/96 times the reference pixels, so placing
        // it at the requested density makes it fill the page exactly.
        let transform = printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm(0.0)),
            translate_y: Some(printpdf::Mm(0.0)),
            dpi: Some(self.options.dpi as f32),
            ..Default::default()
        };
        pdf_image.add_to_layer(current_layer, transform);

        doc.save_to_bytes()
            .map_err(|e| ExportError::Document(format!("PDF save failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Fills the scaled surface area with a solid color and always captures
    /// PNG; the exporter re-encodes to the requested format.
    struct TestSurface {
        width: u32,
        height: u32,
    }

    #[async_trait]
    impl RenderSurface for TestSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        async fn snapshot(
            &self,
            scale: f64,
            _format: RasterFormat,
            _quality: f32,
        ) -> ExportResult<Vec<u8>> {
            let w = ((f64::from(self.width) * scale).round() as u32).max(1);
            let h = ((f64::from(self.height) * scale).round() as u32).max(1);
            let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 30, 30, 255]));

            let mut buf = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut buf, image::ImageFormat::Png)
                .map_err(|e| ExportError::Snapshot(e.to_string()))?;
            Ok(buf.into_inner())
        }
    }

    /// Produces bytes no decoder accepts.
    struct GarbageSurface;

    #[async_trait]
    impl RenderSurface for GarbageSurface {
        fn width(&self) -> u32 {
            10
        }

        fn height(&self) -> u32 {
            10
        }

        async fn snapshot(
            &self,
            _scale: f64,
            _format: RasterFormat,
            _quality: f32,
        ) -> ExportResult<Vec<u8>> {
            Ok(vec![0, 1, 2, 3])
        }
    }

    fn surface() -> TestSurface {
        TestSurface {
            width: 151,
            height: 113,
        }
    }

    #[tokio::test]
    async fn test_png_export_produces_valid_bytes() {
        let exporter = LabelExporter::with_defaults();
        let artifact = exporter.export(&surface(), "Green Tea").await.expect("png");

        assert_eq!(&artifact.bytes[0..4], &[137, 80, 78, 71]);
        assert!(artifact.filename.starts_with("Green_Tea_"));
        assert!(artifact.filename.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_jpeg_export_produces_valid_bytes() {
        let exporter = LabelExporter::new(ExportOptions {
            format: ExportFormat::Jpeg,
            quality: 0.85,
            ..Default::default()
        });
        let artifact = exporter.export(&surface(), "Green Tea").await.expect("jpeg");

        assert_eq!(artifact.bytes[0], 0xFF);
        assert_eq!(artifact.bytes[1], 0xD8);
        assert!(artifact.filename.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_pdf_export_produces_valid_bytes() {
        let exporter = LabelExporter::new(ExportOptions {
            format: ExportFormat::Pdf,
            ..Default::default()
        });
        let artifact = exporter.export(&surface(), "Green Tea").await.expect("pdf");

        assert_eq!(&artifact.bytes[0..5], b"%PDF-");
        assert!(artifact.filename.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_filename_uses_explicit_timestamp() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 8, 28, 10, 30, 5).unwrap();
        let exporter = LabelExporter::with_defaults();
        let artifact = exporter
            .export_at(&surface(), "测试 Label!", at)
            .await
            .expect("export");

        assert_eq!(artifact.filename, "测试_Label__2026-08-28_10-30-05.png");
    }

    #[tokio::test]
    async fn test_undecodable_snapshot_is_a_decode_error() {
        let exporter = LabelExporter::with_defaults();
        let err = exporter
            .export(&GarbageSurface, "Broken")
            .await
            .expect_err("must fail");
        assert!(matches!(err, ExportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_batch_isolates_missing_surfaces() {
        let a = surface();
        let b = surface();
        let exporter = LabelExporter::with_defaults();

        let results = exporter
            .export_batch(&[
                BatchItem {
                    surface: Some(&a),
                    filename_base: "First",
                },
                BatchItem {
                    surface: None,
                    filename_base: "Empty",
                },
                BatchItem {
                    surface: Some(&b),
                    filename_base: "Second",
                },
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ExportError::MissingSurface)));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_quality_is_clamped() {
        let exporter = LabelExporter::new(ExportOptions {
            format: ExportFormat::Jpeg,
            quality: 7.5,
            ..Default::default()
        });
        let artifact = exporter.export(&surface(), "Clamped").await.expect("jpeg");
        assert_eq!(artifact.bytes[0], 0xFF);
    }
}
