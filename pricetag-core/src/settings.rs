//! User settings with tolerant defaults.

use serde::{Deserialize, Serialize};

use crate::record::LabelSize;

/// A paper size with its print resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    /// Width in millimeters.
    pub width_mm: f64,
    /// Height in millimeters.
    pub height_mm: f64,
    /// Print resolution in dots per inch.
    pub dpi: f64,
}

impl PaperSize {
    /// ISO A4 at 300 dpi.
    #[must_use]
    pub const fn a4_300dpi() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            dpi: 300.0,
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::a4_300dpi()
    }
}

/// Application settings.
///
/// Every field has a serde default so a settings payload written by an older
/// release (or a hand-edited partial one) loads with the gaps filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Paper used for document export.
    #[serde(default)]
    pub default_paper_size: PaperSize,
    /// Size given to newly created designs.
    #[serde(default)]
    pub default_label_size: LabelSize,
    /// Recently opened template ids, most recent first.
    #[serde(default)]
    pub recent_templates: Vec<String>,
    /// Whether edits are persisted automatically.
    #[serde(default = "AppSettings::default_auto_save")]
    pub auto_save_enabled: bool,
    /// UI language tag.
    #[serde(default = "AppSettings::default_language")]
    pub language: String,
}

impl AppSettings {
    const fn default_auto_save() -> bool {
        true
    }

    fn default_language() -> String {
        "zh-CN".to_string()
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_paper_size: PaperSize::default(),
            default_label_size: LabelSize::default(),
            recent_templates: Vec::new(),
            auto_save_enabled: true,
            language: Self::default_language(),
        }
    }
}
