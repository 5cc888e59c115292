//! Design records - the canonical shape of one label design.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DesignError, DesignResult};

/// Stable identity of a design record.
///
/// Assigned at first save and never reassigned afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesignId(Uuid);

impl DesignId {
    /// Create a new unique design ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidId`] if the string is not a valid UUID.
    pub fn parse(s: &str) -> DesignResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DesignError::InvalidId(s.to_string()))
    }
}

impl Default for DesignId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DesignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a layout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidId`] if the string is not a valid UUID.
    pub fn parse(s: &str) -> DesignResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DesignError::InvalidId(s.to_string()))
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical label dimensions in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSize {
    /// Width in millimeters.
    pub width_mm: f64,
    /// Height in millimeters.
    pub height_mm: f64,
}

impl LabelSize {
    /// Create a new label size.
    #[must_use]
    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Check the size invariant: both dimensions strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidSize`] if either dimension is zero or
    /// negative.
    pub fn validate(&self) -> DesignResult<()> {
        if self.width_mm > 0.0 && self.height_mm > 0.0 {
            Ok(())
        } else {
            Err(DesignError::InvalidSize {
                width_mm: self.width_mm,
                height_mm: self.height_mm,
            })
        }
    }
}

impl Default for LabelSize {
    /// The stock 40x30 mm price label.
    fn default() -> Self {
        Self::new(40.0, 30.0)
    }
}

/// Element geometry in label coordinate space.
///
/// There is no z field: an element's position inside
/// [`DesignRecord::layout`] is its z-order and reading order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// X position (pixels from left).
    pub x: f64,
    /// Y position (pixels from top).
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 40.0,
            rotation: 0.0,
        }
    }
}

/// Supported image formats for image elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG vector image.
    Svg,
}

/// Basic shape kinds for decorative elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rect,
    /// Ellipse inscribed in the frame.
    Ellipse,
    /// Straight line across the frame diagonal.
    Line,
}

/// The content of a layout element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ElementKind {
    /// A text run (product name, price, free-form annotation).
    Text {
        /// Text content.
        content: String,
    },

    /// An image (logo, product photo).
    Image {
        /// Image source URI or base64 data URI.
        src: String,
        /// Image format.
        format: ImageFormat,
    },

    /// A decorative shape.
    Shape {
        /// Shape kind.
        shape: ShapeKind,
        /// Fill color as hex.
        fill: String,
    },

    /// A barcode rendered from its encoded value.
    Barcode {
        /// Encoded value (EAN/UPC digits or free text).
        value: String,
    },
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

/// Font styling for one layout element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Font family name.
    #[serde(default = "FontConfig::default_family")]
    pub family: String,
    /// Font size in points.
    #[serde(default = "FontConfig::default_size")]
    pub size_pt: f64,
    /// Bold weight.
    #[serde(default)]
    pub bold: bool,
    /// Italic style.
    #[serde(default)]
    pub italic: bool,
    /// Text color as hex.
    #[serde(default = "FontConfig::default_color")]
    pub color: String,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
}

impl FontConfig {
    fn default_family() -> String {
        "sans-serif".to_string()
    }

    const fn default_size() -> f64 {
        12.0
    }

    fn default_color() -> String {
        "#000000".to_string()
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: Self::default_family(),
            size_pt: Self::default_size(),
            bold: false,
            italic: false,
            color: Self::default_color(),
            align: TextAlign::default(),
        }
    }
}

/// One positioned visual unit inside a design's layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Position and size.
    #[serde(default)]
    pub frame: Frame,
    /// Element content.
    pub kind: ElementKind,
}

impl LayoutElement {
    /// Create a new element with the given kind and a default frame.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            frame: Frame::default(),
            kind,
        }
    }

    /// Set the frame.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }
}

/// Product attributes shown on a label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Product name.
    pub name: String,
    /// Selling price.
    #[serde(default)]
    pub price: f64,
    /// Original price before discount, when advertising one.
    #[serde(default)]
    pub original_price: Option<f64>,
    /// Discount tagline ("-20%", "2 for 1").
    #[serde(default)]
    pub discount: Option<String>,
    /// Arbitrary specification key-values (weight, origin, grade).
    #[serde(default)]
    pub specs: HashMap<String, String>,
    /// Free-form custom fields added by the user.
    #[serde(default)]
    pub custom_fields: HashMap<String, String>,
    /// Ordered list of selling-point strings.
    #[serde(default)]
    pub selling_points: Vec<String>,
}

impl ProductInfo {
    /// Create a product with just a name and price.
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }
}

/// The canonical persisted representation of one label design.
///
/// The same logical design may exist locally, remotely, or both; the
/// synchronizer in `pricetag-store` produces one consistent view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRecord {
    /// Stable identity, assigned at first save. `None` before that.
    pub id: Option<DesignId>,
    /// Optional human label; [`DesignRecord::display_name`] falls back to
    /// the product name.
    pub name: Option<String>,
    /// Physical dimensions in millimeters.
    pub size: LabelSize,
    /// Product attributes.
    pub product: ProductInfo,
    /// Ordered layout elements. The order is z-order / reading order and
    /// must survive save/load unchanged.
    pub layout: Vec<LayoutElement>,
    /// Font styling keyed by element id. Entries referencing an element no
    /// longer in `layout` are tolerated and kept as-is.
    pub font_configs: HashMap<ElementId, FontConfig>,
    /// Set once at first save.
    pub created_at: DateTime<Utc>,
    /// Stamped on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl DesignRecord {
    /// Create a new unsaved design for a product.
    #[must_use]
    pub fn new(product: ProductInfo, size: LabelSize) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: None,
            size,
            product,
            layout: Vec::new(),
            font_configs: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a layout element, placing it on top of the existing ones.
    pub fn push_element(&mut self, element: LayoutElement) -> ElementId {
        let id = element.id;
        self.layout.push(element);
        id
    }

    /// The display name: `name` when set, otherwise the product name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.product.name)
    }

    /// The de-duplication key: the id when present, else the product name.
    ///
    /// The product-name fallback is a known weak key: two different designs
    /// for the same product name collide and merge accidentally.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        self.id
            .map_or_else(|| self.product.name.clone(), |id| id.to_string())
    }

    /// Assign an id if the record does not have one yet. Returns the id.
    ///
    /// An existing id is never reassigned.
    pub fn ensure_id(&mut self) -> DesignId {
        *self.id.get_or_insert_with(DesignId::new)
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate record invariants.
    ///
    /// Only the size invariant can fail. A `font_configs` key that does not
    /// reference a layout element is allowed: the editor keeps styling for
    /// removed elements so an undo restores it.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidSize`] for non-positive dimensions.
    pub fn validate(&self) -> DesignResult<()> {
        self.size.validate()
    }

    /// Ids of `font_configs` entries that no longer match a layout element.
    #[must_use]
    pub fn orphaned_font_configs(&self) -> Vec<ElementId> {
        self.font_configs
            .keys()
            .filter(|id| !self.layout.iter().any(|e| e.id == **id))
            .copied()
            .collect()
    }
}
