//! Physical-unit conversion between millimeters and device pixels.
//!
//! Pure and stateless. Conversions are exact to f64 precision; rounding is
//! the caller's decision (the editor rounds to whole pixels for display,
//! export keeps the fractional scale).

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Reference density at which surface pixels are interpreted.
pub const REFERENCE_DPI: f64 = 96.0;

/// Convert millimeters to device pixels at the given resolution.
#[must_use]
pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    mm / MM_PER_INCH * dpi
}

/// Convert device pixels back to millimeters at the given resolution.
#[must_use]
pub fn px_to_mm(px: f64, dpi: f64) -> f64 {
    px / dpi * MM_PER_INCH
}

/// Scale factor from the 96-dpi reference density to the given resolution.
#[must_use]
pub fn scale_factor(dpi: f64) -> f64 {
    dpi / REFERENCE_DPI
}
