//! Deterministic output filenames.
//!
//! `<sanitized base>_<YYYY-MM-DD>_<HH-MM-SS>.<ext>`. The base keeps Unicode
//! letters and digits (CJK product names survive), replaces everything else
//! with underscores, and is cut to twenty characters. Equal inputs at an
//! equal instant produce an equal name.

use chrono::{DateTime, Utc};

/// Longest sanitized base, in characters.
const BASE_MAX_CHARS: usize = 20;

/// Sanitize a design name into a filename base.
#[must_use]
pub fn sanitize_base(name: &str) -> String {
    let base: String = name
        .chars()
        .take(BASE_MAX_CHARS)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    if base.is_empty() {
        "label".to_string()
    } else {
        base
    }
}

/// Build the full output filename for an export at the given instant.
#[must_use]
pub fn generate_filename(base: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{extension}",
        sanitize_base(base),
        at.format("%Y-%m-%d_%H-%M-%S")
    )
}
