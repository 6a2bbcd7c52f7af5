//! Cancellation reason sanitising.

use unicode_normalization::UnicodeNormalization;

/// Maximum stored reason length, in Unicode scalar values.
pub const MAX_REASON_CHARS: usize = 500;

/// Normalise free-text reason input before it is persisted.
///
/// Applies NFKC normalisation, drops control characters (including newlines
/// and tabs), trims surrounding whitespace and truncates to
/// [`MAX_REASON_CHARS`]. Returns `None` when nothing meaningful remains.
///
/// # Examples
/// ```
/// use cancel_flow::domain::sanitize_reason;
///
/// assert_eq!(sanitize_reason("  ｆｏｕｎｄ a job\n"), Some("found a job".to_owned()));
/// assert_eq!(sanitize_reason("\u{0007}  "), None);
/// ```
#[must_use]
pub fn sanitize_reason(raw: &str) -> Option<String> {
    let cleaned: String = raw.nfkc().filter(|c| !c.is_control()).collect();
    let truncated: String = cleaned.trim().chars().take(MAX_REASON_CHARS).collect();
    let trimmed = truncated.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
