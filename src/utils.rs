//! Naming helpers for staged files and published artifacts

use std::path::Path;

/// Fallback used when a URL has no usable final path segment
const FALLBACK_BASENAME: &str = "download";

/// Fallback display name when a staged path has no usable file name
pub const UNKNOWN_DISPLAY_NAME: &str = "unknown";

/// Longest basename kept in a retry staging name
const MAX_BASENAME_LEN: usize = 64;

/// Staging name for the first download pass: `file_{index}`
pub fn first_pass_name(index: usize) -> String {
    format!("file_{index}")
}

/// Staging name for a retry round: `retry_{index}_{basename}_attempt_{attempt}`
///
/// The batch index keeps two URLs with the same basename apart; the attempt
/// number keeps rounds apart.
pub fn retry_name(index: usize, url: &str, attempt: u32) -> String {
    format!("retry_{index}_{}_attempt_{attempt}", url_basename(url))
}

/// Last non-empty path segment of a URL, percent-decoded and made safe for
/// use as a file name component
///
/// # Examples
///
/// ```
/// use file_relay::utils::url_basename;
///
/// assert_eq!(url_basename("https://example.com/docs/report%202024.pdf"), "report_2024.pdf");
/// assert_eq!(url_basename("https://example.com/"), "download");
/// ```
pub fn url_basename(url: &str) -> String {
    let segment = url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            // Not a parseable URL: fall back to the raw text after the last slash
            url.rsplit('/').next().unwrap_or_default().to_string()
        });

    let decoded = urlencoding::decode(&segment)
        .map(|s| s.into_owned())
        .unwrap_or(segment);

    let sanitized = sanitize_component(&decoded);
    if sanitized.is_empty() {
        FALLBACK_BASENAME.to_string()
    } else {
        sanitized
    }
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_` and cap the length
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_BASENAME_LEN)
        .collect();

    // "." and ".." are not valid on their own
    if cleaned.chars().all(|c| c == '.') {
        String::new()
    } else {
        cleaned
    }
}

/// Display name for a staged file: its final path segment
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string())
}
