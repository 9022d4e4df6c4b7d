//! Base URL handling for the HTTP clients.

/// Normalize a configured base URL so relative endpoint paths join under
/// it. Without the trailing slash a base like `https://host/prefix` would
/// lose its last segment.
pub fn with_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}
