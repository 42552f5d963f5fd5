use serde_json::Value;

/// Longest accepted slug, counted after trimming.
pub const MAX_SLUG_LEN: usize = 120;

/// Normalize untrusted input into a content slug.
///
/// Surrounding whitespace is trimmed and the result lowercased. Anything
/// empty, longer than [`MAX_SLUG_LEN`], or containing characters outside
/// `[a-z0-9-]` is rejected outright.
pub fn normalize_slug(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_SLUG_LEN {
        return None;
    }

    let slug = trimmed.to_ascii_lowercase();
    let is_valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    is_valid.then_some(slug)
}

/// Like [`normalize_slug`], for input whose type is not known up front.
/// Only JSON strings can become slugs.
pub fn normalize_slug_value(raw: &Value) -> Option<String> {
    raw.as_str().and_then(normalize_slug)
}
