use crate::error::{AddressError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static HASH_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([^/]+)/.*$").expect("valid hash suffix regex"));

static CATEGORY_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/?([A-Za-z0-9_-]+)?/([A-Za-z0-9._-]+)\.([A-Za-z0-9]+)$")
        .expect("valid category suffix regex")
});

/// Decoded `/[hash]/{category}.{ext}` suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAddress {
    pub category: String,
    pub hash: Option<String>,
}

/// Extract the hash from a direct-asset suffix (`/{hash}/{filename}`).
///
/// The filename segment only exists so browsers see a plausible name and is
/// discarded. A suffix that does not match is logged and treated as "no hash".
#[must_use]
pub fn parse_hash_from_suffix(suffix: &str) -> Option<String> {
    if suffix.is_empty() {
        return None;
    }
    match HASH_SUFFIX.captures(suffix) {
        Some(caps) => caps.get(1).map(|m| m.as_str().to_string()),
        None => {
            log::warn!("Ignoring unparseable hash suffix: {suffix}");
            None
        }
    }
}

/// Append `/{hash}/{last segment of url}` to `url`.
#[must_use]
pub fn append_hash_suffix(url: &str, hash: &str) -> String {
    let filename = url.rsplit('/').next().unwrap_or(url);
    format!("{url}/{hash}/{filename}")
}

/// Decode a category suffix. Unlike direct assets there is no fallback
/// resource for a malformed category address, so a mismatch is an error.
pub fn parse_category_and_hash_from_suffix(
    suffix: &str,
    extension: &str,
) -> Result<CategoryAddress> {
    let malformed = || AddressError::MalformedCategorySuffix {
        suffix: suffix.to_string(),
        extension: extension.to_string(),
    };
    let caps = CATEGORY_SUFFIX.captures(suffix).ok_or_else(malformed)?;
    if caps.get(3).map(|m| m.as_str()) != Some(extension) {
        return Err(malformed());
    }
    let category = caps
        .get(2)
        .map(|m| m.as_str().to_string())
        .ok_or_else(malformed)?;
    Ok(CategoryAddress {
        category,
        hash: caps.get(1).map(|m| m.as_str().to_string()),
    })
}

/// Build the suffix decoded by [`parse_category_and_hash_from_suffix`].
///
/// Returns `None` when the category sanitizes to nothing.
#[must_use]
pub fn category_suffix(category: &str, extension: &str, hash: Option<&str>) -> Option<String> {
    let category = sanitize_category(category)?;
    Some(match hash.filter(|h| !h.is_empty()) {
        Some(hash) => format!("/{hash}/{category}.{extension}"),
        None => format!("/{category}.{extension}"),
    })
}

/// Strip every character outside `[A-Za-z0-9._-]`; empty results are absent.
#[must_use]
pub fn sanitize_category(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}
