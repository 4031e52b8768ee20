//! URL resolution against an instance base URL.

/// Whether `url` carries a scheme (`https://`, `wss://`, `custom+scheme://`).
pub fn is_absolute_url(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Resolve `url` against `base`.
///
/// Absolute URLs are returned as-is. Relative ones are joined to `base` with
/// exactly one `/` between the two, whatever slashes either side carries.
/// Without a base (or with an empty one) the url is returned unchanged.
pub fn resolve_url(base: Option<&str>, url: &str) -> String {
    let base = match base {
        Some(base) if !base.is_empty() => base,
        _ => return url.to_string(),
    };
    if is_absolute_url(url) {
        return url.to_string();
    }
    if url.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}
