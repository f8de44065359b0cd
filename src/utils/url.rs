//! Canonical URL keys for the saved-timer store

use url::Url;

/// Normalize a URL string into a stable lookup key.
///
/// The key is tolerant of trivial formatting differences: scheme and host
/// case, a leading `www.`, default ports, path case, trailing slashes, query
/// parameter order and fragments. Input that does not parse as a URL (or has
/// no host) is returned verbatim and used as the key as-is; a best-effort
/// fallback, not an error.
pub fn normalize_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = url.host_str() else {
        return raw.to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);

    let mut normalized = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        // Url::port is None when the port is the scheme default
        normalized.push_str(&format!(":{}", port));
    }
    let path = url.path().to_ascii_lowercase();
    normalized.push_str(path.trim_end_matches('/'));
    if let Some(query) = url.query() {
        let mut pairs: Vec<&str> = query.split('&').collect();
        pairs.sort_unstable();
        normalized.push('?');
        normalized.push_str(&pairs.join("&"));
    }
    normalized
}
