//! URL validation and route joining.

/// Error type for URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse an absolute http(s) URL.
///
/// Unlike a browser address bar this never guesses a scheme: relative or
/// scheme-less input is rejected.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Lowercase the host
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
pub fn parse_absolute(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none() {
        return Err(UrlError::InvalidUrl(format!("missing host: {trimmed}")));
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Normalize a route so it always starts with `/`. Blank routes become `/`.
pub fn normalize_route(route: &str) -> String {
    let trimmed = route.trim();
    if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") }
}

/// Build the full URL for a route: the base without trailing slashes followed
/// by the normalized route.
pub fn route_url(base_url: &str, route: &str) -> String {
    format!("{}{}", base_url.trim().trim_end_matches('/'), normalize_route(route))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_basic() {
        let url = parse_absolute("https://example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_absolute_rejects_missing_scheme() {
        let result = parse_absolute("example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_absolute_rejects_relative() {
        assert!(matches!(parse_absolute("/about"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_absolute_lowercase_host() {
        let url = parse_absolute("https://EXAMPLE.COM").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_absolute_remove_fragment() {
        let url = parse_absolute("https://example.com/a#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/a");
    }

    #[test]
    fn test_parse_absolute_preserve_query() {
        let url = parse_absolute("https://example.com?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_parse_absolute_unsupported_scheme() {
        let result = parse_absolute("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_parse_absolute_empty() {
        assert!(matches!(parse_absolute(""), Err(UrlError::Empty)));
        assert!(matches!(parse_absolute("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_parse_absolute_keeps_port() {
        let url = parse_absolute("http://127.0.0.1:8080/test").unwrap();
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.path(), "/test");
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("about"), "/about");
        assert_eq!(normalize_route("/about"), "/about");
        assert_eq!(normalize_route(""), "/");
        assert_eq!(normalize_route("  docs/intro "), "/docs/intro");
    }

    #[test]
    fn test_route_url() {
        assert_eq!(route_url("https://example.com", "/test"), "https://example.com/test");
        assert_eq!(route_url("https://example.com/", "test"), "https://example.com/test");
        assert_eq!(route_url("https://example.com//", "/"), "https://example.com/");
    }
}
