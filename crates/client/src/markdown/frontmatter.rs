//! Markdown documents with YAML frontmatter.
//!
//! Used by persistence collaborators to write self-describing `.md` files.

use pagesift_core::RouteResult;

/// Prefix a route's markdown with a YAML frontmatter header.
///
/// Frontmatter format:
/// ```yaml
/// ---
/// title: <page title>
/// description: <page description>
/// source: <url>
/// route: <route>
/// fetched_at: <ISO8601 timestamp>
/// ---
/// <markdown body>
/// ```
pub fn with_frontmatter(result: &RouteResult) -> String {
    let title = if result.metadata.title.is_empty() { "Untitled" } else { &result.metadata.title };

    format!(
        "---\ntitle: {title}\ndescription: {description}\nsource: {source}\nroute: {route}\nfetched_at: {timestamp}\n---\n{markdown}",
        title = escape_yaml(title),
        description = escape_yaml(&result.metadata.description),
        source = result.url,
        route = result.route,
        timestamp = result.timestamp,
        markdown = result.markdown_content.trim()
    )
}

/// Escape special YAML characters in a string.
fn escape_yaml(s: &str) -> String {
    let needs_quotes = s.contains(['\n', '\r', '\\'])
        || s.contains(':') && s.len() > 1
        || s.starts_with(['#', '-', '"', '\'', '[', '{']);

    if needs_quotes {
        let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped.replace("\r\n", " ").replace(['\n', '\r'], " "))
    } else if s.is_empty() {
        "\"\"".to_string()
    } else {
        s.to_string()
    }
}
