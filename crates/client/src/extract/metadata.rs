//! Title/description/author/date/keyword metadata with fallback chains.
//!
//! HTML sources are `<meta>`, `<title>`, `<link>` and a few well-known
//! classes; JSON sources are conventional field names. Every chain takes the
//! first non-empty value.

use pagesift_core::{Error, ExtendedMetadata, Metadata};
use scraper::Html;
use serde_json::{Map, Value};

use super::selector;

/// Headings at or above this many characters are not trusted as titles.
const MAX_H1_TITLE_CHARS: usize = 100;

/// Elements any title or description chain reads from.
const TITLE_AND_DESCRIPTION_SOURCES: &str = "meta[property=\"og:title\"], meta[name=\"og:title\"], title, h1, \
    meta[property=\"description\"], meta[name=\"description\"], \
    meta[property=\"og:description\"], meta[name=\"og:description\"], \
    meta[property=\"twitter:description\"], meta[name=\"twitter:description\"]";

/// Extract metadata from an HTML document.
///
/// Returns [`Metadata::minimal`] when the document has none of the elements
/// a title or description is read from. A source that is present but empty
/// still yields the full shape.
pub fn try_from_html(html: &str) -> Result<Metadata, Error> {
    if html.trim().is_empty() {
        return Ok(Metadata::minimal());
    }

    let doc = Html::parse_document(html);
    if !present(&doc, TITLE_AND_DESCRIPTION_SOURCES)? {
        return Ok(Metadata::minimal());
    }

    let title = first_non_empty(vec![
        meta_content(&doc, "og:title")?,
        element_text(&doc, "title")?,
        element_text(&doc, "h1")?.filter(|t| t.chars().count() < MAX_H1_TITLE_CHARS),
    ]);

    let description = first_non_empty(vec![
        meta_content(&doc, "description")?,
        meta_content(&doc, "og:description")?,
        meta_content(&doc, "twitter:description")?,
    ]);

    let author = first_non_empty(vec![
        meta_content(&doc, "author")?,
        meta_content(&doc, "article:author")?,
        element_text(&doc, ".author")?,
        element_text(&doc, "[rel=\"author\"]")?,
    ]);

    let date = first_non_empty(vec![
        meta_content(&doc, "article:published_time")?,
        attr(&doc, "time[datetime]", "datetime")?,
        element_text(&doc, ".date, .published, .time")?,
    ]);

    let keywords = meta_content(&doc, "keywords")?
        .map(|raw| split_keywords(&raw))
        .unwrap_or_default();

    let canonical_url = attr(&doc, "link[rel=\"canonical\"]", "href")?.unwrap_or_default();
    let site_name = meta_content(&doc, "og:site_name")?.unwrap_or_default();

    Ok(Metadata {
        title,
        description,
        extended: Some(ExtendedMetadata { author, date, keywords, canonical_url, site_name }),
    })
}

/// Extract metadata from a JSON value.
///
/// Objects are read by field name; arrays and primitives only get the
/// generic `"JSON Data"` title. `null` yields [`Metadata::minimal`].
pub fn from_json(value: &Value) -> Metadata {
    let obj = match value {
        Value::Null => return Metadata::minimal(),
        Value::Object(obj) => obj,
        _ => {
            return Metadata {
                title: "JSON Data".to_string(),
                description: String::new(),
                extended: Some(ExtendedMetadata::default()),
            };
        }
    };

    let title = field_text(obj, "title")
        .or_else(|| field_text(obj, "name"))
        .or_else(|| {
            field_text(obj, "id").map(|id| {
                let kind = field_text(obj, "type").unwrap_or_else(|| "Item".to_string());
                format!("{kind} {id}")
            })
        })
        .unwrap_or_else(|| "JSON Data".to_string());

    let description = first_non_empty(vec![
        field_text(obj, "body"),
        field_text(obj, "description"),
        field_text(obj, "summary"),
    ]);

    let author = first_non_empty(vec![
        obj.get("author").and_then(person_name),
        obj.get("user").and_then(person_name),
        field_text(obj, "username"),
    ]);

    let date = first_non_empty(vec![
        field_text(obj, "date"),
        field_text(obj, "created_at"),
        field_text(obj, "createdAt"),
    ]);

    Metadata {
        title,
        description,
        extended: Some(ExtendedMetadata { author, date, ..Default::default() }),
    }
}

/// Split a comma-separated keywords string, trimming and dropping blanks.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_non_empty(candidates: Vec<Option<String>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|c| !c.is_empty())
        .unwrap_or_default()
}

/// `content` of the first `<meta>` whose `property` or `name` is `key`.
fn meta_content(doc: &Html, key: &str) -> Result<Option<String>, Error> {
    let css = format!("meta[property=\"{key}\"], meta[name=\"{key}\"]");
    attr(doc, &css, "content")
}

fn present(doc: &Html, css: &str) -> Result<bool, Error> {
    let sel = selector(css)?;
    Ok(doc.select(&sel).next().is_some())
}

fn attr(doc: &Html, css: &str, name: &str) -> Result<Option<String>, Error> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(name))
        .map(|v| v.trim().to_string()))
}

fn element_text(doc: &Html, css: &str) -> Result<Option<String>, Error> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string()))
}

fn field_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A person given either as a plain string or an object with `name`/`username`.
fn person_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => field_text(obj, "name").or_else(|| field_text(obj, "username")),
        _ => None,
    }
}
