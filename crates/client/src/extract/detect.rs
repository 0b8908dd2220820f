//! Format detection: is a fetched body JSON or HTML?

use serde_json::Value;

/// Which branch of the pipeline a payload takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Html,
    Json,
}

/// A fetched body, classified once and then pattern-matched downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Html(String),
    Json(Value),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Html(_) => PayloadKind::Html,
            Payload::Json(_) => PayloadKind::Json,
        }
    }

    pub fn is_json(&self) -> bool {
        self.kind() == PayloadKind::Json
    }
}

/// Classify a raw body.
///
/// Bodies that do not start with `{` or `[` are HTML without attempting a
/// parse. Bodies that do are JSON only if they fully parse; anything else
/// (a script snippet, truncated JSON) falls through to HTML.
pub fn detect(raw: &str) -> Payload {
    match parse_json(raw) {
        Some(value) => Payload::Json(value),
        None => Payload::Html(raw.to_string()),
    }
}

/// Whether `raw` would be classified as JSON.
pub fn is_json(raw: &str) -> bool {
    parse_json(raw).is_some()
}

fn parse_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
