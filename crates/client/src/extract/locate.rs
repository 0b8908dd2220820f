//! Main-content location.
//!
//! HTML: a prioritized selector pass where the candidate wrapping the most
//! text wins, then a paragraph-density pass over `div`s if nothing matched,
//! then cleanup of the chosen subtree. JSON: flatten into `key: value` text.

use std::sync::LazyLock;

use ego_tree::NodeId;
use pagesift_core::Error;
use regex::Regex;
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node};
use serde_json::Value;

use super::detect::PayloadKind;
use super::sanitize::CleanDocument;
use super::selector;

/// Content containers, highest priority first.
pub const PRIORITY_SELECTORS: &[&str] = &[
    "main",
    "article",
    "#content",
    ".content",
    "#main-content",
    ".main-content",
    "#primary",
    ".primary",
    "#article",
    ".article",
    ".post-content",
    ".entry-content",
    "[role=\"main\"]",
    "section",
    ".container",
    "#container",
];

/// `used_selector` reported when the paragraph-density pass picked the node.
pub const HEURISTIC_SELECTOR: &str = "div (paragraph density)";

/// A `div` needs more than this many `<p>` descendants to be a candidate.
const MIN_PARAGRAPHS: usize = 3;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// The located main content of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Inner HTML of the chosen element, or pretty-printed JSON.
    pub html_fragment: String,
    /// Human-readable text. Never contains markup.
    pub text_content: String,
    /// Which selector (or pass) chose the content. Diagnostic only.
    pub used_selector: String,
    pub kind: PayloadKind,
}

impl ExtractedContent {
    pub fn empty(kind: PayloadKind) -> Self {
        Self { html_fragment: String::new(), text_content: String::new(), used_selector: String::new(), kind }
    }

    pub fn is_json(&self) -> bool {
        self.kind == PayloadKind::Json
    }

    pub fn is_empty(&self) -> bool {
        self.html_fragment.is_empty() && self.text_content.is_empty()
    }
}

struct Candidate {
    id: NodeId,
    text_len: usize,
    selector: String,
}

impl Candidate {
    fn offer(best: &mut Option<Candidate>, element: ElementRef<'_>, selector: &str) {
        let text_len = text_len(element);
        if best.as_ref().is_none_or(|b| text_len > b.text_len) {
            *best = Some(Candidate { id: element.id(), text_len, selector: selector.to_string() });
        }
    }
}

/// Locate the main content of a sanitized document.
pub fn try_locate_html(mut doc: CleanDocument) -> Result<ExtractedContent, Error> {
    let (root, used_selector) = choose_root(&doc)?;

    remove_empty_blocks(&mut doc, root)?;
    annotate_images(&mut doc, root)?;

    let element = doc
        .get(root)
        .ok_or_else(|| Error::ExtractFailed("content root vanished during cleanup".into()))?;

    Ok(ExtractedContent {
        html_fragment: CleanDocument::html_of(element),
        text_content: normalize_text(&CleanDocument::text_of(element)),
        used_selector,
        kind: PayloadKind::Html,
    })
}

fn choose_root(doc: &CleanDocument) -> Result<(NodeId, String), Error> {
    let mut best = None;

    // every selector is tried; a lower-priority match still wins with more text
    for css in PRIORITY_SELECTORS {
        if let Some(element) = doc.first(css)? {
            Candidate::offer(&mut best, element, css);
        }
    }

    if best.is_none() {
        let paragraph = selector("p")?;
        for div in doc.select("div")? {
            if div.select(&paragraph).count() > MIN_PARAGRAPHS {
                Candidate::offer(&mut best, div, HEURISTIC_SELECTOR);
            }
        }
    }

    if let Some(candidate) = best {
        return Ok((candidate.id, candidate.selector));
    }

    let body = doc
        .body()
        .ok_or_else(|| Error::ExtractFailed("document has no body".into()))?;
    Ok((body.id(), "body".to_string()))
}

/// Drop descendant `<p>`/`<div>` elements that carry no text.
fn remove_empty_blocks(doc: &mut CleanDocument, root: NodeId) -> Result<(), Error> {
    let blocks = selector("p, div")?;
    let empty: Vec<NodeId> = match doc.get(root) {
        Some(element) => element
            .select(&blocks)
            .filter(|el| CleanDocument::text_of(*el).trim().is_empty())
            .map(|el| el.id())
            .collect(),
        None => return Ok(()),
    };

    for id in empty {
        doc.remove(id);
    }
    Ok(())
}

/// Follow every `<img>` that has alt text with a `<figcaption>` carrying it.
fn annotate_images(doc: &mut CleanDocument, root: NodeId) -> Result<(), Error> {
    let img = selector("img")?;
    let images: Vec<(NodeId, String)> = match doc.get(root) {
        Some(element) => element
            .select(&img)
            .filter_map(|el| {
                let alt = el.value().attr("alt")?.trim();
                (!alt.is_empty()).then(|| (el.id(), alt.to_string()))
            })
            .collect(),
        None => return Ok(()),
    };

    if images.is_empty() {
        return Ok(());
    }

    let template = figcaption_element()?;
    for (id, alt) in images {
        if let Some(caption) = doc.insert_after(id, Node::Element(template.clone())) {
            doc.append(caption, Node::Text(Text { text: alt.as_str().into() }));
        }
    }
    Ok(())
}

fn figcaption_element() -> Result<Element, Error> {
    let fragment = Html::parse_fragment("<figcaption></figcaption>");
    let sel = selector("figcaption")?;
    fragment
        .select(&sel)
        .next()
        .map(|el| el.value().clone())
        .ok_or_else(|| Error::ExtractFailed("could not build figcaption element".into()))
}

fn text_len(element: ElementRef<'_>) -> usize {
    CleanDocument::text_of(element).trim().chars().count()
}

/// Collapse whitespace runs to one space, cap newline runs at two, and trim.
pub fn normalize_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    EXTRA_NEWLINES.replace_all(&collapsed, "\n\n").trim().to_string()
}

/// Flatten a JSON value into readable text.
///
/// Arrays become one block per element separated by a blank line; objects
/// become `key: value` lines; primitives are printed as-is.
pub fn try_locate_json(value: &Value) -> Result<ExtractedContent, Error> {
    let text_content = match value {
        Value::Array(items) => items.iter().map(flatten_block).collect::<Vec<_>>().join("\n\n"),
        other => flatten_block(other),
    };

    Ok(ExtractedContent {
        html_fragment: serde_json::to_string_pretty(value)?,
        text_content,
        used_selector: "json".to_string(),
        kind: PayloadKind::Json,
    })
}

fn flatten_block(value: &Value) -> String {
    let Value::Object(obj) = value else {
        return primitive_text(value);
    };

    obj.iter()
        .filter_map(|(key, value)| match value {
            Value::Object(_) => Some(format!(
                "{key}: {}",
                serde_json::to_string_pretty(value).unwrap_or_default()
            )),
            Value::Array(items) if items.iter().all(is_primitive) => Some(format!(
                "{key}: {}",
                items.iter().map(primitive_text).collect::<Vec<_>>().join(", ")
            )),
            Value::Array(_) => None,
            primitive => Some(format!("{key}: {}", primitive_text(primitive))),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn primitive_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::sanitize::sanitize;
    use serde_json::json;

    fn locate(html: &str) -> ExtractedContent {
        try_locate_html(sanitize(html)).unwrap()
    }

    #[test]
    fn test_prioritized_selector_beats_heuristic() {
        let mut filler = String::new();
        for i in 0..51 {
            filler.push_str(&format!("<div><p>filler {i} a</p><p>filler {i} b</p><p>filler {i} c</p></div>"));
        }
        let html = format!(
            "<body><div>{filler}</div><div id=\"content\"><p>One.</p><p>Two.</p><p>Three.</p><p>Four.</p></div></body>"
        );

        let content = locate(&html);
        assert_eq!(content.used_selector, "#content");
        assert_eq!(content.text_content, "One.Two.Three.Four.");
    }

    #[test]
    fn test_most_text_wins_across_selectors() {
        let html = r#"
            <body>
                <main><p>Short main.</p></main>
                <section><p>This section wraps a great deal more text than the main element does.</p></section>
            </body>
        "#;

        let content = locate(html);
        assert_eq!(content.used_selector, "section");
        assert!(content.text_content.contains("great deal more text"));
    }

    #[test]
    fn test_earlier_selector_keeps_ties() {
        let html = "<body><main><p>same</p></main><article><p>same</p></article></body>";
        assert_eq!(locate(html).used_selector, "main");
    }

    #[test]
    fn test_heuristic_picks_densest_div() {
        let html = r#"
            <body>
                <div><p>a</p><p>b</p><p>c</p></div>
                <div class="story">
                    <p>First paragraph of the story.</p>
                    <p>Second paragraph of the story.</p>
                    <p>Third paragraph of the story.</p>
                    <p>Fourth paragraph of the story.</p>
                </div>
            </body>
        "#;

        let content = locate(html);
        assert_eq!(content.used_selector, HEURISTIC_SELECTOR);
        assert!(content.text_content.starts_with("First paragraph"));
        assert!(!content.text_content.starts_with("a b c"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let content = locate("<body><span>Just a span.</span></body>");
        assert_eq!(content.used_selector, "body");
        assert_eq!(content.text_content, "Just a span.");
    }

    #[test]
    fn test_removes_empty_blocks() {
        let content = locate("<main><p>Kept</p><p>   </p><div><span> </span></div></main>");
        assert_eq!(content.html_fragment, "<p>Kept</p>");
    }

    #[test]
    fn test_image_alt_becomes_figcaption() {
        let content = locate(r#"<main><div>Look: <img src="x.png" alt="caption"></div></main>"#);

        let fragment = Html::parse_fragment(&content.html_fragment);
        let img = fragment.select(&selector("img").unwrap()).next().unwrap();
        let caption = img
            .next_sibling()
            .and_then(ElementRef::wrap)
            .expect("image should be followed by an element");
        assert_eq!(caption.value().name(), "figcaption");
        assert_eq!(caption.text().collect::<String>(), "caption");
        assert!(content.text_content.contains("caption"));
    }

    #[test]
    fn test_image_without_alt_is_kept_untouched() {
        let content = locate(r#"<main><p>Pic <img src="y.png"> <img src="z.png" alt=" "></p></main>"#);
        assert!(content.html_fragment.contains(r#"<img src="y.png">"#));
        assert!(!content.html_fragment.contains("figcaption"));
    }

    #[test]
    fn test_text_has_no_markup_and_normalized_whitespace() {
        let content = locate("<article><h1>Title</h1>\n\n\n\n<p>Some   <b>bold</b>\t text</p>\n\n\n</article>");
        assert!(!content.text_content.contains('<'));
        assert_eq!(content.text_content, "Title Some bold text");
    }

    #[test]
    fn test_block_text_joins_with_single_spaces() {
        let content = locate("<main><p>alpha</p>\n   <p>beta</p>\n\n\n\n<p>gamma</p></main>");
        assert_eq!(content.text_content, "alpha beta gamma");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a \t b  "), "a b");
        assert_eq!(normalize_text("a \n \n \n \n b"), "a b");
        assert_eq!(normalize_text("a\n\nb"), "a b");
        assert_eq!(normalize_text("\n\t\n"), "");
    }

    #[test]
    fn test_locate_json_object() {
        let value = json!({
            "title": "Hello",
            "count": 3,
            "tags": ["a", "b"],
            "nested": {"x": 1},
            "records": [{"skip": true}],
            "missing": null
        });

        let content = try_locate_json(&value).unwrap();
        assert!(content.is_json());
        assert_eq!(content.html_fragment, serde_json::to_string_pretty(&value).unwrap());
        assert_eq!(
            content.text_content,
            "title: Hello\ncount: 3\ntags: a, b\nnested: {\n  \"x\": 1\n}\nmissing: null"
        );
    }

    #[test]
    fn test_locate_json_array() {
        let value = json!([{"id": 1, "name": "one"}, {"id": 2, "name": "two"}]);
        let content = try_locate_json(&value).unwrap();
        assert_eq!(content.text_content, "id: 1\nname: one\n\nid: 2\nname: two");
    }

    #[test]
    fn test_locate_json_primitive() {
        assert_eq!(try_locate_json(&json!("plain")).unwrap().text_content, "plain");
        assert_eq!(try_locate_json(&json!(12.5)).unwrap().text_content, "12.5");
    }
}
