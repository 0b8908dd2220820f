//! Markdown rendering of located content.
//!
//! HTML fragments are converted with `htmd`, with per-tag handlers where
//! the output rules differ from its defaults. JSON content becomes a fenced
//! `json` block.
//!
//! ### Rules
//! - ATX headings, `-` bullets, `*` emphasis, `**` strong
//! - Ordered lists are numbered from the list's `start` attribute plus the
//!   item position; source numerals are ignored
//! - List item continuation lines are indented by four spaces
//! - Only absolute `http(s)` links keep link syntax; relative links render
//!   as their text
//! - Images without `src` are dropped
//! - `<pre>` becomes a fenced block labelled from a `language-*` class

pub mod frontmatter;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use ego_tree::iter::Edge;
use htmd::{Element, HtmlToMarkdown};
use pagesift_core::Error;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;

use crate::extract::{ExtractedContent, PayloadKind};

pub use frontmatter::with_frontmatter;

/// Markers left in handler output and resolved by the enclosing list or
/// table handler. Private-use code points never occur in converted text.
const LIST_ITEM: char = '\u{E000}';
const TABLE_ROW: char = '\u{E001}';
const TABLE_CELL: char = '\u{E002}';

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "figure", "figcaption", "address", "details", "summary", "dl",
    "dt", "dd", "center",
];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static INNER_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^\s|]) {2,}").expect("valid regex"));

/// Render located content as markdown. Empty content renders as `""`.
pub fn convert_to_markdown(content: &ExtractedContent) -> String {
    to_markdown(&content.html_fragment, content.kind)
}

/// Render a fragment of the given kind as markdown.
pub fn to_markdown(fragment: &str, kind: PayloadKind) -> String {
    if fragment.trim().is_empty() {
        return String::new();
    }

    match kind {
        PayloadKind::Json => json_block(fragment),
        PayloadKind::Html => html_to_markdown(fragment),
    }
}

/// Pretty-print JSON into a fenced `json` block.
///
/// Text that does not parse is fenced without a language label.
pub fn json_block(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw).and_then(|v| serde_json::to_string_pretty(&v)) {
        Ok(pretty) => format!("```json\n{pretty}\n```"),
        Err(_) => format!("```\n{}\n```", raw.trim()),
    }
}

/// Convert an HTML fragment to markdown, or `""` if conversion fails.
pub fn html_to_markdown(html: &str) -> String {
    try_html_to_markdown(html).unwrap_or_else(|e| {
        tracing::debug!("markdown conversion failed, using empty output: {e}");
        String::new()
    })
}

/// Convert an HTML fragment to markdown.
pub fn try_html_to_markdown(html: &str) -> Result<String, Error> {
    let html: String = html.chars().filter(|c| !matches!(*c, LIST_ITEM | TABLE_ROW | TABLE_CELL)).collect();
    let converter = converter(code_blocks(&html));
    let raw = converter
        .convert(&html)
        .map_err(|e| Error::ExtractFailed(format!("markdown conversion failed: {e}")))?;
    Ok(finish(&raw))
}

fn converter(code_blocks: Vec<String>) -> HtmlToMarkdown {
    let next_block = AtomicUsize::new(0);

    HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "head", "title", "meta", "link", "template"])
        .add_handler(BLOCK_TAGS.to_vec(), block)
        .add_handler(vec!["h1", "h2", "h3", "h4", "h5", "h6"], heading)
        .add_handler(vec!["br"], |_: Element| Some("\n".to_string()))
        .add_handler(vec!["hr"], |_: Element| Some("\n\n---\n\n".to_string()))
        .add_handler(vec!["strong", "b"], |element: Element| Some(wrapped(element.content, "**")))
        .add_handler(vec!["em", "i"], |element: Element| Some(wrapped(element.content, "*")))
        .add_handler(vec!["code"], inline_code)
        .add_handler(vec!["pre"], move |_: Element| {
            // handlers run in document post-order, matching `code_blocks`
            let index = next_block.fetch_add(1, Ordering::Relaxed);
            Some(code_blocks.get(index).map(|b| format!("\n\n{b}\n\n")).unwrap_or_default())
        })
        .add_handler(vec!["a"], link)
        .add_handler(vec!["img"], image)
        .add_handler(vec!["li"], |element: Element| Some(format!("{LIST_ITEM}{}", element.content)))
        .add_handler(vec!["ul"], |element: Element| Some(unordered_list(element.content)))
        .add_handler(vec!["ol"], ordered_list)
        .add_handler(vec!["blockquote"], |element: Element| Some(blockquote(element.content)))
        .add_handler(vec!["th", "td"], |element: Element| {
            Some(format!("{TABLE_CELL}{}", single_line(element.content).replace('|', "\\|")))
        })
        .add_handler(vec!["tr"], |element: Element| Some(format!("{TABLE_ROW}{}", element.content)))
        .add_handler(vec!["thead", "tbody", "tfoot"], |element: Element| Some(element.content.to_string()))
        .add_handler(vec!["table"], |element: Element| Some(table(element.content)))
        .build()
}

fn attr(element: &Element<'_>, name: &str) -> Option<String> {
    element
        .attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| a.value.to_string())
}

fn block(element: Element<'_>) -> Option<String> {
    let content = element.content.trim();
    if content.is_empty() {
        return Some(String::new());
    }
    Some(format!("\n\n{content}\n\n"))
}

fn heading(element: Element<'_>) -> Option<String> {
    let level = element.tag.get(1..).and_then(|n| n.parse::<usize>().ok()).unwrap_or(1);
    let text = single_line(element.content);
    if text.is_empty() {
        return Some(String::new());
    }
    Some(format!("\n\n{} {text}\n\n", "#".repeat(level)))
}

/// Wrap inline content in `delimiter`; surrounding whitespace moves outside.
fn wrapped(content: &str, delimiter: &str) -> String {
    let inner = single_line(content);
    if inner.is_empty() {
        return if content.is_empty() { String::new() } else { " ".to_string() };
    }
    let before = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let after = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{before}{delimiter}{inner}{delimiter}{after}")
}

fn inline_code(element: Element<'_>) -> Option<String> {
    let code = element.content;
    if code.is_empty() {
        return Some(String::new());
    }
    if code.contains('`') { Some(format!("`` {code} ``")) } else { Some(format!("`{code}`")) }
}

fn link(element: Element<'_>) -> Option<String> {
    let href = attr(&element, "href").unwrap_or_default();
    let href = href.trim();
    if is_absolute_http(href) {
        let text = single_line(element.content);
        let before = if element.content.starts_with(char::is_whitespace) { " " } else { "" };
        let after = if element.content.ends_with(char::is_whitespace) { " " } else { "" };
        Some(format!("{before}[{text}]({href}){after}"))
    } else {
        Some(element.content.to_string())
    }
}

fn image(element: Element<'_>) -> Option<String> {
    let Some(src) = attr(&element, "src").map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Some(String::new());
    };
    let alt = attr(&element, "alt").unwrap_or_default();
    let alt = alt.trim();
    match attr(&element, "title") {
        Some(title) => Some(format!("![{alt}]({src} \"{}\")", title.replace('"', "\\\""))),
        None => Some(format!("![{alt}]({src})")),
    }
}

fn unordered_list(content: &str) -> String {
    let items: String = list_items(content).map(|item| list_item("- ", item)).collect();
    format!("\n\n{}\n\n", items.trim_end())
}

fn ordered_list(element: Element<'_>) -> Option<String> {
    let start = attr(&element, "start")
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(1);

    let items: String = list_items(element.content)
        .enumerate()
        .map(|(index, item)| {
            let number = start.saturating_add(i64::try_from(index).unwrap_or(i64::MAX));
            list_item(&format!("{number}. "), item)
        })
        .collect();
    Some(format!("\n\n{}\n\n", items.trim_end()))
}

/// Item bodies of a list, dropping anything before the first item.
fn list_items(content: &str) -> impl Iterator<Item = &str> {
    content.split(LIST_ITEM).skip(1)
}

/// Format one list item: leading blank lines dropped, trailing blank lines
/// collapsed, continuation lines indented by four spaces.
fn list_item(prefix: &str, content: &str) -> String {
    let body = EXTRA_NEWLINES.replace_all(content.trim(), "\n\n");
    format!("{prefix}{}\n", body.replace('\n', "\n    "))
}

fn blockquote(content: &str) -> String {
    let body = EXTRA_NEWLINES.replace_all(content.trim(), "\n\n");
    let quoted = body
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() { ">".to_string() } else { format!("> {line}") }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{quoted}\n\n")
}

fn table(content: &str) -> String {
    let rows: Vec<Vec<String>> = content
        .split(TABLE_ROW)
        .skip(1)
        .map(|row| row.split(TABLE_CELL).skip(1).map(|cell| cell.trim().to_string()).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    let Some(width) = rows.iter().map(Vec::len).max() else {
        return String::new();
    };

    let line = |cells: &[String]| {
        let mut padded = cells.to_vec();
        padded.resize(width, String::new());
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = vec![line(&rows[0]), format!("|{}", " --- |".repeat(width))];
    lines.extend(rows[1..].iter().map(|r| line(r)));
    format!("\n\n{}\n\n", lines.join("\n"))
}

/// Fenced blocks for every `<pre>` in the fragment, in document post-order.
///
/// Rendered from the source tree since the converter has already escaped
/// and reformatted the text it hands to handlers.
fn code_blocks(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .traverse()
        .filter_map(|edge| match edge {
            Edge::Close(node) => ElementRef::wrap(node).filter(|el| el.value().name() == "pre"),
            Edge::Open(_) => None,
        })
        .map(code_block)
        .collect()
}

fn code_block(pre: ElementRef<'_>) -> String {
    let language = code_language(pre)
        .or_else(|| {
            pre.children()
                .filter_map(ElementRef::wrap)
                .find(|c| c.value().name() == "code")
                .and_then(code_language)
        })
        .unwrap_or_default();

    let code: String = pre.text().collect();
    let code = code.strip_prefix('\n').unwrap_or(&code).trim_end_matches('\n');

    format!("```{language}\n{code}\n```")
}

fn code_language(el: ElementRef<'_>) -> Option<String> {
    el.value()
        .classes()
        .find_map(|class| class.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

fn is_absolute_http(href: &str) -> bool {
    url::Url::parse(href)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn single_line(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Trim line ends, collapse doubled inline spaces outside code fences, cap
/// blank lines at one, and trim.
fn finish(raw: &str) -> String {
    let mut in_fence = false;
    let lines = raw
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence { line.to_string() } else { INNER_SPACES.replace_all(line, "$1 ").into_owned() }
        })
        .collect::<Vec<_>>()
        .join("\n");
    EXTRA_NEWLINES.replace_all(&lines, "\n\n").trim().to_string()
}
