//! Content extraction: format detection, sanitizing, metadata and main
//! content location.
//!
//! ### Pipeline
//! - [`detect`] classifies a raw body once into a [`Payload`].
//! - HTML is cleaned by [`sanitize`], then [`locate`] picks the main content
//!   subtree; JSON is flattened into `key: value` text.
//! - [`metadata`] reads title/description/etc. from the raw payload.
//!
//! ### Failure Policy
//! - Internals return `Result<_, Error>`.
//! - The public entry points never fail: errors are logged at debug level and
//!   replaced by the documented empty value.

pub mod detect;
pub mod locate;
pub mod metadata;
pub mod sanitize;

pub use detect::{Payload, PayloadKind, detect, is_json};
pub use locate::{ExtractedContent, HEURISTIC_SELECTOR, PRIORITY_SELECTORS, normalize_text};
pub use sanitize::{CleanDocument, sanitize};

use pagesift_core::{Error, Log, Metadata, TracingLog};
use scraper::Selector;
use std::sync::Arc;

use crate::markdown;

/// Compile a CSS selector, mapping parse failures to `EXTRACT_FAILED`.
pub(crate) fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::ExtractFailed(format!("invalid selector {css:?}: {e}")))
}

/// Stable extractor trait for the three derived representations.
///
/// This allows swapping the extraction heuristics without touching the
/// orchestrator.
pub trait Extractor: Send + Sync {
    /// Metadata for a payload. Never fails.
    fn metadata(&self, payload: &Payload) -> Metadata;

    /// Main content for a payload. Never fails.
    fn content(&self, payload: &Payload) -> ExtractedContent;

    /// Markdown for located content. Never fails.
    fn markdown(&self, content: &ExtractedContent) -> String;
}

/// Selector-and-density based extractor.
pub struct HeuristicExtractor {
    log: Arc<dyn Log>,
}

impl HeuristicExtractor {
    /// Create a new extractor that logs through `tracing`.
    pub fn new() -> Self {
        Self::with_log(Arc::new(TracingLog))
    }

    pub fn with_log(log: Arc<dyn Log>) -> Self {
        Self { log }
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for HeuristicExtractor {
    fn metadata(&self, payload: &Payload) -> Metadata {
        try_extract_metadata(payload).unwrap_or_else(|e| {
            self.log.debug(&format!("metadata extraction degraded to empty result: {e}"));
            Metadata::minimal()
        })
    }

    fn content(&self, payload: &Payload) -> ExtractedContent {
        try_extract_content(payload).unwrap_or_else(|e| {
            self.log.debug(&format!("content extraction degraded to empty result: {e}"));
            ExtractedContent::empty(payload.kind())
        })
    }

    fn markdown(&self, content: &ExtractedContent) -> String {
        markdown::convert_to_markdown(content)
    }
}

/// Metadata for a payload; see [`metadata`] for the fallback chains.
pub fn try_extract_metadata(payload: &Payload) -> Result<Metadata, Error> {
    match payload {
        Payload::Html(html) => metadata::try_from_html(html),
        Payload::Json(value) => Ok(metadata::from_json(value)),
    }
}

/// Main content for a payload.
pub fn try_extract_content(payload: &Payload) -> Result<ExtractedContent, Error> {
    match payload {
        Payload::Html(html) if html.trim().is_empty() => Ok(ExtractedContent::empty(PayloadKind::Html)),
        Payload::Html(html) => locate::try_locate_html(sanitize::try_sanitize(html)?),
        Payload::Json(value) => locate::try_locate_json(value),
    }
}

/// Metadata for a payload, or [`Metadata::minimal`] on failure.
pub fn extract_metadata(payload: &Payload) -> Metadata {
    HeuristicExtractor::new().metadata(payload)
}

/// Main content for a payload, or an empty result on failure.
pub fn extract_content(payload: &Payload) -> ExtractedContent {
    HeuristicExtractor::new().content(payload)
}
