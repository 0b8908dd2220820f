//! Client code for pagesift.
//!
//! This crate provides the HTTP fetch boundary, content extraction, markdown
//! rendering and the route orchestrator shared by the CLI.

pub mod extract;
pub mod fetch;
pub mod markdown;
pub mod routes;

pub use extract::{
    CleanDocument, ExtractedContent, Extractor, HeuristicExtractor, Payload, PayloadKind, detect, extract_content,
    extract_metadata, sanitize,
};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher, normalize_route, route_url};
pub use markdown::{convert_to_markdown, with_frontmatter};
pub use routes::{RouteProcessor, RouteSink};
