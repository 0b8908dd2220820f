//! Domain types shared between the extraction pipeline and its collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page metadata.
///
/// `title` and `description` are always present. The remaining fields live in
/// an optional block so degenerate documents can report the minimal shape
/// `{"title":"","description":""}` with no other keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub extended: Option<ExtendedMetadata>,
}

/// Metadata fields beyond title and description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedMetadata {
    pub author: String,
    pub date: String,
    pub keywords: Vec<String>,
    pub canonical_url: String,
    pub site_name: String,
}

impl Metadata {
    /// The minimal result: empty title and description, nothing else.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn is_minimal(&self) -> bool {
        self.extended.is_none() && self.title.is_empty() && self.description.is_empty()
    }

    pub fn author(&self) -> &str {
        self.extended.as_ref().map(|e| e.author.as_str()).unwrap_or("")
    }

    pub fn date(&self) -> &str {
        self.extended.as_ref().map(|e| e.date.as_str()).unwrap_or("")
    }

    pub fn keywords(&self) -> &[String] {
        self.extended.as_ref().map(|e| e.keywords.as_slice()).unwrap_or(&[])
    }

    pub fn canonical_url(&self) -> &str {
        self.extended.as_ref().map(|e| e.canonical_url.as_str()).unwrap_or("")
    }

    pub fn site_name(&self) -> &str {
        self.extended.as_ref().map(|e| e.site_name.as_str()).unwrap_or("")
    }
}

/// Error returned when a format string is not one of the supported values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported format: {0}")]
pub struct UnknownFormat(pub String);

/// Requested output format for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
    #[default]
    All,
}

/// One kind of file the persistence collaborator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Text,
    Json,
    Markdown,
}

impl OutputKind {
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Text => "txt",
            OutputKind::Json => "json",
            OutputKind::Markdown => "md",
        }
    }
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::All => "all",
        }
    }

    /// Whether files of `kind` should be produced for this format.
    pub fn includes(self, kind: OutputKind) -> bool {
        match self {
            OutputFormat::All => true,
            OutputFormat::Text => kind == OutputKind::Text,
            OutputFormat::Json => kind == OutputKind::Json,
            OutputFormat::Markdown => kind == OutputKind::Markdown,
        }
    }

    /// File kinds produced for this format, in a stable order.
    pub fn kinds(self) -> Vec<OutputKind> {
        [OutputKind::Text, OutputKind::Json, OutputKind::Markdown]
            .into_iter()
            .filter(|k| self.includes(*k))
            .collect()
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" => Ok(OutputFormat::Markdown),
            "all" => Ok(OutputFormat::All),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything produced for one successfully processed route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub route: String,
    pub url: String,
    pub metadata: Metadata,
    pub text_content: String,
    pub markdown_content: String,
    /// RFC 3339 UTC timestamp of when the route was processed.
    pub timestamp: String,
}

/// A route that could not be processed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFailure {
    pub route: String,
    pub url: String,
    pub reason: String,
}

/// Outcome of processing a batch of routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub format: OutputFormat,
    pub results: Vec<RouteResult>,
    pub failures: Vec<RouteFailure>,
}

impl BatchReport {
    pub fn new(format: OutputFormat) -> Self {
        Self { format, results: Vec::new(), failures: Vec::new() }
    }

    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded() + self.failed()
    }
}
