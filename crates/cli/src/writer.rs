//! File persistence for processed routes.

use pagesift_client::{RouteSink, with_frontmatter};
use pagesift_core::{Error, OutputFormat, OutputKind, RouteResult};
use std::path::{Path, PathBuf};

/// Writes each route's outputs into a single directory.
///
/// Files are named after the route: `/` becomes `index`, `/a/b` becomes
/// `a_b`, with one extension per requested [`OutputKind`].
pub struct FileWriter {
    output_dir: PathBuf,
}

impl FileWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    /// Path a route's output of the given kind is written to.
    pub fn path_for(&self, route: &str, kind: OutputKind) -> PathBuf {
        self.output_dir.join(format!("{}.{}", route_stem(route), kind.extension()))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), Error> {
        std::fs::write(path, contents)
            .map_err(|e| Error::PersistFailed(format!("failed to write {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
        Ok(())
    }
}

impl RouteSink for FileWriter {
    fn persist(&self, result: &RouteResult, format: OutputFormat) -> Result<(), Error> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::PersistFailed(format!("failed to create {}: {e}", self.output_dir.display()))
        })?;

        for kind in format.kinds() {
            let contents = match kind {
                OutputKind::Text => text_document(result),
                OutputKind::Json => serde_json::to_string_pretty(result)
                    .map_err(|e| Error::PersistFailed(format!("failed to serialize {}: {e}", result.route)))?,
                OutputKind::Markdown => with_frontmatter(result),
            };
            self.write(&self.path_for(&result.route, kind), &contents)?;
        }

        Ok(())
    }
}

/// File stem for a route.
pub fn route_stem(route: &str) -> String {
    let trimmed = route.trim().trim_matches('/');
    if trimmed.is_empty() {
        return "index".to_string();
    }

    trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') { c } else { '_' })
        .collect()
}

fn text_document(result: &RouteResult) -> String {
    format!("Title: {}\nURL: {}\n\n{}\n", result.metadata.title, result.url, result.text_content)
}
