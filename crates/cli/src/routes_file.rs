//! Loader for JSON route lists.
//!
//! A routes file is a JSON array of path strings. An empty array means the
//! site root only.

use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RoutesFileError {
    #[error("failed to read routes file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("routes file {path} is not valid JSON: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("routes file {0} must contain a JSON array")]
    NotArray(PathBuf),

    #[error("routes file {path}: entry {index} is not a string")]
    NotString { path: PathBuf, index: usize },
}

/// Read and validate a routes file.
pub fn load_routes(path: &Path) -> Result<Vec<String>, RoutesFileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RoutesFileError::Read { path: path.into(), source })?;
    parse_routes(&raw, path)
}

fn parse_routes(raw: &str, path: &Path) -> Result<Vec<String>, RoutesFileError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|source| RoutesFileError::Parse { path: path.into(), source })?;

    let Value::Array(items) = value else {
        return Err(RoutesFileError::NotArray(path.into()));
    };

    if items.is_empty() {
        return Ok(vec!["/".to_string()]);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(route) => Ok(route),
            _ => Err(RoutesFileError::NotString { path: path.into(), index }),
        })
        .collect()
}

/// Split a comma separated `--routes` value, dropping blank entries.
pub fn split_routes(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|r| !r.is_empty()).map(String::from).collect()
}
