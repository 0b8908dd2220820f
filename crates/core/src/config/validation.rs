//! Checks applied to a loaded `AppConfig` before a batch runs.

use std::ops::RangeInclusive;

use thiserror::Error;
use url::Url;

use crate::config::AppConfig;
use crate::types::OutputFormat;

const MAX_BYTES: RangeInclusive<usize> = 1..=50 * 1024 * 1024;
const TIMEOUT_MS: RangeInclusive<u64> = 100..=300_000;
const MAX_REDIRECTS: RangeInclusive<usize> = 0..=20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read pagesift settings: {0}")]
    LoadFailed(String),

    #[error("setting `{field}` rejected: {reason}")]
    Invalid { field: String, reason: String },

    #[error("setting `{field}` is required ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl AppConfig {
    /// Reject settings the fetch boundary cannot honor.
    ///
    /// A `base_url` that is set must be an absolute http(s) URL. Byte cap,
    /// timeout and redirect limit must fall inside fixed ranges. An
    /// unsupported `format` only warns; the batch downgrades it to `all`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = self.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            check_base_url(base_url)?;
        }

        within("max_bytes", self.max_bytes, &MAX_BYTES, "bytes")?;
        within("timeout_ms", self.timeout_ms, &TIMEOUT_MS, "ms")?;
        within("max_redirects", self.max_redirects, &MAX_REDIRECTS, "redirects")?;

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "requests need a non-blank User-Agent"));
        }

        if self.format.parse::<OutputFormat>().is_err() {
            tracing::warn!(format = %self.format, "unsupported format in configuration; `all` will be used");
        }

        Ok(())
    }
}

fn check_base_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid("base_url", format!("`{raw}` is not a URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid("base_url", format!("scheme `{}` is not http or https", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::invalid("base_url", format!("`{raw}` has no host")));
    }

    Ok(())
}

fn within<T>(field: &str, value: T, range: &RangeInclusive<T>, unit: &str) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("{value} {unit} is outside {}..={} {unit}", range.start(), range.end()),
        ))
    }
}
