//! Route orchestration: fetch, extract and render each route of a site.
//!
//! Routes are processed strictly one after another. A failing route is
//! recorded in the [`BatchReport`] and never aborts the batch; only caller
//! misconfiguration (empty base URL, empty route list) is returned as an error.

use chrono::{SecondsFormat, Utc};
use pagesift_core::{BatchReport, Error, Log, OutputFormat, RouteFailure, RouteResult, TracingLog};
use std::sync::Arc;

use crate::extract::{Extractor, detect};
use crate::fetch::{Fetcher, normalize_route, route_url};

/// Persistence collaborator that receives every successful [`RouteResult`].
pub trait RouteSink: Send + Sync {
    fn persist(&self, result: &RouteResult, format: OutputFormat) -> Result<(), Error>;
}

/// Drives the fetch → detect → extract → render pipeline over routes.
pub struct RouteProcessor {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    log: Arc<dyn Log>,
    sink: Option<Arc<dyn RouteSink>>,
}

impl RouteProcessor {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>, log: Arc<dyn Log>) -> Self {
        Self { fetcher, extractor, log, sink: None }
    }

    /// Processor logging through `tracing`.
    pub fn with_defaults(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self::new(fetcher, extractor, Arc::new(TracingLog))
    }

    /// Hand every successful result to `sink` before it is recorded.
    pub fn with_sink(mut self, sink: Arc<dyn RouteSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Process a single route and persist it through the sink, if any.
    pub async fn generate_for_route(
        &self, base_url: &str, route: &str, format: OutputFormat,
    ) -> Result<RouteResult, Error> {
        let route = normalize_route(route);
        let url = route_url(base_url, &route);

        self.log.debug(&format!("processing {route} ({url})"));
        let raw = self.fetcher.fetch_text(&url).await?;

        let payload = detect(&raw);
        let metadata = self.extractor.metadata(&payload);
        let content = self.extractor.content(&payload);
        let markdown_content = self.extractor.markdown(&content);

        let result = RouteResult {
            route,
            url,
            metadata,
            text_content: content.text_content,
            markdown_content,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        if let Some(sink) = &self.sink {
            sink.persist(&result, format)?;
        }

        Ok(result)
    }

    /// Process every route in order.
    ///
    /// An unrecognized `format` falls back to [`OutputFormat::All`] with a
    /// warning.
    pub async fn process_routes(&self, base_url: &str, routes: &[String], format: &str) -> Result<BatchReport, Error> {
        if base_url.trim().is_empty() {
            return Err(Error::InvalidInput("base URL cannot be empty".into()));
        }
        if routes.is_empty() {
            return Err(Error::InvalidInput("routes cannot be empty".into()));
        }

        let format = self.resolve_format(format);
        let mut report = BatchReport::new(format);

        self.log.info(&format!("processing {} route(s) from {base_url} as {format}", routes.len()));

        for route in routes {
            match self.generate_for_route(base_url, route, format).await {
                Ok(result) => {
                    self.log.info(&format!("processed {}", result.route));
                    report.results.push(result);
                }
                Err(e) => {
                    let route = normalize_route(route);
                    let url = route_url(base_url, &route);
                    self.log.error(&format!("failed {route}: {e}"));
                    report.failures.push(RouteFailure { route, url, reason: e.to_string() });
                }
            }
        }

        self.log.info(&format!(
            "batch complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        ));

        Ok(report)
    }

    fn resolve_format(&self, format: &str) -> OutputFormat {
        format.parse().unwrap_or_else(|e| {
            self.log.warn(&format!("{e}; using {}", OutputFormat::default()));
            OutputFormat::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::HeuristicExtractor;
    use crate::fetch::{FetchClient, FetchConfig};
    use mockito::Server;
    use pagesift_core::{LogLevel, MemoryLog};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const TEST_PAGE: &str = r#"<html><head>
        <title>Test Page</title>
        <meta name="description" content="A page used in tests">
        </head><body><main><h1>Hello</h1><p>Body text.</p></main></body></html>"#;

    /// Serves canned bodies keyed by URL; anything else is a 404.
    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, Error> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::HttpError(format!("status 404 for {url}")))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<(String, OutputFormat)>>,
        fail_on: Option<String>,
    }

    impl RouteSink for RecordingSink {
        fn persist(&self, result: &RouteResult, format: OutputFormat) -> Result<(), Error> {
            if self.fail_on.as_deref() == Some(result.route.as_str()) {
                return Err(Error::PersistFailed(format!("disk full writing {}", result.route)));
            }
            self.seen.lock().unwrap().push((result.route.clone(), format));
            Ok(())
        }
    }

    fn network_processor(log: Arc<MemoryLog>) -> RouteProcessor {
        let fetcher = FetchClient::with_log(FetchConfig::default(), log.clone()).unwrap();
        RouteProcessor::new(Arc::new(fetcher), Arc::new(HeuristicExtractor::with_log(log.clone())), log)
    }

    fn static_processor(pages: &[(&str, &str)], log: Arc<MemoryLog>) -> RouteProcessor {
        let pages = pages.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect();
        RouteProcessor::new(Arc::new(StaticFetcher { pages }), Arc::new(HeuristicExtractor::new()), log)
    }

    fn routes(list: &[&str]) -> Vec<String> {
        list.iter().map(|r| r.to_string()).collect()
    }

    #[tokio::test]
    async fn test_generate_for_route_html() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(TEST_PAGE)
            .create_async()
            .await;

        let processor = network_processor(Arc::new(MemoryLog::new()));
        let result = processor.generate_for_route(&server.url(), "/test", OutputFormat::Json).await.unwrap();

        assert_eq!(result.metadata.title, "Test Page");
        assert_eq!(result.metadata.description, "A page used in tests");
        assert_eq!(result.url, format!("{}/test", server.url()));
        assert_eq!(result.route, "/test");
        assert!(result.text_content.contains("Body text."));
        assert!(result.markdown_content.starts_with("# Hello"));
    }

    #[tokio::test]
    async fn test_generate_for_route_normalizes_route() {
        let processor = static_processor(
            &[("https://site.test/about", TEST_PAGE)],
            Arc::new(MemoryLog::new()),
        );
        let result = processor.generate_for_route("https://site.test/", "about", OutputFormat::Text).await.unwrap();

        assert_eq!(result.route, "/about");
        assert_eq!(result.url, "https://site.test/about");
    }

    #[tokio::test]
    async fn test_timestamp_is_rfc3339_millis_utc() {
        let processor = static_processor(&[("https://site.test/", TEST_PAGE)], Arc::new(MemoryLog::new()));
        let result = processor.generate_for_route("https://site.test", "/", OutputFormat::All).await.unwrap();

        let parsed = chrono::DateTime::parse_from_rfc3339(&result.timestamp).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert!(result.timestamp.ends_with('Z'));
        assert_eq!(result.timestamp.split('.').nth(1).map(str::len), Some(4));
    }

    #[tokio::test]
    async fn test_process_routes_records_failures_and_continues() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(TEST_PAGE)
            .create_async()
            .await;
        let _missing = server.mock("GET", "/fails-404").with_status(404).create_async().await;

        let log = Arc::new(MemoryLog::new());
        let processor = network_processor(log.clone());
        let report = processor
            .process_routes(&server.url(), &routes(&["/ok", "/fails-404"]), "text")
            .await
            .unwrap();

        assert_eq!(report.format, OutputFormat::Text);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.results[0].route, "/ok");
        assert_eq!(report.failures[0].route, "/fails-404");
        assert_eq!(report.failures[0].url, format!("{}/fails-404", server.url()));
        assert!(report.failures[0].reason.starts_with("HTTP_ERROR"));
        assert_eq!(log.messages(LogLevel::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_process_routes_json_route() {
        let processor = static_processor(
            &[("https://api.test/posts/1", r#"{"id": 1, "title": "First", "body": "Hello"}"#)],
            Arc::new(MemoryLog::new()),
        );
        let report = processor.process_routes("https://api.test", &routes(&["posts/1"]), "json").await.unwrap();

        let result = &report.results[0];
        assert_eq!(result.metadata.title, "First");
        assert_eq!(result.metadata.description, "Hello");
        assert_eq!(result.text_content, "id: 1\ntitle: First\nbody: Hello");
        assert!(result.markdown_content.starts_with("```json\n"));
    }

    #[tokio::test]
    async fn test_process_routes_rejects_empty_inputs() {
        let processor = static_processor(&[], Arc::new(MemoryLog::new()));

        let err = processor.process_routes("  ", &routes(&["/"]), "all").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = processor.process_routes("https://site.test", &[], "all").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_process_routes_invalid_format_warns_and_defaults() {
        let log = Arc::new(MemoryLog::new());
        let processor = static_processor(&[("https://site.test/", TEST_PAGE)], log.clone());

        let report = processor.process_routes("https://site.test", &routes(&["/"]), "pdf").await.unwrap();

        assert_eq!(report.format, OutputFormat::All);
        assert_eq!(report.succeeded(), 1);
        let warnings = log.messages(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("pdf"));
    }

    #[tokio::test]
    async fn test_sink_receives_results_and_failures_are_recorded() {
        let sink = Arc::new(RecordingSink { fail_on: Some("/b".into()), ..Default::default() });
        let processor = static_processor(
            &[("https://site.test/a", TEST_PAGE), ("https://site.test/b", TEST_PAGE)],
            Arc::new(MemoryLog::new()),
        )
        .with_sink(sink.clone());

        let report = processor.process_routes("https://site.test", &routes(&["/a", "/b"]), "markdown").await.unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].reason.starts_with("PERSIST_FAILED"));
        assert_eq!(*sink.seen.lock().unwrap(), vec![("/a".to_string(), OutputFormat::Markdown)]);
    }
}
