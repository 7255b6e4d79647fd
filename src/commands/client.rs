//! Client for the event/message store.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::Value;

use crate::adapters::ReqwestHttpClient;
use crate::config::StreamConfig;
use crate::data::{Data, META_ERRORS, META_URLS};
use crate::error::{NetworkError, ProviderError, ProviderResult};
use crate::splitter::split;
use crate::stream::{records, ErrorLog};
use crate::stub::{resolve, resolve_all, Record};
use crate::traits::HttpClient;

use super::query::{LookupQuery, StreamQuery};

/// Runs queries against one store.
///
/// # Example
///
/// ```ignore
/// let client = ProviderClient::new("http://localhost:8080")
///     .with_config(StreamConfig::default().with_cache(true));
///
/// let events = client.stream(&StreamQuery::new("search/sse/events").param("bookId", "demo"));
/// let mut pass = events.stream();
/// while let Some(event) = pass.next().await {
///     println!("{}", event?);
/// }
/// ```
#[derive(Clone)]
pub struct ProviderClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    config: StreamConfig,
}

impl ProviderClient {
    /// Client over reqwest with default configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            config: StreamConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// URLs a streaming query is sent to.
    pub fn urls(&self, query: &StreamQuery) -> Vec<String> {
        match query.template(&self.base_url) {
            Some(template) => split(query.identifiers(), &template, self.config.max_url_length),
            None => vec![query.base_url(&self.base_url)],
        }
    }

    /// Records of a streaming query as a lazy collection.
    ///
    /// Nothing is requested until the collection is iterated. Each pass
    /// opens the URLs one after another and stops at the first error. The
    /// URLs are recorded under [`META_URLS`]; in interactive mode the error
    /// log is recorded under [`META_ERRORS`] and cleared at the start of
    /// every pass.
    pub fn stream(&self, query: &StreamQuery) -> Data<Value> {
        let urls = Arc::new(self.urls(query));
        let http = Arc::clone(&self.http);
        let config = Arc::new(self.config.clone());
        let errors = ErrorLog::new();

        let factory_urls = Arc::clone(&urls);
        let factory_errors = errors.clone();
        let data = Data::new(move || {
            tracing::info!("Streaming from {} URL(s)", factory_urls.len());
            factory_errors.clear();
            sequential(
                factory_urls.as_ref().clone(),
                Arc::clone(&http),
                Arc::clone(&config),
                factory_errors.clone(),
            )
        })
        .use_cache(self.config.cache)
        .with_metadata(META_URLS, urls.as_ref().clone());

        if self.config.interactive_mode {
            data.with_metadata(META_ERRORS, errors)
        } else {
            data
        }
    }

    /// GET `url` and decode the body as one JSON value.
    pub async fn fetch_json(&self, url: &str) -> ProviderResult<Value> {
        tracing::debug!("Fetching {}", url);
        let response = self.http.get(url, &self.config.headers).await?;
        if !response.is_success() {
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }
            .into());
        }
        Ok(response.json()?)
    }

    /// Look up one identifier.
    ///
    /// Not-found handling follows `use_stub` in the client configuration.
    pub async fn lookup(&self, query: &LookupQuery, id: &str) -> ProviderResult<Record> {
        query.validate(id)?;
        let fetched = self.fetch_json(&query.url(&self.base_url, id)).await;
        Ok(resolve(query.template(), id, fetched, self.config.use_stub)?.into_record())
    }

    /// Look up many identifiers, one record per identifier in input order.
    ///
    /// Every identifier is validated before the first request.
    pub async fn lookup_many<I, S>(&self, query: &LookupQuery, ids: I) -> ProviderResult<Vec<Record>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        for id in &ids {
            query.validate(id)?;
        }
        resolve_all(query.template(), &ids, self.config.use_stub, |id| async move {
            self.fetch_json(&query.url(&self.base_url, &id)).await
        })
        .await
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct Pass {
    urls: std::vec::IntoIter<String>,
    current: Option<BoxStream<'static, ProviderResult<Value>>>,
    http: Arc<dyn HttpClient>,
    config: Arc<StreamConfig>,
    errors: ErrorLog,
    failed: bool,
}

/// Records of each URL in turn. A URL is opened only after the previous
/// one is exhausted, and nothing further is opened after an error.
fn sequential(
    urls: Vec<String>,
    http: Arc<dyn HttpClient>,
    config: Arc<StreamConfig>,
    errors: ErrorLog,
) -> BoxStream<'static, ProviderResult<Value>> {
    let pass = Pass {
        urls: urls.into_iter(),
        current: None,
        http,
        config,
        errors,
        failed: false,
    };

    stream::unfold(pass, |mut pass| async move {
        loop {
            if pass.failed {
                return None;
            }
            if let Some(current) = pass.current.as_mut() {
                match current.next().await {
                    Some(Ok(value)) => return Some((Ok(value), pass)),
                    Some(Err(err)) => {
                        pass.failed = true;
                        pass.current = None;
                        return Some((Err(err), pass));
                    }
                    None => pass.current = None,
                }
            }
            let url = pass.urls.next()?;
            pass.current = Some(open(&*pass.http, &url, &pass.config, pass.errors.clone()).await);
        }
    })
    .boxed()
}

/// Open one URL and decode its records. A failed request becomes a
/// single-error stream.
async fn open(
    http: &dyn HttpClient,
    url: &str,
    config: &StreamConfig,
    errors: ErrorLog,
) -> BoxStream<'static, ProviderResult<Value>> {
    tracing::debug!("Opening event stream {}", url);
    match http.get_stream(url, &config.headers).await {
        Ok(bytes) => records(bytes, config, errors),
        Err(err) => stream::once(future::ready(Err(ProviderError::from(err)))).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::error::{LookupError, StreamError};
    use crate::traits::Response;
    use bytes::Bytes;
    use serde_json::json;

    const ROOT: &str = "http://store";

    fn client(mock: &MockHttpClient, config: StreamConfig) -> ProviderClient {
        ProviderClient::with_http(ROOT, Arc::new(mock.clone())).with_config(config)
    }

    #[tokio::test]
    async fn test_stream_is_lazy_and_restartable() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::chunked(
            "event: keep_alive\ndata: \n\ndata: {\"a\":1}\n\nevent: close\ndata: \n\n",
            7,
        ));
        let data = client(&mock, StreamConfig::default()).stream(&StreamQuery::new("search/sse/events"));
        assert!(mock.get_requests().is_empty());

        for pass in 1..=3 {
            assert_eq!(data.collect().await.unwrap(), vec![json!({"a": 1})]);
            assert_eq!(mock.get_requests().len(), pass);
        }
        assert_eq!(data.urls(), Some(&["http://store/search/sse/events".to_string()][..]));
        assert!(data.errors().is_none());
    }

    #[tokio::test]
    async fn test_cached_stream_requests_once() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::chunked("data: [1,2]\n\n", 3));
        let config = StreamConfig::default().with_cache(true);
        let data = client(&mock, config).stream(&StreamQuery::new("p"));

        for _ in 0..3 {
            assert_eq!(data.collect().await.unwrap(), vec![json!([1, 2])]);
        }
        assert_eq!(mock.get_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_split_urls_are_streamed_in_order() {
        let mock = MockHttpClient::new();
        mock.set_response("http://store/p?id=a", MockResponse::chunked("data: {\"from\":\"a\"}\n\n", 5));
        mock.set_response("http://store/p?id=b", MockResponse::chunked("data: {\"from\":\"b\"}\n\n", 5));
        let config = StreamConfig::default().with_max_url_length(20);
        let client = client(&mock, config);
        let query = StreamQuery::new("p").ids("id", ["a", "b"]);

        assert_eq!(client.urls(&query), vec!["http://store/p?id=a", "http://store/p?id=b"]);
        let values = client.stream(&query).collect().await.unwrap();
        assert_eq!(values, vec![json!({"from": "a"}), json!({"from": "b"})]);
    }

    #[tokio::test]
    async fn test_failed_url_stops_the_pass() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://store/p?id=a",
            MockResponse::Error(NetworkError::ConnectionFailed {
                url: "http://store/p?id=a".to_string(),
                message: "refused".to_string(),
            }),
        );
        mock.set_response("http://store/p?id=b", MockResponse::chunked("data: 1\n\n", 4));
        let client = client(&mock, StreamConfig::default().with_max_url_length(20));
        let data = client.stream(&StreamQuery::new("p").ids("id", ["a", "b"]));

        let items: Vec<_> = data.stream().collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ProviderError::Network(NetworkError::ConnectionFailed { .. }))));
        assert_eq!(mock.get_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_dropping_pass_releases_stream() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::chunked("data: {\"n\":1}\n\ndata: {\"n\":2}\n\n", 4));
        let data = client(&mock, StreamConfig::default()).stream(&StreamQuery::new("p"));

        let mut pass = data.stream();
        assert!(pass.next().await.is_some());
        assert_eq!(mock.open_streams(), 1);
        drop(pass);
        assert_eq!(mock.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_interactive_errors_in_metadata() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::chunked(
            "event: error\ndata: {\"code\": 7}\n\ndata: {\"ok\": true}\n\n",
            6,
        ));
        let config = StreamConfig::default().with_interactive_mode(true);
        let data = client(&mock, config).stream(&StreamQuery::new("p"));

        assert_eq!(data.collect().await.unwrap(), vec![json!({"ok": true})]);
        assert_eq!(data.collect().await.unwrap(), vec![json!({"ok": true})]);
        let errors = data.errors().unwrap();
        assert_eq!(errors.snapshot(), vec![json!({"code": 7})]);
    }

    #[tokio::test]
    async fn test_error_frame_raises_by_default() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::chunked("event: error\ndata: oops\n\n", 6));
        let data = client(&mock, StreamConfig::default()).stream(&StreamQuery::new("p"));

        let err = data.collect().await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Stream(StreamError::Transport {
                payload: json!("oops")
            })
        );
    }

    #[tokio::test]
    async fn test_lookup_found_and_stubbed() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://store/event/e1",
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"eventId":"e1","eventName":"start"}"#))),
        );
        mock.set_default_response(MockResponse::Success(Response::new(404, Bytes::from("not found"))));

        let strict = client(&mock, StreamConfig::default());
        let found = strict.lookup(&LookupQuery::event(), "e1").await.unwrap();
        assert_eq!(found.id(), Some("e1"));
        assert!(!found.is_stub());

        let err = strict.lookup(&LookupQuery::event(), "e2").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Lookup(LookupError::NotFound { id: "e2".to_string() })
        );

        let lenient = client(&mock, StreamConfig::default().with_use_stub(true));
        let records = lenient
            .lookup_many(&LookupQuery::event(), ["e1", "e2"])
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_stub());
        assert!(records[1].is_stub());
        assert_eq!(records[1].id(), Some("e2"));
    }

    #[tokio::test]
    async fn test_malformed_id_rejected_before_request() {
        let mock = MockHttpClient::new();
        let client = client(&mock, StreamConfig::default());
        let query = LookupQuery::event().with_id_fields(3);

        let err = client.lookup_many(&query, ["a:b:c", "a:b"]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Lookup(LookupError::MalformedId { .. })));
        assert!(mock.get_requests().is_empty());
    }
}
