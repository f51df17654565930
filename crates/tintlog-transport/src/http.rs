//! Batched HTTP transport.
//!
//! Each batch is one `POST` whose body is `{"logs": [...]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Serialize;

use crate::batch::{BatchConfig, BatchSink, Batcher};
use crate::error::TransportError;
use crate::record::TransportRecord;
use crate::transport::Transport;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub url: String,
    /// Merged over the defaults; a caller header replaces a default of the
    /// same name.
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub batch: BatchConfig,
}

impl HttpConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            batch: BatchConfig::default(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }
}

fn build_headers(extra: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let _ = headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("tintlog/", env!("CARGO_PKG_VERSION"))),
    );
    for (name, value) in extra {
        let invalid = || TransportError::InvalidHeader { name: name.clone() };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        let _ = headers.insert(name, value);
    }
    Ok(headers)
}

#[derive(Serialize)]
struct Envelope<'a> {
    logs: &'a [TransportRecord],
}

/// Sends batches to an HTTP endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

#[async_trait]
impl BatchSink for HttpSink {
    async fn send(&self, batch: &[TransportRecord]) -> Result<(), TransportError> {
        let body = serde_json::to_vec(&Envelope { logs: batch })?;
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Batched network sink.
pub struct HttpTransport {
    name: String,
    batcher: Batcher<HttpSink>,
}

impl HttpTransport {
    pub fn new(name: impl Into<String>, config: HttpConfig) -> Result<Self, TransportError> {
        let headers = build_headers(&config.headers)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let sink = HttpSink {
            client,
            url: config.url,
            headers,
        };
        Ok(Self {
            name: name.into(),
            batcher: Batcher::new(sink, config.batch),
        })
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.batcher.pending_len()
    }

    pub fn url(&self) -> &str {
        &self.batcher.sink().url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: TransportRecord) -> Result<(), TransportError> {
        self.batcher.enqueue(record)
    }

    async fn flush(&self) -> Result<(), TransportError> {
        self.batcher.flush().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.batcher.close().await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("name", &self.name)
            .field("url", &self.url())
            .field("batcher", &self.batcher)
            .finish()
    }
}
