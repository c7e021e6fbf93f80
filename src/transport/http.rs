use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::RwLock;
use url::Url;

use super::config::{ConfigError, HttpTransportConfig};
use super::{BrokerTransport, Method, TransportRequest, TransportResponse, TransportStats};
use crate::error::BoxError;

/// JSON-over-HTTP transport backed by a pooled `reqwest` client.
#[derive(Debug)]
pub struct HttpTransport {
    base_url: Url,
    token: String,
    // `None` once closed
    client: RwLock<Option<reqwest::Client>>,
    in_flight: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl HttpTransport {
    /// Create a transport from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the broker URL is invalid or the client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, ConfigError> {
        let base_url = config.validate()?;
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.connections)
            .pool_idle_timeout(config.keep_alive_max_timeout)
            .timeout(config.body_timeout)
            .build()?;

        Ok(Self {
            base_url,
            token: config.token,
            client: RwLock::new(Some(client)),
            in_flight: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        })
    }

    /// Caller headers first; content type and authorization always win.
    fn headers(&self, extra: &[(String, String)]) -> Result<HeaderMap, BoxError> {
        let mut headers = HeaderMap::new();
        for (name, value) in extra {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", self.token))?,
        );
        Ok(headers)
    }
}

/// Counts one request in flight until dropped, so cancelled requests are released too.
struct InFlight<'a>(&'a AtomicU64);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl BrokerTransport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, BoxError> {
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or_else(|| BoxError::from("transport is closed"))?;

        let url = self.base_url.join(&request.path)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = client
            .request(method, url)
            .headers(self.headers(&request.headers)?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        tracing::debug!(method = request.method.as_str(), path = %request.path, "broker request");
        let sent = {
            let _guard = InFlight::enter(&self.in_flight);
            builder.send().await
        };

        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, "broker request failed");
                return Err(Box::new(err));
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        if status != 200 {
            tracing::warn!(status, "broker returned non-success status");
        }
        let body = response.text().await.map_err(|err| Box::new(err) as BoxError);
        self.completed.fetch_add(1, Ordering::Relaxed);

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn close(&self) {
        self.client.write().await.take();
    }

    fn stats(&self) -> TransportStats {
        TransportStats {
            in_flight: self.in_flight.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
