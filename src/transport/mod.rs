//! Broker transport abstraction.
//!
//! The client only needs one round trip per query; pooling, keep-alive and timeouts live
//! behind [`BrokerTransport`].

use async_trait::async_trait;

use crate::error::BoxError;

#[cfg(feature = "http")]
mod config;
#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use config::{ConfigError, HttpTransportConfig, HttpTransportConfigBuilder};
#[cfg(feature = "http")]
pub use http::HttpTransport;

/// HTTP method of a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Request descriptor handed to the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportRequest {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub path: String,
    pub body: Option<String>,
    pub query: Vec<(String, String)>,
}

/// Response as seen by the transport.
///
/// `body` carries the read failure instead of the text when the body could not be read,
/// so the caller can decide whether that failure matters.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Result<String, BoxError>,
}

impl TransportResponse {
    /// Successful response with a body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Ok(body.into()),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Body text, or the read failure.
    pub fn text(self) -> Result<String, BoxError> {
        self.body
    }
}

/// Point-in-time transport counters. Passed through to callers, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportStats {
    /// Requests currently waiting for a response.
    pub in_flight: u64,
    /// Requests that produced a response (any status).
    pub completed: u64,
    /// Requests that failed before a response was received.
    pub failed: u64,
}

/// Something that can carry one request to the broker and bring back the response.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Send one request.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure when no response was received. Non-success statuses
    /// are returned as responses.
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, BoxError>;

    /// Release pooled resources. Requests after `close` fail.
    async fn close(&self);

    fn stats(&self) -> TransportStats;
}
