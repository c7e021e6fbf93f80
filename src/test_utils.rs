//! In-memory transport for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::BoxError;
use crate::transport::{BrokerTransport, TransportRequest, TransportResponse, TransportStats};

type Responder = dyn Fn(&TransportRequest) -> Result<TransportResponse, BoxError> + Send + Sync;

/// Transport that answers every request with a canned responder and records what it saw.
pub struct MockTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<TransportRequest>>,
    closed: AtomicBool,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, BoxError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Always answer `status` with `body`.
    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(TransportResponse::new(status, body.clone())))
    }

    /// Always answer with a 200 and `body` serialized as JSON.
    #[must_use]
    pub fn json(body: &serde_json::Value) -> Self {
        Self::responding(200, body.to_string())
    }

    /// Always fail before a response is produced.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(message.clone().into()))
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BrokerTransport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, BoxError> {
        if self.is_closed() {
            return Err("transport is closed".into());
        }
        let outcome = (self.responder)(&request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match &outcome {
            Ok(_) => self.completed.fetch_add(1, Ordering::SeqCst),
            Err(_) => self.failed.fetch_add(1, Ordering::SeqCst),
        };
        outcome
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn stats(&self) -> TransportStats {
        TransportStats {
            in_flight: 0,
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}
