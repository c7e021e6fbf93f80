use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Boxed error used for causes coming from collaborators (transport, decoders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse error category. The discriminant is the thousands digit of [`PinotError::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unknown = 0,
    /// The request could not be sent or the broker answered with a non-success status.
    Transport = 1,
    /// The broker executed the request but reported exceptions.
    Sql = 2,
    /// The response could not be decoded or translated.
    Parse = 3,
}

impl ErrorKind {
    #[must_use]
    pub fn as_code(self) -> i64 {
        self as i64
    }
}

/// Local codes used for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCode {
    Unknown = 0,
    InvalidResponse = 1,
}

/// An exception reported by the broker in the response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerException {
    pub error_code: i64,
    #[serde(default, deserialize_with = "crate::results::null_as_default")]
    pub message: String,
}

/// Error codes the broker reports in `exceptions[].errorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerErrorCode {
    JsonParsing = 100,
    JsonCompilation = 101,
    SqlParsing = 150,
    SegmentPlanExecution = 160,
    CombineSegmentPlanTimeout = 170,
    AccessDenied = 180,
    TableDoesNotExist = 190,
    QueryExecution = 200,
    QueryCancellation = 205,
    ServerShuttingDown = 210,
    ServerOutOfCapacity = 211,
    ServerTableMissing = 230,
    ServerSegmentMissing = 235,
    QuerySchedulingTimeout = 240,
    ExecutionTimeout = 250,
    DataTableSerialization = 260,
    BrokerGather = 300,
    BrokerSegmentUnavailable = 305,
    DataTableDeserialization = 310,
    FutureCall = 350,
    BrokerTimeout = 400,
    BrokerResourceMissing = 410,
    BrokerInstanceMissing = 420,
    BrokerRequestSend = 425,
    ServerNotResponding = 427,
    TooManyRequests = 429,
    Internal = 450,
    MergeResponse = 500,
    FederatedBrokerUnavailable = 550,
    CombineGroupByException = 600,
    QueryValidation = 700,
    UnknownColumn = 710,
    Unknown = 1000,
}

impl BrokerErrorCode {
    const ALL: [BrokerErrorCode; 33] = [
        Self::JsonParsing,
        Self::JsonCompilation,
        Self::SqlParsing,
        Self::SegmentPlanExecution,
        Self::CombineSegmentPlanTimeout,
        Self::AccessDenied,
        Self::TableDoesNotExist,
        Self::QueryExecution,
        Self::QueryCancellation,
        Self::ServerShuttingDown,
        Self::ServerOutOfCapacity,
        Self::ServerTableMissing,
        Self::ServerSegmentMissing,
        Self::QuerySchedulingTimeout,
        Self::ExecutionTimeout,
        Self::DataTableSerialization,
        Self::BrokerGather,
        Self::BrokerSegmentUnavailable,
        Self::DataTableDeserialization,
        Self::FutureCall,
        Self::BrokerTimeout,
        Self::BrokerResourceMissing,
        Self::BrokerInstanceMissing,
        Self::BrokerRequestSend,
        Self::ServerNotResponding,
        Self::TooManyRequests,
        Self::Internal,
        Self::MergeResponse,
        Self::FederatedBrokerUnavailable,
        Self::CombineGroupByException,
        Self::QueryValidation,
        Self::UnknownColumn,
        Self::Unknown,
    ];

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| *c as i64 == code)
    }
}

/// Diagnostic data attached to an error at the failure site.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ErrorContext {
    #[default]
    None,
    /// Raw response data, best effort.
    Transport {
        status: Option<u16>,
        headers: Vec<(String, String)>,
        body: Option<String>,
    },
    /// The query that failed and a sample of any partial result table.
    Query {
        sql: String,
        query_options: Option<String>,
        first_rows: Vec<Vec<JsonValue>>,
        last_rows: Vec<Vec<JsonValue>>,
    },
}

/// The single error type surfaced by the client.
///
/// `code` combines the kind and a local reason: `kind * 1000 + local`. The local part is
/// the explicit code when one was given, otherwise the broker's code when exactly one
/// exception was reported, otherwise `0`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PinotError {
    kind: ErrorKind,
    code: i64,
    message: String,
    #[source]
    cause: Option<BoxError>,
    exceptions: Vec<BrokerException>,
    context: ErrorContext,
}

impl PinotError {
    pub fn builder(kind: ErrorKind, message: impl Into<String>) -> PinotErrorBuilder {
        PinotErrorBuilder {
            kind,
            message: message.into(),
            code: None,
            cause: None,
            exceptions: Vec::new(),
            context: ErrorContext::None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn code(&self) -> i64 {
        self.code
    }

    /// The part of [`code`](Self::code) below the kind digit.
    #[must_use]
    pub fn local_code(&self) -> i64 {
        self.code - self.kind.as_code() * 1000
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn exceptions(&self) -> &[BrokerException] {
        &self.exceptions
    }

    #[must_use]
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Broker error code when the local code is one of the known broker codes.
    #[must_use]
    pub fn broker_error_code(&self) -> Option<BrokerErrorCode> {
        match self.kind {
            ErrorKind::Sql => BrokerErrorCode::from_code(self.local_code()),
            _ => None,
        }
    }

    /// The request never produced a response.
    pub fn transport(cause: BoxError) -> Self {
        PinotError::builder(ErrorKind::Transport, format!("Pinot transport error: {cause}"))
            .code(TransportErrorCode::Unknown as i64)
            .cause(cause)
            .build()
    }

    /// The broker answered with a non-success status.
    #[must_use]
    pub fn status(status: u16, headers: Vec<(String, String)>, body: Option<String>) -> Self {
        PinotError::builder(
            ErrorKind::Transport,
            format!("Pinot transport error: response code {status}"),
        )
        .code(i64::from(status))
        .context(ErrorContext::Transport {
            status: Some(status),
            headers,
            body,
        })
        .build()
    }

    pub fn unreadable_body(status: u16, cause: BoxError) -> Self {
        PinotError::builder(
            ErrorKind::Transport,
            "Pinot transport error: can't read response body",
        )
        .code(TransportErrorCode::InvalidResponse as i64)
        .cause(cause)
        .context(ErrorContext::Transport {
            status: Some(status),
            headers: Vec::new(),
            body: None,
        })
        .build()
    }

    #[must_use]
    pub fn invalid_json(status: u16, cause: serde_json::Error, body: String) -> Self {
        PinotError::builder(
            ErrorKind::Transport,
            "Pinot transport error: can't parse response body JSON",
        )
        .code(TransportErrorCode::InvalidResponse as i64)
        .cause(Box::new(cause))
        .context(ErrorContext::Transport {
            status: Some(status),
            headers: Vec::new(),
            body: Some(body),
        })
        .build()
    }

    /// The broker reported exceptions for the query.
    #[must_use]
    pub fn query_exception(exceptions: Vec<BrokerException>, context: ErrorContext) -> Self {
        PinotError::builder(ErrorKind::Sql, "Pinot query exception")
            .exceptions(exceptions)
            .context(context)
            .build()
    }

    /// The response could not be decoded or translated.
    pub fn parse(cause: BoxError, context: ErrorContext) -> Self {
        PinotError::builder(ErrorKind::Parse, "Pinot parse error")
            .cause(cause)
            .context(context)
            .build()
    }
}

/// Builder for [`PinotError`]; the composite code is computed in [`build`](Self::build).
#[derive(Debug)]
pub struct PinotErrorBuilder {
    kind: ErrorKind,
    message: String,
    code: Option<i64>,
    cause: Option<BoxError>,
    exceptions: Vec<BrokerException>,
    context: ErrorContext,
}

impl PinotErrorBuilder {
    #[must_use]
    pub fn code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn cause(mut self, cause: BoxError) -> Self {
        self.cause = Some(cause);
        self
    }

    #[must_use]
    pub fn exceptions(mut self, exceptions: Vec<BrokerException>) -> Self {
        self.exceptions = exceptions;
        self
    }

    #[must_use]
    pub fn context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn build(self) -> PinotError {
        let local = match (self.code, self.exceptions.as_slice()) {
            (Some(code), _) if code != 0 => code,
            (_, [only]) => only.error_code,
            (code, _) => code.unwrap_or(0),
        };
        PinotError {
            kind: self.kind,
            code: self.kind.as_code() * 1000 + local,
            message: self.message,
            cause: self.cause,
            exceptions: self.exceptions,
            context: self.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    fn exception(code: i64) -> BrokerException {
        BrokerException {
            error_code: code,
            message: format!("error {code}"),
        }
    }

    #[test]
    fn single_exception_code_surfaces() {
        let err = PinotError::builder(ErrorKind::Sql, "boom")
            .exceptions(vec![exception(150)])
            .build();
        assert_eq!(err.code(), 2150);
        assert_eq!(err.local_code(), 150);
        assert_eq!(err.broker_error_code(), Some(BrokerErrorCode::SqlParsing));
    }

    #[test]
    fn explicit_code_wins() {
        let err = PinotError::builder(ErrorKind::Sql, "boom")
            .code(7)
            .exceptions(vec![exception(150)])
            .build();
        assert_eq!(err.code(), 2007);
    }

    #[test]
    fn zero_code_counts_as_absent() {
        let err = PinotError::builder(ErrorKind::Sql, "boom")
            .code(0)
            .exceptions(vec![exception(190)])
            .build();
        assert_eq!(err.code(), 2190);
    }

    #[test]
    fn several_exceptions_leave_local_code_zero() {
        let err = PinotError::query_exception(
            vec![exception(150), exception(200)],
            ErrorContext::None,
        );
        assert_eq!(err.code(), 2000);
        assert_eq!(err.exceptions().len(), 2);
    }

    #[test]
    fn transport_errors() {
        let err = PinotError::status(503, Vec::new(), Some("busy".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.code(), 1503);
        assert_eq!(err.to_string(), "Pinot transport error: response code 503");

        let err = PinotError::transport("connection refused".into());
        assert_eq!(err.code(), 1000);
        assert!(err.source().is_some());
    }

    #[test]
    fn default_kind_is_unknown() {
        let err = PinotError::builder(ErrorKind::Unknown, "huh").build();
        assert_eq!(err.code(), 0);
        assert!(err.source().is_none());
    }
}
