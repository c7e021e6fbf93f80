use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::classify::{SentQuery, classify, dispatch_failure};
use crate::error::{ErrorKind, PinotError};
use crate::format::FormatOptions;
use crate::options::QueryOptions;
use crate::query_builder::QueryBuilder;
use crate::results::{QueryResult, Row, RowShape};
use crate::statement::Statement;
use crate::transport::{BrokerTransport, Method, TransportRequest, TransportStats};

/// Broker endpoint for SQL queries.
pub const QUERY_PATH: &str = "/query/sql";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequestBody<'a> {
    sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_options: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<bool>,
}

/// Client for the broker SQL endpoint.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct PinotClient {
    transport: Arc<dyn BrokerTransport>,
    format: FormatOptions,
    row_shape: RowShape,
}

impl std::fmt::Debug for PinotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinotClient")
            .field("format", &self.format)
            .field("row_shape", &self.row_shape)
            .finish_non_exhaustive()
    }
}

impl PinotClient {
    pub fn new(transport: impl BrokerTransport + 'static) -> Self {
        Self::from_transport(Arc::new(transport))
    }

    #[must_use]
    pub fn from_transport(transport: Arc<dyn BrokerTransport>) -> Self {
        Self {
            transport,
            format: FormatOptions::default(),
            row_shape: RowShape::default(),
        }
    }

    /// Connect over HTTP using `PINOT_BROKER_URL` and `PINOT_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the environment does not describe a usable broker.
    #[cfg(feature = "http")]
    pub fn from_env() -> Result<Self, crate::transport::ConfigError> {
        let config = crate::transport::HttpTransportConfig::from_env()?;
        Ok(Self::new(crate::transport::HttpTransport::new(config)?))
    }

    /// How values are rendered when statements are compiled.
    #[must_use]
    pub fn with_format_options(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_row_shape(mut self, row_shape: RowShape) -> Self {
        self.row_shape = row_shape;
        self
    }

    #[must_use]
    pub fn format_options(&self) -> &FormatOptions {
        &self.format
    }

    /// Start a fluent query.
    #[must_use]
    pub fn query<'c, 's>(&'c self, statement: &'s Statement) -> QueryBuilder<'c, 's> {
        QueryBuilder::new(self, statement)
    }

    /// Compile `statement`, send it and translate the response.
    ///
    /// # Errors
    ///
    /// Returns `PinotError` of kind `Transport` when the broker could not be reached or
    /// answered badly, `Sql` when it reported exceptions, and `Parse` when the response
    /// could not be mapped onto rows of `R`.
    pub async fn select<R: DeserializeOwned>(
        &self,
        statement: &Statement,
        options: Option<&QueryOptions>,
        trace: Option<bool>,
    ) -> Result<QueryResult<R>, PinotError> {
        let sql = statement.compile_with(&self.format).into_owned();
        let query_options = options.and_then(QueryOptions::to_inline);

        let body = serde_json::to_string(&QueryRequestBody {
            sql: &sql,
            query_options: query_options.as_deref(),
            trace,
        })
        .map_err(|err| {
            PinotError::builder(ErrorKind::Unknown, format!("can't encode request: {err}"))
                .cause(Box::new(err))
                .build()
        })?;

        tracing::debug!(sql = %sql, query_options = ?query_options, "pinot select");
        let request = TransportRequest {
            method: Method::Post,
            path: QUERY_PATH.to_string(),
            body: Some(body),
            ..TransportRequest::default()
        };
        let response = self
            .transport
            .request(request)
            .await
            .map_err(dispatch_failure)?;

        let result = classify::<R>(
            response,
            SentQuery { sql, query_options },
            self.row_shape,
        )?;
        tracing::debug!(
            rows = result.rows.len(),
            time_used_ms = result.stats.total_time_ms,
            "pinot select done"
        );
        Ok(result)
    }

    /// [`select`](Self::select) into the default row map.
    ///
    /// # Errors
    ///
    /// See [`select`](Self::select).
    pub async fn select_rows(
        &self,
        statement: &Statement,
        options: Option<&QueryOptions>,
    ) -> Result<QueryResult<Row>, PinotError> {
        self.select(statement, options, None).await
    }

    /// Counters from the underlying transport.
    #[must_use]
    pub fn transport_stats(&self) -> TransportStats {
        self.transport.stats()
    }

    /// Release the transport's resources.
    pub async fn close(&self) {
        self.transport.close().await;
    }
}
