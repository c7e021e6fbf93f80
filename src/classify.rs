//! Turning a transport outcome into rows or a [`PinotError`].
//!
//! Order matters: status, then body, then JSON, then broker exceptions, then translation.
//! The first failing step decides the error.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{BoxError, BrokerException, ErrorContext, PinotError};
use crate::results::{BrokerResponse, QueryResult, RowShape, sample, translate};
use crate::transport::TransportResponse;

/// Rows kept at each end of the result table in error diagnostics.
pub const SAMPLE_ROWS: usize = 3;

/// What was sent, carried into diagnostics and the result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SentQuery {
    pub sql: String,
    pub query_options: Option<String>,
}

impl SentQuery {
    fn context(&self, rows: &[Vec<JsonValue>]) -> ErrorContext {
        let (first_rows, last_rows) = sample(rows, SAMPLE_ROWS);
        ErrorContext::Query {
            sql: self.sql.clone(),
            query_options: self.query_options.clone(),
            first_rows,
            last_rows,
        }
    }
}

/// Classify a failure to get any response at all.
#[must_use]
pub fn dispatch_failure(cause: BoxError) -> PinotError {
    tracing::warn!(error = %cause, "pinot request could not be dispatched");
    PinotError::transport(cause)
}

/// Classify a broker response and translate it on success.
///
/// # Errors
///
/// Returns a transport error for a non-200 status or an unreadable/non-JSON body, a SQL
/// error when the broker reported exceptions, and a parse error when the payload does not
/// have the expected shape.
pub fn classify<R: DeserializeOwned>(
    mut response: TransportResponse,
    sent: SentQuery,
    shape: RowShape,
) -> Result<QueryResult<R>, PinotError> {
    let status = response.status;
    if status != 200 {
        let headers = std::mem::take(&mut response.headers);
        // body is best effort here
        return Err(PinotError::status(status, headers, response.text().ok()));
    }

    let text = response
        .text()
        .map_err(|cause| PinotError::unreadable_body(status, cause))?;
    let json: JsonValue = serde_json::from_str(&text)
        .map_err(|cause| PinotError::invalid_json(status, cause, text.clone()))?;

    // exceptions win over any shape problem elsewhere in the payload
    let exceptions = broker_exceptions(&json);
    if !exceptions.is_empty() {
        tracing::warn!(
            exceptions = exceptions.len(),
            first = %exceptions[0].message,
            "broker reported query exceptions"
        );
        let context = sent.context(&raw_rows(&json));
        return Err(PinotError::query_exception(exceptions, context));
    }

    let decoded = match BrokerResponse::deserialize(&json) {
        Ok(decoded) => decoded,
        Err(cause) => {
            let context = sent.context(&raw_rows(&json));
            return Err(PinotError::parse(Box::new(cause), context));
        }
    };

    match translate(&decoded, shape) {
        Ok(translated) => Ok(QueryResult {
            rows: translated.rows,
            stats: translated.stats,
            sql: sent.sql,
            query_options: sent.query_options,
        }),
        Err(cause) => {
            let (first_rows, last_rows) = decoded.sample_rows(SAMPLE_ROWS);
            Err(PinotError::parse(
                Box::new(cause),
                ErrorContext::Query {
                    sql: sent.sql,
                    query_options: sent.query_options,
                    first_rows,
                    last_rows,
                },
            ))
        }
    }
}

/// Exceptions read straight from the payload. Malformed entries still count: a missing
/// code reads as `0` and a non-object entry becomes the message.
fn broker_exceptions(json: &JsonValue) -> Vec<BrokerException> {
    let Some(items) = json.get("exceptions").and_then(JsonValue::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| BrokerException {
            error_code: item
                .get("errorCode")
                .and_then(JsonValue::as_i64)
                .unwrap_or(0),
            message: match item.get("message") {
                Some(JsonValue::String(message)) => message.clone(),
                Some(other) => other.to_string(),
                None if item.is_object() => String::new(),
                None => item
                    .as_str()
                    .map_or_else(|| item.to_string(), str::to_string),
            },
        })
        .collect()
}

fn raw_rows(json: &JsonValue) -> Vec<Vec<JsonValue>> {
    json.pointer("/resultTable/rows")
        .and_then(JsonValue::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.as_array().cloned())
                .collect()
        })
        .unwrap_or_default()
}
