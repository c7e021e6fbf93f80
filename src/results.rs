use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::error::BrokerException;

/// Deserialize `null` as the type's default, the way an absent field is treated.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Default row type: column name to wire value, in column order.
pub type Row = Map<String, JsonValue>;

/// Column metadata of a result table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSchema {
    #[serde(default)]
    pub column_names: Option<Vec<String>>,
    /// Broker type of each column, e.g. `INT`, `STRING`, `TIMESTAMP`.
    #[serde(default)]
    pub column_data_types: Vec<String>,
}

/// Result table as sent by the broker: one inner vector per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTable {
    #[serde(default)]
    pub data_schema: Option<DataSchema>,
    #[serde(default)]
    pub rows: Option<Vec<Vec<JsonValue>>>,
}

/// Broker response to `/query/sql`.
///
/// Everything is optional on the wire; [`translate`] decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result_table: Option<ResultTable>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exceptions: Vec<BrokerException>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trace_info: Map<String, JsonValue>,
    #[serde(
        default,
        alias = "numServersQueried",
        deserialize_with = "null_as_default"
    )]
    pub num_servers_queries: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_servers_responded: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_segments_queried: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_segments_processed: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_segments_matched: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_consuming_segments_queried: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_docs_scanned: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_entries_scanned_post_filter: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_groups_limit_reached: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_docs: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_used_ms: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_consuming_freshness_time_ms: i64,
}

impl BrokerResponse {
    /// First and last `n` raw rows, for diagnostics.
    #[must_use]
    pub fn sample_rows(&self, n: usize) -> (Vec<Vec<JsonValue>>, Vec<Vec<JsonValue>>) {
        let rows = self
            .result_table
            .as_ref()
            .and_then(|table| table.rows.as_deref())
            .unwrap_or_default();
        sample(rows, n)
    }
}

pub(crate) fn sample<T: Clone>(rows: &[T], n: usize) -> (Vec<T>, Vec<T>) {
    let first = rows.iter().take(n).cloned().collect();
    let last = rows[rows.len().saturating_sub(n)..].to_vec();
    (first, last)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentStats {
    pub queried: i64,
    pub processed: i64,
    pub matched: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerStats {
    pub queries: i64,
    pub responded: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocStats {
    pub scanned: i64,
    /// Number of rows in the translated result, not a broker counter.
    pub returned: i64,
    pub total: i64,
}

/// Broker execution statistics, regrouped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    pub trace_info: Map<String, JsonValue>,
    pub segments: SegmentStats,
    pub server: ServerStats,
    pub docs: DocStats,
    pub total_time_ms: i64,
    pub min_consuming_freshness_time_ms: i64,
    pub num_consuming_segments_queried: i64,
    pub num_entries_scanned_post_filter: i64,
    pub num_groups_limit_reached: bool,
}

impl QueryStats {
    fn from_response(response: &BrokerResponse, returned: usize) -> Self {
        Self {
            trace_info: response.trace_info.clone(),
            segments: SegmentStats {
                queried: response.num_segments_queried,
                processed: response.num_segments_processed,
                matched: response.num_segments_matched,
            },
            server: ServerStats {
                queries: response.num_servers_queries,
                responded: response.num_servers_responded,
            },
            docs: DocStats {
                scanned: response.num_docs_scanned,
                returned: i64::try_from(returned).unwrap_or(i64::MAX),
                total: response.total_docs,
            },
            total_time_ms: response.time_used_ms,
            min_consuming_freshness_time_ms: response.min_consuming_freshness_time_ms,
            num_consuming_segments_queried: response.num_consuming_segments_queried,
            num_entries_scanned_post_filter: response.num_entries_scanned_post_filter,
            num_groups_limit_reached: response.num_groups_limit_reached,
        }
    }
}

/// How to treat rows whose width differs from the column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowShape {
    /// Pair values with columns by position: short rows leave trailing columns out,
    /// surplus values are dropped. A warning is logged.
    #[default]
    Lenient,
    /// Fail the translation on the first mismatched row.
    Strict,
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("missing field {0} in broker response")]
    MissingField(&'static str),

    #[error("row {row} has {actual} values but the schema has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("failed to decode row {row}: {source}")]
    Decode {
        row: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Rows and statistics translated from a broker response.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated<R> {
    pub rows: Vec<R>,
    pub stats: QueryStats,
}

/// Map the columnar result table onto row objects and regroup the statistics.
///
/// Values are passed through as the broker sent them; no type coercion happens here
/// beyond deserializing each row object into `R`.
///
/// # Errors
///
/// Returns `TranslationError` if the result table, its schema, column names or rows are
/// missing, if a row cannot be decoded into `R`, or on a width mismatch in
/// [`RowShape::Strict`] mode.
pub fn translate<R: DeserializeOwned>(
    response: &BrokerResponse,
    shape: RowShape,
) -> Result<Translated<R>, TranslationError> {
    let table = response
        .result_table
        .as_ref()
        .ok_or(TranslationError::MissingField("resultTable"))?;
    let columns = table
        .data_schema
        .as_ref()
        .ok_or(TranslationError::MissingField("resultTable.dataSchema"))?
        .column_names
        .as_ref()
        .ok_or(TranslationError::MissingField(
            "resultTable.dataSchema.columnNames",
        ))?;
    let raw_rows = table
        .rows
        .as_ref()
        .ok_or(TranslationError::MissingField("resultTable.rows"))?;

    let mut mismatched = 0usize;
    let mut rows = Vec::with_capacity(raw_rows.len());
    for (idx, raw) in raw_rows.iter().enumerate() {
        if raw.len() != columns.len() {
            if shape == RowShape::Strict {
                return Err(TranslationError::RowWidth {
                    row: idx,
                    expected: columns.len(),
                    actual: raw.len(),
                });
            }
            mismatched += 1;
        }

        let object: Row = columns
            .iter()
            .zip(raw.iter())
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();
        let row = serde_json::from_value(JsonValue::Object(object))
            .map_err(|source| TranslationError::Decode { row: idx, source })?;
        rows.push(row);
    }

    if mismatched > 0 {
        tracing::warn!(
            mismatched,
            columns = columns.len(),
            "result rows do not match the column count"
        );
    }

    let stats = QueryStats::from_response(response, rows.len());
    Ok(Translated { rows, stats })
}

/// Outcome of a successful `select`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<R = Row> {
    pub rows: Vec<R>,
    pub stats: QueryStats,
    /// Compiled SQL that was sent.
    pub sql: String,
    /// Inline form of the options that were sent.
    pub query_options: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(value: JsonValue) -> BrokerResponse {
        serde_json::from_value(value).unwrap()
    }

    fn sample_response() -> BrokerResponse {
        response(json!({
            "resultTable": {
                "dataSchema": {
                    "columnNames": ["id", "name"],
                    "columnDataTypes": ["INT", "STRING"]
                },
                "rows": [[1, "test"]]
            },
            "numDocsScanned": 1,
            "numServersQueried": 1,
            "numSegmentsMatched": 1,
            "minConsumingFreshnessTimeMs": 100,
            "numConsumingSegmentsQueried": 1,
            "numEntriesScannedPostFilter": 1,
            "numGroupsLimitReached": false,
            "numSegmentsProcessed": 1,
            "numSegmentsQueried": 1,
            "timeUsedMs": 100,
            "totalDocs": 1,
            "traceInfo": {},
            "numServersResponded": 1
        }))
    }

    #[test]
    fn maps_rows_and_stats() {
        let translated: Translated<Row> = translate(&sample_response(), RowShape::Lenient).unwrap();
        assert_eq!(translated.rows.len(), 1);
        assert_eq!(JsonValue::Object(translated.rows[0].clone()), json!({"id": 1, "name": "test"}));
        assert_eq!(translated.stats.docs.returned, 1);
        assert_eq!(translated.stats.server.queries, 1);
        assert_eq!(translated.stats.total_time_ms, 100);
        assert_eq!(translated.stats.min_consuming_freshness_time_ms, 100);
    }

    #[test]
    fn returned_counts_translated_rows_not_wire_counter() {
        let mut resp = sample_response();
        resp.num_docs_scanned = 50;
        let translated: Translated<Row> = translate(&resp, RowShape::Lenient).unwrap();
        assert_eq!(translated.stats.docs.scanned, 50);
        assert_eq!(translated.stats.docs.returned, 1);
    }

    #[test]
    fn decodes_into_typed_rows() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: i64,
            name: String,
        }
        let translated: Translated<Item> = translate(&sample_response(), RowShape::Lenient).unwrap();
        assert_eq!(
            translated.rows,
            vec![Item {
                id: 1,
                name: "test".into()
            }]
        );
    }

    #[test]
    fn missing_table_is_an_error() {
        let err = translate::<Row>(&response(json!({"numDocsScanned": 1})), RowShape::Lenient)
            .unwrap_err();
        assert!(matches!(err, TranslationError::MissingField("resultTable")));

        let err = translate::<Row>(
            &response(json!({"resultTable": {"rows": []}})),
            RowShape::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, TranslationError::MissingField("resultTable.dataSchema")));
    }

    #[test]
    fn lenient_rows_pair_by_position() {
        let resp = response(json!({
            "resultTable": {
                "dataSchema": {"columnNames": ["a", "b"]},
                "rows": [[1], [1, 2, 3]]
            }
        }));
        let translated: Translated<Row> = translate(&resp, RowShape::Lenient).unwrap();
        assert_eq!(JsonValue::Object(translated.rows[0].clone()), json!({"a": 1}));
        assert_eq!(JsonValue::Object(translated.rows[1].clone()), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn strict_rows_reject_mismatch() {
        let resp = response(json!({
            "resultTable": {
                "dataSchema": {"columnNames": ["a", "b"]},
                "rows": [[1, 2], [1]]
            }
        }));
        let err = translate::<Row>(&resp, RowShape::Strict).unwrap_err();
        assert!(matches!(
            err,
            TranslationError::RowWidth {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn samples_first_and_last_rows() {
        let rows: Vec<i32> = (1..=10).collect();
        let (first, last) = sample(&rows, 3);
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(last, vec![8, 9, 10]);
        let (first, last) = sample(&rows[..2], 3);
        assert_eq!(first, vec![1, 2]);
        assert_eq!(last, vec![1, 2]);
    }
}
