use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// Values that can be bound into a [`Statement`](crate::Statement).
///
/// The enum is closed: every shape the escaper understands has its own variant, so
/// escaping is an exhaustive `match` rather than a runtime type probe.
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let params = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
    /// Binary data, rendered as a hex literal
    Bytes(Vec<u8>),
    /// Pre-escaped SQL, passed through verbatim
    Raw(RawSql),
    /// Column to value mapping, rendered as an assignment list
    Object(IndexMap<String, SqlValue>),
    /// List of values, rendered as a comma separated list
    Array(Vec<SqlValue>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Binary value.
    #[must_use]
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SqlValue::Bytes(bytes.into())
    }

    /// Timestamp from milliseconds since the Unix epoch.
    ///
    /// Returns `SqlValue::Null` when the instant is outside the representable range, which
    /// is what an invalid date escapes to anyway.
    #[must_use]
    pub fn from_timestamp_millis(millis: i64) -> Self {
        DateTime::from_timestamp_millis(millis).map_or(SqlValue::Null, SqlValue::Timestamp)
    }

    /// Build an object value from `(column, value)` pairs, keeping their order.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        SqlValue::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// JSON view of the value.
    ///
    /// Timestamps become RFC 3339 strings, bytes become lowercase hex strings and raw
    /// fragments become their text.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::Int(i) => JsonValue::from(*i),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(JsonValue::Null, JsonValue::Number),
            SqlValue::Text(s) => JsonValue::String(s.clone()),
            SqlValue::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
            SqlValue::Bytes(bytes) => JsonValue::String(hex::encode(bytes)),
            SqlValue::Raw(raw) => JsonValue::String(raw.as_str().to_string()),
            SqlValue::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            SqlValue::Array(items) => JsonValue::Array(items.iter().map(SqlValue::to_json).collect()),
        }
    }
}

/// Plain textual form of a value, used when a value is quoted as a string or as an
/// identifier rather than rendered as a literal.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("null"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            SqlValue::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            SqlValue::Raw(raw) => f.write_str(raw.as_str()),
            SqlValue::Object(_) => write!(f, "{}", self.to_json()),
            SqlValue::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// SQL text that is inserted into a query exactly as given.
///
/// The caller is responsible for the safety of the fragment; nothing is escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSql(String);

impl RawSql {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Wrap pre-escaped SQL so it passes through the escaper unchanged.
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let stmt = sql!("SELECT * FROM t ORDER BY " {raw("ts DESC")});
/// assert_eq!(stmt.compile(), "SELECT * FROM t ORDER BY ts DESC");
/// ```
#[must_use]
pub fn raw(sql: impl Into<String>) -> RawSql {
    RawSql(sql.into())
}

macro_rules! impl_from_for_sql_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_sql_value! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    &String => Text,
    DateTime<Utc> => Timestamp,
    RawSql => Raw,
    IndexMap<String, SqlValue> => Object,
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(values: Vec<T>) -> Self {
        SqlValue::Array(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_expected_variants() {
        assert_eq!(SqlValue::from(7_i32), SqlValue::Int(7));
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".into()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(
            SqlValue::from(vec![1_i64, 2]),
            SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Int(2)])
        );
    }

    #[test]
    fn out_of_range_millis_become_null() {
        assert!(SqlValue::from_timestamp_millis(i64::MAX).is_null());
        assert!(matches!(
            SqlValue::from_timestamp_millis(0),
            SqlValue::Timestamp(_)
        ));
    }

    #[test]
    fn display_uses_plain_text() {
        let arr = SqlValue::from(vec![SqlValue::Int(1), SqlValue::Text("b".into())]);
        assert_eq!(arr.to_string(), "1,b");
        let obj = SqlValue::object([("a", 1)]);
        assert_eq!(obj.to_string(), r#"{"a":1}"#);
    }
}
