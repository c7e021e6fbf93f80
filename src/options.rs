use std::fmt;

use indexmap::IndexMap;

/// A single broker query option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

macro_rules! impl_from_for_option_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    OptionValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_option_value! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    String => Text,
    &str => Text,
}

/// Dictionary lookup algorithm for `IN` clause values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InPredicateLookupAlgorithm {
    DivideBinarySearch,
    Scan,
    PlainBinarySearch,
}

impl InPredicateLookupAlgorithm {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InPredicateLookupAlgorithm::DivideBinarySearch => "DIVIDE_BINARY_SEARCH",
            InPredicateLookupAlgorithm::Scan => "SCAN",
            InPredicateLookupAlgorithm::PlainBinarySearch => "PLAIN_BINARY_SEARCH",
        }
    }
}

/// Broker query options, kept in insertion order.
///
/// Typed setters cover the documented broker options; [`QueryOptions::set`] accepts any
/// other key, which is passed through verbatim.
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let options = QueryOptions::new()
///     .use_multistage_engine(true)
///     .timeout_ms(100);
/// assert_eq!(options.to_inline().as_deref(), Some("useMultistageEngine=true;timeoutMs=100"));
/// assert_eq!(
///     options.to_set_prologue(),
///     "SET useMultistageEngine = true;\nSET timeoutMs = 100;"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOptions {
    entries: IndexMap<String, OptionValue>,
}

macro_rules! option_setters {
    ($($(#[$doc:meta])* $fn_name:ident($ty:ty) => $key:literal;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $fn_name(self, value: $ty) -> Self {
                self.set($key, value)
            }
        )*
    };
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any option by name. Re-setting a key keeps its original position.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    option_setters! {
        /// Query timeout in milliseconds.
        timeout_ms(i64) => "timeoutMs";
        /// Enables advanced null handling.
        enable_null_handling(bool) => "enableNullHandling";
        /// Return the verbose plan for `EXPLAIN` queries.
        explain_plan_verbose(bool) => "explainPlanVerbose";
        /// Run the query on the multi-stage engine.
        use_multistage_engine(bool) => "useMultistageEngine";
        max_execution_threads(i64) => "maxExecutionThreads";
        num_replica_groups_to_query(i64) => "numReplicaGroupsToQuery";
        min_segment_group_trim_size(i64) => "minSegmentGroupTrimSize";
        min_server_group_trim_size(i64) => "minServerGroupTrimSize";
        /// Per-column indexes to skip, e.g. `col1=inverted,range&col2=sorted`.
        skip_indexes(&str) => "skipIndexes";
        /// For upsert tables, query all records ignoring upsert.
        skip_upsert(bool) => "skipUpsert";
        use_star_tree(bool) => "useStarTree";
        and_scan_reordering(bool) => "andScanReordering";
        max_rows_in_join(i64) => "maxRowsInJoin";
        in_predicate_pre_sorted(bool) => "inPredicatePreSorted";
        max_server_response_size_bytes(i64) => "maxServerResponseSizeBytes";
        max_query_response_size_bytes(i64) => "maxQueryResponseSizeBytes";
    }

    #[must_use]
    pub fn in_predicate_lookup_algorithm(self, algorithm: InPredicateLookupAlgorithm) -> Self {
        self.set("inPredicateLookupAlgorithm", algorithm.as_str())
    }

    /// `key=value` pairs joined with `;`, or `None` when there are no options.
    ///
    /// This is the `queryOptions` field of the broker request body.
    #[must_use]
    pub fn to_inline(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(";"),
        )
    }

    /// One `SET key = literal;` line per option; strings are single-quoted.
    #[must_use]
    pub fn to_set_prologue(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| match value {
                OptionValue::Text(s) => format!("SET {key} = '{s}';"),
                other => format!("SET {key} = {other};"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(QueryOptions::new(), |options, (key, value)| options.set(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_form_keeps_insertion_order() {
        let options = QueryOptions::new().timeout_ms(20000).use_multistage_engine(true);
        assert_eq!(
            options.to_inline().as_deref(),
            Some("timeoutMs=20000;useMultistageEngine=true")
        );
    }

    #[test]
    fn empty_options() {
        let options = QueryOptions::new();
        assert_eq!(options.to_inline(), None);
        assert_eq!(options.to_set_prologue(), "");
    }

    #[test]
    fn prologue_quotes_strings_only() {
        let options = QueryOptions::new()
            .use_multistage_engine(true)
            .timeout_ms(100)
            .in_predicate_lookup_algorithm(InPredicateLookupAlgorithm::Scan);
        assert_eq!(
            options.to_set_prologue(),
            "SET useMultistageEngine = true;\nSET timeoutMs = 100;\nSET inPredicateLookupAlgorithm = 'SCAN';"
        );
    }

    #[test]
    fn unknown_keys_pass_through() {
        let options: QueryOptions = [("customFlag", "on")].into_iter().collect();
        assert_eq!(options.to_inline().as_deref(), Some("customFlag=on"));
        assert_eq!(options.to_set_prologue(), "SET customFlag = 'on';");
        assert_eq!(options.get("customFlag"), Some(&OptionValue::Text("on".into())));
    }

    #[test]
    fn floats_render_unquoted() {
        let options = QueryOptions::new().set("ratio", 0.5);
        assert_eq!(options.to_set_prologue(), "SET ratio = 0.5;");
        assert_eq!(options.to_inline().as_deref(), Some("ratio=0.5"));
    }
}
