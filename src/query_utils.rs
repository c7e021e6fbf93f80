use crate::format::FormatOptions;
use crate::options::QueryOptions;
use crate::statement::Statement;

/// Render options as a `SET` prologue; empty when there are none.
#[must_use]
pub fn format_options(options: Option<&QueryOptions>) -> String {
    options.map(QueryOptions::to_set_prologue).unwrap_or_default()
}

/// Compile a statement and prefix it with its options as `SET` statements.
///
/// Handy for logging and for pasting a query into the broker console:
/// ```rust
/// use pinot_sql_client::prelude::*;
///
/// let stmt = sql!("SELECT * FROM table WHERE id = " {1});
/// let options = QueryOptions::new().use_multistage_engine(true).timeout_ms(100);
/// assert_eq!(
///     stringify_query(&stmt, Some(&options)),
///     "SET useMultistageEngine = true;\nSET timeoutMs = 100;\nSELECT * FROM table WHERE id = 1"
/// );
/// ```
#[must_use]
pub fn stringify_query(statement: &Statement, options: Option<&QueryOptions>) -> String {
    stringify_query_with(statement, options, &FormatOptions::default())
}

#[must_use]
pub fn stringify_query_with(
    statement: &Statement,
    options: Option<&QueryOptions>,
    format: &FormatOptions,
) -> String {
    let prologue = format_options(options);
    let body = statement.compile_with(format);
    [prologue.as_str(), body.as_ref()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
