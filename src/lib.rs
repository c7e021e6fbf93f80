//! Async client for the Apache Pinot broker SQL endpoint.
//!
//! Statements are built from templates with `?` (value) and `??` (identifier) markers,
//! compiled into SQL text with every bound value escaped, and posted to the broker.
//! Responses come back as rows plus execution statistics, or as a [`PinotError`].
//!
//! ```rust
//! use pinot_sql_client::prelude::*;
//!
//! let stmt = sql!("SELECT * FROM " {raw("baseballStats")} " WHERE playerName = " {"O'Neil"});
//! assert_eq!(stmt.compile(), "SELECT * FROM baseballStats WHERE playerName = 'O''Neil'");
//! ```

mod classify;
pub mod client;
pub mod error;
pub mod format;
pub mod options;
pub mod prelude;
pub mod query_builder;
pub mod query_utils;
pub mod results;
pub mod statement;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::SAMPLE_ROWS;
pub use client::{PinotClient, QUERY_PATH};
pub use error::{
    BoxError, BrokerErrorCode, BrokerException, ErrorContext, ErrorKind, PinotError,
    PinotErrorBuilder, TransportErrorCode,
};
pub use format::{FormatOptions, TimeZone, format};
pub use options::{InPredicateLookupAlgorithm, OptionValue, QueryOptions};
pub use query_builder::QueryBuilder;
pub use query_utils::{format_options, stringify_query, stringify_query_with};
pub use results::{QueryResult, QueryStats, Row, RowShape, TranslationError};
pub use statement::{Binding, Statement, StatementBuilder};
pub use types::{RawSql, SqlValue, raw};
