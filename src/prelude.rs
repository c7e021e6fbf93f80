//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::sql;

pub use crate::client::PinotClient;
pub use crate::error::{ErrorKind, PinotError};
pub use crate::format::{FormatOptions, TimeZone, escape, escape_id, escape_string, format};
pub use crate::options::{InPredicateLookupAlgorithm, QueryOptions};
pub use crate::query_utils::stringify_query;
pub use crate::results::{QueryResult, QueryStats, Row, RowShape};
pub use crate::statement::Statement;
pub use crate::types::{SqlValue, raw};

#[cfg(feature = "http")]
pub use crate::transport::{HttpTransport, HttpTransportConfig, HttpTransportConfigBuilder};
