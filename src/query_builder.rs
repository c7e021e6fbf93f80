use serde::de::DeserializeOwned;

use crate::client::PinotClient;
use crate::error::PinotError;
use crate::options::QueryOptions;
use crate::results::{QueryResult, Row};
use crate::statement::Statement;

/// Fluent builder for one broker query.
#[derive(Debug)]
pub struct QueryBuilder<'c, 's> {
    client: &'c PinotClient,
    statement: &'s Statement,
    options: Option<QueryOptions>,
    trace: Option<bool>,
}

impl<'c, 's> QueryBuilder<'c, 's> {
    pub(crate) fn new(client: &'c PinotClient, statement: &'s Statement) -> Self {
        Self {
            client,
            statement,
            options: None,
            trace: None,
        }
    }

    /// Broker query options for this request.
    #[must_use]
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Ask the broker for trace info.
    #[must_use]
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Execute and decode each row into `R`.
    ///
    /// # Errors
    ///
    /// See [`PinotClient::select`].
    pub async fn select<R: DeserializeOwned>(self) -> Result<QueryResult<R>, PinotError> {
        self.client
            .select(self.statement, self.options.as_ref(), self.trace)
            .await
    }

    /// Execute and return rows as column maps.
    ///
    /// # Errors
    ///
    /// See [`PinotClient::select`].
    pub async fn rows(self) -> Result<QueryResult<Row>, PinotError> {
        self.select::<Row>().await
    }
}
