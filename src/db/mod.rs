//! Relational database collaborators.
//!
//! The engine talks to databases through [`DatabaseConnector`] / [`DatabaseConnection`]. Queries
//! run inside a [`ScopedConnection`], which ends the transaction and closes the connection when it
//! goes out of scope, whichever way the query finished.

#[cfg(feature = "db_connectorx")]
pub mod connectorx;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::headers::normalize_headers;
use crate::types::{TabularFrame, Value};

/// Opaque authentication blob supplied with a request.
///
/// Its content is never logged.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(pub serde_json::Value);

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// A fully materialized result set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    /// Column names in select-list order.
    pub columns: Vec<String>,
    /// Rows in the order returned by the database.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Convert into a [`TabularFrame`]. Blank and repeated column names are made unique the same
    /// way file headers are.
    pub fn into_frame(self) -> TabularFrame {
        TabularFrame::from_rows(normalize_headers(self.columns), self.rows)
    }
}

/// Opens connections from a connection string.
pub trait DatabaseConnector: Send + Sync {
    /// Open a connection. `credentials` are passed through untouched when present.
    fn connect(
        &self,
        connection_string: &str,
        credentials: Option<&Credentials>,
    ) -> IngestionResult<Box<dyn DatabaseConnection>>;
}

/// An open database connection.
pub trait DatabaseConnection {
    /// Start a read-only transaction.
    fn begin_read_only(&mut self) -> IngestionResult<()>;

    /// Run `sql` and materialize the whole result set.
    fn query(&mut self, sql: &str) -> IngestionResult<QueryResult>;

    /// Commit the current transaction.
    fn commit(&mut self) -> IngestionResult<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> IngestionResult<()>;

    /// Close the connection. Called exactly once, by [`ScopedConnection`].
    fn close(&mut self);
}

/// Connection guard: ends any open transaction and closes the connection on drop.
pub struct ScopedConnection {
    conn: Box<dyn DatabaseConnection>,
    in_transaction: bool,
}

impl ScopedConnection {
    /// Acquire a connection from `connector`.
    pub fn open(
        connector: &dyn DatabaseConnector,
        connection_string: &str,
        credentials: Option<&Credentials>,
    ) -> IngestionResult<Self> {
        let conn = connector.connect(connection_string, credentials)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Run `sql` inside a read-only transaction and return the full result set.
    ///
    /// The transaction is committed on success and rolled back on failure.
    pub fn query_read_only(&mut self, sql: &str) -> IngestionResult<QueryResult> {
        self.conn.begin_read_only()?;
        self.in_transaction = true;

        let result = self.conn.query(sql);
        let end = match &result {
            Ok(_) => self.conn.commit(),
            Err(_) => self.conn.rollback(),
        };
        self.in_transaction = false;

        let rows = result?;
        end?;
        Ok(rows)
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if self.in_transaction {
            let _ = self.conn.rollback();
        }
        self.conn.close();
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

/// Connector used when no database backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledConnector;

impl DatabaseConnector for DisabledConnector {
    fn connect(
        &self,
        _connection_string: &str,
        _credentials: Option<&Credentials>,
    ) -> IngestionResult<Box<dyn DatabaseConnection>> {
        Err(IngestionError::query(
            "database ingestion not enabled (enable cargo feature 'db_connectorx')",
            None,
        ))
    }
}

/// The connector compiled into this build.
pub fn default_connector() -> Arc<dyn DatabaseConnector> {
    #[cfg(feature = "db_connectorx")]
    {
        Arc::new(connectorx::ConnectorXConnector)
    }

    #[cfg(not(feature = "db_connectorx"))]
    {
        Arc::new(DisabledConnector)
    }
}
