//! Seam to the database driver
//!
//! The crate never talks to a database itself. A [`ConnectionProvider`]
//! opens a short-lived [`Connection`] for one logical operation and owns
//! pooling, retries, timeouts and transactions.

use async_trait::async_trait;

use crate::model::Row;
use crate::sql_generator::{DialectKind, ParameterSet, SqlValue};

/// Errors raised by the driver, passed through untouched
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Text,
    StoredProcedure,
}

/// Where a connection should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub name: String,
    pub dialect: DialectKind,
    pub connection_string: String,
}

/// One open connection
///
/// Placeholders are `@name`; `params` holds the names without `@`.
/// A [`SqlValue::List`] parameter must be expanded by the implementation.
#[async_trait]
pub trait Connection: Send {
    /// Rows affected
    async fn execute(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<u64, ProviderError>;

    /// First column of the first row, if any
    async fn query_scalar(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<Option<SqlValue>, ProviderError>;

    async fn query(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<Vec<Row>, ProviderError>;

    /// One result set per statement of a batch, in order
    async fn query_multiple(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<Vec<Vec<Row>>, ProviderError>;
}

#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn Connection>, ProviderError>;
}
