use std::sync::Arc;

use super::connection::{CommandKind, Connection, ConnectionProvider};
use super::errors::RepositoryError;
use super::registry::{DatabaseHandle, DatabaseRegistry};
use crate::model::Model;
use crate::sql_generator::{ParameterSet, SqlValue};

/// Caller-written SQL or a stored procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'c> {
    Text(&'c str),
    /// Procedure name; quoted and schema-qualified before execution
    Procedure(&'c str),
}

impl Command<'_> {
    fn resolve(&self, handle: &DatabaseHandle) -> (String, CommandKind) {
        match self {
            Command::Text(sql) => (sql.to_string(), CommandKind::Text),
            Command::Procedure(name) => (
                handle.context().qualified_procedure(name),
                CommandKind::StoredProcedure,
            ),
        }
    }
}

/// Runs raw SQL and stored procedures against a registered database
#[derive(Clone)]
pub struct SqlExecutor {
    registry: Arc<DatabaseRegistry>,
    provider: Arc<dyn ConnectionProvider>,
}

impl SqlExecutor {
    pub fn new(registry: Arc<DatabaseRegistry>, provider: Arc<dyn ConnectionProvider>) -> Self {
        SqlExecutor { registry, provider }
    }

    pub fn registry(&self) -> &DatabaseRegistry {
        &self.registry
    }

    /// Look the database up and open a connection to it
    pub(crate) async fn open(
        &self,
        database: &str,
    ) -> Result<(&DatabaseHandle, Box<dyn Connection>), RepositoryError> {
        let handle = self.registry.get(database)?;
        log::debug!("Opening {} connection to '{}'", handle.dialect(), database);
        let connection = self
            .provider
            .open(handle.target())
            .await
            .map_err(RepositoryError::Execution)?;
        Ok((handle, connection))
    }

    /// Rows affected
    pub async fn execute(
        &self,
        database: &str,
        command: Command<'_>,
        params: &ParameterSet,
    ) -> Result<u64, RepositoryError> {
        let (handle, mut conn) = self.open(database).await?;
        let (sql, kind) = command.resolve(handle);
        conn.execute(&sql, params, kind)
            .await
            .map_err(RepositoryError::Execution)
    }

    pub async fn scalar(
        &self,
        database: &str,
        command: Command<'_>,
        params: &ParameterSet,
    ) -> Result<Option<SqlValue>, RepositoryError> {
        let (handle, mut conn) = self.open(database).await?;
        let (sql, kind) = command.resolve(handle);
        conn.query_scalar(&sql, params, kind)
            .await
            .map_err(RepositoryError::Execution)
    }

    pub async fn query_first<T: Model>(
        &self,
        database: &str,
        command: Command<'_>,
        params: &ParameterSet,
    ) -> Result<Option<T>, RepositoryError> {
        let (handle, mut conn) = self.open(database).await?;
        let (sql, kind) = command.resolve(handle);
        let rows = conn
            .query(&sql, params, kind)
            .await
            .map_err(RepositoryError::Execution)?;
        Ok(rows.first().map(T::from_row).transpose()?)
    }

    pub async fn query<T: Model>(
        &self,
        database: &str,
        command: Command<'_>,
        params: &ParameterSet,
    ) -> Result<Vec<T>, RepositoryError> {
        let (handle, mut conn) = self.open(database).await?;
        let (sql, kind) = command.resolve(handle);
        let rows = conn
            .query(&sql, params, kind)
            .await
            .map_err(RepositoryError::Execution)?;
        Ok(rows.iter().map(T::from_row).collect::<Result<Vec<_>, _>>()?)
    }
}
