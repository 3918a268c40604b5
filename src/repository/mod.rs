//! Repository facade
//!
//! Orchestration only: drop unset filters, assemble the query for the
//! named database, run it through the [`ConnectionProvider`] and map the
//! rows back onto the model. Table names are schema-qualified here.

pub mod connection;
pub mod errors;
pub mod executor;
pub mod paging;
pub mod registry;

use std::sync::Arc;

pub use connection::{CommandKind, Connection, ConnectionProvider, ConnectionTarget, ProviderError};
pub use errors::RepositoryError;
pub use executor::{Command, SqlExecutor};
pub use paging::{PagedRequest, PagedResult};
pub use registry::{DatabaseHandle, DatabaseRegistry};

use crate::model::{FromSqlValue, Model, Row, RowError};
use crate::sql_generator::{significant_filters, PagingStrategy, SqlValue};

#[derive(Clone)]
pub struct Repository {
    executor: SqlExecutor,
}

impl Repository {
    pub fn new(registry: Arc<DatabaseRegistry>, provider: Arc<dyn ConnectionProvider>) -> Self {
        Repository {
            executor: SqlExecutor::new(registry, provider),
        }
    }

    /// Raw SQL and stored procedures against the same databases
    pub fn executor(&self) -> &SqlExecutor {
        &self.executor
    }

    /// Insert a record and return the key the database generated for it
    pub async fn insert<T: Model>(
        &self,
        database: &str,
        table: &str,
        model: &T,
    ) -> Result<SqlValue, RepositoryError> {
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .insert(&ctx.qualified_table(table), model)?;
        let key = conn
            .query_scalar(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)?;
        key.ok_or_else(|| RowError::MissingColumn(T::key_column().to_string()).into())
    }

    /// Rows affected
    pub async fn update<T: Model>(
        &self,
        database: &str,
        table: &str,
        model: &T,
    ) -> Result<u64, RepositoryError> {
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .update(&ctx.qualified_table(table), model)?;
        conn.execute(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)
    }

    /// Rows affected
    pub async fn delete<T: Model>(
        &self,
        database: &str,
        table: &str,
        key: impl Into<SqlValue>,
    ) -> Result<u64, RepositoryError> {
        let key = key.into();
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .delete::<T>(&ctx.qualified_table(table), key)?;
        conn.execute(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)
    }

    pub async fn get_by_id<T: Model>(
        &self,
        database: &str,
        table: &str,
        key: impl Into<SqlValue>,
    ) -> Result<Option<T>, RepositoryError> {
        let key = key.into();
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .select_by_key::<T>(&ctx.qualified_table(table), key)?;
        let rows = conn
            .query(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)?;
        Ok(rows.first().map(T::from_row).transpose()?)
    }

    pub async fn get_all<T: Model>(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<T>, RepositoryError> {
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx.assembler().select_all::<T>(&ctx.qualified_table(table))?;
        let rows = conn
            .query(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)?;
        map_rows(&rows)
    }

    /// Filtered, ordered page plus the total match count.
    ///
    /// Filters whose value is an unset marker are dropped first. The COUNT
    /// and page statements run as one batch or as two commands depending on
    /// the database's paging strategy.
    pub async fn get_paged<T: Model>(
        &self,
        database: &str,
        table: &str,
        request: &PagedRequest,
    ) -> Result<PagedResult<T>, RepositoryError> {
        let page = request.page_spec()?;
        let filters = significant_filters(&request.filters);

        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .count_and_page::<T>(&ctx.qualified_table(table), &filters, &page)?;

        let (count, rows) = match ctx.paging_strategy() {
            PagingStrategy::SingleBatch => {
                let mut sets = conn
                    .query_multiple(query.sql(), &query.params, CommandKind::Text)
                    .await
                    .map_err(RepositoryError::Execution)?
                    .into_iter();
                let count = sets
                    .next()
                    .and_then(|rows| rows.first().and_then(Row::first).cloned());
                (count, sets.next().unwrap_or_default())
            }
            PagingStrategy::SeparateRoundTrips => {
                let (count_sql, page_sql) = query.template.count_and_page()?;
                let count = conn
                    .query_scalar(count_sql, &query.params, CommandKind::Text)
                    .await
                    .map_err(RepositoryError::Execution)?;
                let rows = conn
                    .query(page_sql, &query.params, CommandKind::Text)
                    .await
                    .map_err(RepositoryError::Execution)?;
                (count, rows)
            }
        };

        let total_records = match count {
            Some(value) => u64::try_from(i64::from_sql_value("COUNT(1)", &value)?).unwrap_or(0),
            None => 0,
        };

        Ok(PagedResult {
            items: map_rows(&rows)?,
            page_number: page.page_number,
            page_size: page.page_size,
            total_records,
        })
    }

    /// Rows matching every `(column, value)` pair by equality
    pub async fn find_by<T: Model>(
        &self,
        database: &str,
        table: &str,
        filters: &[(&str, SqlValue)],
    ) -> Result<Vec<T>, RepositoryError> {
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .select_with_filters::<T>(&ctx.qualified_table(table), filters)?;
        let rows = conn
            .query(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)?;
        map_rows(&rows)
    }

    /// Rows where any of `columns` contains `term`
    pub async fn search<T: Model>(
        &self,
        database: &str,
        table: &str,
        columns: &[&str],
        term: impl Into<SqlValue>,
    ) -> Result<Vec<T>, RepositoryError> {
        let term = term.into();
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let query = ctx
            .assembler()
            .search::<T>(&ctx.qualified_table(table), columns, term)?;
        let rows = conn
            .query(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)?;
        map_rows(&rows)
    }

    /// Rows whose `column` is one of `values`
    pub async fn get_by_values<T, V>(
        &self,
        database: &str,
        table: &str,
        column: &str,
        values: Vec<V>,
    ) -> Result<Vec<T>, RepositoryError>
    where
        T: Model,
        V: Into<SqlValue> + Send,
    {
        let values = SqlValue::list(values);
        let (handle, mut conn) = self.executor.open(database).await?;
        let ctx = handle.context();
        let mapping = ctx.projections().resolve::<T>();
        let query = ctx
            .assembler()
            .select_in_for(&mapping, &ctx.qualified_table(table), column, values)?;
        let rows = conn
            .query(query.sql(), &query.params, CommandKind::Text)
            .await
            .map_err(RepositoryError::Execution)?;
        map_rows(&rows)
    }
}

fn map_rows<T: Model>(rows: &[Row]) -> Result<Vec<T>, RepositoryError> {
    Ok(rows.iter().map(T::from_row).collect::<Result<Vec<_>, _>>()?)
}
