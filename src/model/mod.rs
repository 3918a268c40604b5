//! Statically declared model metadata
//!
//! A type implements [`Model`] to describe its columns once; the
//! generation layer derives every column list from that declaration.

pub mod projection;
pub mod row;

pub use projection::{ColumnDef, ColumnMapping, ProjectedColumn, ProjectionCache};
pub use row::{FromSqlValue, Row, RowError};

use crate::sql_generator::value::SqlValue;

/// A record type mapped to a table
///
/// ```
/// use sqlweave::model::{ColumnDef, Model, Row, RowError};
/// use sqlweave::sql_generator::SqlValue;
///
/// struct Category {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for Category {
///     fn columns() -> Vec<ColumnDef> {
///         vec![ColumnDef::new("Id"), ColumnDef::new("Name")]
///     }
///
///     fn values(&self) -> Vec<(&'static str, SqlValue)> {
///         vec![("Id", self.id.into()), ("Name", self.name.as_str().into())]
///     }
///
///     fn from_row(row: &Row) -> Result<Self, RowError> {
///         Ok(Category { id: row.get("Id")?, name: row.get("Name")? })
///     }
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// Name used in errors and logs
    fn model_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Primary key, by property or column name
    fn key_column() -> &'static str {
        "Id"
    }

    fn columns() -> Vec<ColumnDef>;

    /// Current property values, keyed by property name
    fn values(&self) -> Vec<(&'static str, SqlValue)>;

    fn from_row(row: &Row) -> Result<Self, RowError>;
}
