use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::sql_generator::value::SqlValue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("Column '{0}' is missing from the result row")]
    MissingColumn(String),
    #[error("Column '{column}' holds a {found} value, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl RowError {
    fn mismatch(column: &str, expected: &'static str, found: &SqlValue) -> Self {
        RowError::TypeMismatch {
            column: column.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

/// A single result row: named values in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        Row {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Raw value of a column. Names match case-insensitively, as aliases
    /// come back in whatever case the engine folds them to.
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    /// Typed value of a column
    pub fn get<T: FromSqlValue>(&self, column: &str) -> Result<T, RowError> {
        let value = self
            .value(column)
            .ok_or_else(|| RowError::MissingColumn(column.to_string()))?;
        T::from_sql_value(column, value)
    }

    /// First column of the row, as returned by scalar queries
    pub fn first(&self) -> Option<&SqlValue> {
        self.values.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Conversion from a bound or fetched [`SqlValue`] into a Rust type
pub trait FromSqlValue: Sized {
    const EXPECTED: &'static str;

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError>;
}

impl FromSqlValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Int(i) => Ok(*i),
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for i32 {
    const EXPECTED: &'static str = "int";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Int(i) => {
                i32::try_from(*i).map_err(|_| RowError::mismatch(column, "i32", value))
            }
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            SqlValue::Int(i) => Ok(*i as f64),
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            // BIT / TINYINT(1) columns
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for String {
    const EXPECTED: &'static str = "text";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for NaiveDate {
    const EXPECTED: &'static str = "date";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Date(d) => Ok(*d),
            SqlValue::DateTime(dt) => Ok(dt.date()),
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    const EXPECTED: &'static str = "datetime";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::DateTime(dt) => Ok(*dt),
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for Uuid {
    const EXPECTED: &'static str = "uuid";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Uuid(u) => Ok(*u),
            SqlValue::Text(s) => {
                Uuid::parse_str(s).map_err(|_| RowError::mismatch(column, Self::EXPECTED, value))
            }
            other => Err(RowError::mismatch(column, Self::EXPECTED, other)),
        }
    }
}

impl FromSqlValue for SqlValue {
    const EXPECTED: &'static str = "any";

    fn from_sql_value(_column: &str, value: &SqlValue) -> Result<Self, RowError> {
        Ok(value.clone())
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, RowError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(column, other).map(Some),
        }
    }
}
