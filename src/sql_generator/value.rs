//! Literal values bound to template placeholders
//!
//! Values never appear in generated SQL text. They travel next to the
//! template in a [`ParameterSet`](super::params::ParameterSet) and are
//! bound by the connection provider.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A literal bound to a placeholder or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    /// Right-hand side of IN / NOT IN, expanded by the connection provider
    List(Vec<SqlValue>),
    /// Inclusive bounds of BETWEEN
    Range(Box<SqlValue>, Box<SqlValue>),
}

/// 0001-01-01, the "no date entered" value most form layers post
fn default_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1, 1, 1)
}

fn epoch_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
}

fn is_date_sentinel(date: NaiveDate) -> bool {
    date == NaiveDate::MIN || Some(date) == default_date() || Some(date) == epoch_date()
}

fn is_datetime_sentinel(dt: NaiveDateTime) -> bool {
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0);
    dt == NaiveDateTime::MIN
        || default_date().and_then(midnight) == Some(dt)
        || epoch_date().and_then(midnight) == Some(dt)
}

impl SqlValue {
    /// Whether a caller-supplied filter value means "filter on this".
    ///
    /// Search forms post every field whether or not the user filled it in,
    /// so the unset markers are treated as absent: null, empty or
    /// whitespace-only text, integer zero, the minimum/default/epoch date,
    /// and an empty IN list. Booleans, floats, UUIDs, ranges, non-empty
    /// text, non-zero integers and ordinary dates always count. Callers
    /// that genuinely need to filter on `0` or `""` must build the query
    /// without this check.
    pub fn is_significant(&self) -> bool {
        match self {
            SqlValue::Null => false,
            SqlValue::Text(s) => !s.trim().is_empty(),
            SqlValue::Int(i) => *i != 0,
            SqlValue::Date(d) => !is_date_sentinel(*d),
            SqlValue::DateTime(dt) => !is_datetime_sentinel(*dt),
            SqlValue::List(items) => !items.is_empty(),
            SqlValue::Bool(_) | SqlValue::Float(_) | SqlValue::Uuid(_) | SqlValue::Range(..) => {
                true
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Date(_) => "date",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::List(_) => "list",
            SqlValue::Range(..) => "range",
        }
    }

    /// Surround text with `%` for a contains-style LIKE, unless the caller
    /// already placed wildcards.
    pub fn into_contains_pattern(self) -> SqlValue {
        match self {
            SqlValue::Text(s) if !s.contains('%') => SqlValue::Text(format!("%{}%", s)),
            other => other,
        }
    }

    pub fn range(low: impl Into<SqlValue>, high: impl Into<SqlValue>) -> SqlValue {
        SqlValue::Range(Box::new(low.into()), Box::new(high.into()))
    }

    pub fn list<I, V>(items: I) -> SqlValue
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        SqlValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Date(d) => write!(f, "'{}'", d),
            SqlValue::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            SqlValue::Uuid(u) => write!(f, "'{}'", u),
            SqlValue::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            SqlValue::Range(low, high) => write!(f, "{} AND {}", low, high),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    SqlValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}
