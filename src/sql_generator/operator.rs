use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dialect::DialectKind;
use super::errors::SqlGenError;

/// Abstract filter operator, spelled per dialect by [`SqlOperator::to_sql_token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SqlOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

impl SqlOperator {
    /// SQL token for this operator in the given dialect.
    ///
    /// PostgreSql spells LIKE as ILIKE so text search stays case-insensitive
    /// like it is under the default collations of the other engines.
    pub fn to_sql_token(&self, dialect: DialectKind) -> &'static str {
        match self {
            SqlOperator::Equal => "=",
            SqlOperator::NotEqual => "<>",
            SqlOperator::GreaterThan => ">",
            SqlOperator::GreaterOrEqual => ">=",
            SqlOperator::LessThan => "<",
            SqlOperator::LessOrEqual => "<=",
            SqlOperator::Like => match dialect {
                DialectKind::PostgreSql => "ILIKE",
                DialectKind::SqlServer | DialectKind::MySql => "LIKE",
            },
            SqlOperator::NotLike => match dialect {
                DialectKind::PostgreSql => "NOT ILIKE",
                DialectKind::SqlServer | DialectKind::MySql => "NOT LIKE",
            },
            SqlOperator::In => "IN",
            SqlOperator::NotIn => "NOT IN",
            SqlOperator::Between => "BETWEEN",
            SqlOperator::IsNull => "IS NULL",
            SqlOperator::IsNotNull => "IS NOT NULL",
        }
    }

    /// IS NULL / IS NOT NULL take no right-hand operand
    pub fn takes_value(&self) -> bool {
        !matches!(self, SqlOperator::IsNull | SqlOperator::IsNotNull)
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, SqlOperator::Like | SqlOperator::NotLike)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlOperator::Equal => "Equal",
            SqlOperator::NotEqual => "NotEqual",
            SqlOperator::GreaterThan => "GreaterThan",
            SqlOperator::GreaterOrEqual => "GreaterOrEqual",
            SqlOperator::LessThan => "LessThan",
            SqlOperator::LessOrEqual => "LessOrEqual",
            SqlOperator::Like => "Like",
            SqlOperator::NotLike => "NotLike",
            SqlOperator::In => "In",
            SqlOperator::NotIn => "NotIn",
            SqlOperator::Between => "Between",
            SqlOperator::IsNull => "IsNull",
            SqlOperator::IsNotNull => "IsNotNull",
        }
    }
}

impl fmt::Display for SqlOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlOperator {
    type Err = SqlGenError;

    /// Accepts operator names (`GreaterOrEqual`, `not_like`), short forms
    /// (`gte`, `nin`) and symbols (`>=`, `<>`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "");
        let op = match normalized.as_str() {
            "equal" | "eq" | "=" | "==" => SqlOperator::Equal,
            "notequal" | "ne" | "neq" | "<>" | "!=" => SqlOperator::NotEqual,
            "greaterthan" | "gt" | ">" => SqlOperator::GreaterThan,
            "greaterorequal" | "greaterthanorequal" | "gte" | "ge" | ">=" => {
                SqlOperator::GreaterOrEqual
            }
            "lessthan" | "lt" | "<" => SqlOperator::LessThan,
            "lessorequal" | "lessthanorequal" | "lte" | "le" | "<=" => SqlOperator::LessOrEqual,
            "like" | "~" => SqlOperator::Like,
            "notlike" | "!~" => SqlOperator::NotLike,
            "in" => SqlOperator::In,
            "notin" | "nin" => SqlOperator::NotIn,
            "between" => SqlOperator::Between,
            "isnull" | "null" => SqlOperator::IsNull,
            "isnotnull" | "notnull" => SqlOperator::IsNotNull,
            _ => return Err(SqlGenError::UnsupportedOperator(s.to_string())),
        };
        Ok(op)
    }
}
