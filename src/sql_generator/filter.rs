use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::errors::SqlGenError;
use super::operator::SqlOperator;
use super::value::SqlValue;

/// One column/operator/value triple of a WHERE clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub column: String,
    pub operator: SqlOperator,
    #[serde(default = "null_value")]
    pub value: SqlValue,
}

fn null_value() -> SqlValue {
    SqlValue::Null
}

impl FilterCriterion {
    pub fn new(column: impl Into<String>, operator: SqlOperator, value: impl Into<SqlValue>) -> Self {
        FilterCriterion {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, SqlOperator::IsNull, SqlValue::Null)
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::new(column, SqlOperator::IsNotNull, SqlValue::Null)
    }

    /// Whether this criterion should reach the query at all.
    ///
    /// Null-test operators carry no value and are always kept; every other
    /// operator needs a significant value.
    pub fn is_significant(&self) -> bool {
        !self.operator.takes_value() || self.value.is_significant()
    }

    /// Checks the value shape the assembler relies on
    pub(crate) fn check_value(&self) -> Result<(), SqlGenError> {
        if self.operator.takes_value() && self.value.is_null() {
            return Err(SqlGenError::MissingFilterValue {
                column: self.column.clone(),
                operator: self.operator,
            });
        }
        if self.operator == SqlOperator::Between && !matches!(self.value, SqlValue::Range(..)) {
            return Err(SqlGenError::invalid_filter(
                format!("BETWEEN on '{}' needs a low..high range", self.column),
                self.value.to_string(),
            ));
        }
        Ok(())
    }
}

/// Drop criteria whose value is an "unset" marker
pub fn significant_filters<'a, I>(filters: I) -> Vec<FilterCriterion>
where
    I: IntoIterator<Item = &'a FilterCriterion>,
{
    filters
        .into_iter()
        .filter(|f| {
            let keep = f.is_significant();
            if !keep {
                log::trace!("Dropping unset filter on column '{}'", f.column);
            }
            keep
        })
        .cloned()
        .collect()
}

/// Put criteria into the canonical (column, operator) order.
///
/// The sort is stable, so criteria sharing a column and operator keep the
/// caller's relative order.
pub(crate) fn canonical_order(filters: &[FilterCriterion]) -> Vec<&FilterCriterion> {
    let mut ordered: Vec<&FilterCriterion> = filters.iter().collect();
    ordered.sort_by(|a, b| {
        a.column
            .cmp(&b.column)
            .then_with(|| a.operator.cmp(&b.operator))
    });
    ordered
}

impl FromStr for FilterCriterion {
    type Err = SqlGenError;

    /// Parses `column:operator[:value]`, e.g. `Name:like:ab`, `Age:between:18..30`,
    /// `Status:in:1,2,3`, `DeletedAt:isnull`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let column = parts
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SqlGenError::invalid_filter("missing column", s))?;
        let operator: SqlOperator = parts
            .next()
            .ok_or_else(|| SqlGenError::invalid_filter("missing operator", s))?
            .parse()?;
        let raw_value = parts.next();

        if !operator.takes_value() {
            return Ok(FilterCriterion::new(column, operator, SqlValue::Null));
        }
        let raw_value =
            raw_value.ok_or_else(|| SqlGenError::invalid_filter("missing value", s))?;

        let value = match operator {
            SqlOperator::In | SqlOperator::NotIn => {
                SqlValue::List(raw_value.split(',').map(parse_scalar).collect())
            }
            SqlOperator::Between => {
                let (low, high) = raw_value
                    .split_once("..")
                    .ok_or_else(|| SqlGenError::invalid_filter("BETWEEN expects low..high", s))?;
                SqlValue::range(parse_scalar(low), parse_scalar(high))
            }
            _ => parse_scalar(raw_value),
        };
        Ok(FilterCriterion::new(column, operator, value))
    }
}

/// Best-effort typing of a textual literal: integer, float, bool, date, text
pub fn parse_scalar(raw: &str) -> SqlValue {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return SqlValue::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return SqlValue::Float(f);
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return SqlValue::Bool(true),
        "false" => return SqlValue::Bool(false),
        "null" => return SqlValue::Null,
        _ => {}
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return SqlValue::Date(d);
    }
    SqlValue::Text(raw.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = SqlGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ASC" | "ASCENDING" => Ok(SortDirection::Asc),
            "DESC" | "DESCENDING" => Ok(SortDirection::Desc),
            _ => Err(SqlGenError::invalid_filter("unknown sort direction", s)),
        }
    }
}

/// Page window and ordering of a paged query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Validate, Serialize, Deserialize)]
pub struct PageSpec {
    /// 1-based page number
    #[validate(range(min = 1, message = "Page number must be at least 1"))]
    pub page_number: u32,

    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    pub page_size: u32,

    pub order_by: Option<String>,

    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl Default for PageSpec {
    fn default() -> Self {
        PageSpec {
            page_number: 1,
            page_size: 10,
            order_by: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

impl PageSpec {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        PageSpec {
            page_number,
            page_size,
            ..Default::default()
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(column.into()).filter(|c: &String| !c.trim().is_empty());
        self.sort_direction = direction;
        self
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn checked(&self) -> Result<&Self, SqlGenError> {
        self.validate()?;
        Ok(self)
    }
}
