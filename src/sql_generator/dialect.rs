//! Per-dialect SQL syntax rules
//!
//! Everything that differs between the supported engines lives here:
//! identifier quoting, schema qualification, pagination of a SELECT,
//! generated-key readback after INSERT and the default paging strategy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SqlGenError;
use super::filter::PageSpec;

/// Target relational engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DialectKind {
    SqlServer,
    MySql,
    PostgreSql,
}

impl DialectKind {
    pub const ALL: [DialectKind; 3] = [
        DialectKind::SqlServer,
        DialectKind::MySql,
        DialectKind::PostgreSql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::SqlServer => "SqlServer",
            DialectKind::MySql => "MySql",
            DialectKind::PostgreSql => "PostgreSql",
        }
    }

    /// Quote a single identifier (table, column, procedure)
    ///
    /// - SqlServer: `[identifier]`
    /// - MySql: `` `identifier` ``
    /// - PostgreSql: `"identifier"`
    ///
    /// A closing quote character inside the identifier is doubled so the
    /// result always denotes exactly one identifier.
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            DialectKind::SqlServer => format!("[{}]", identifier.replace(']', "]]")),
            DialectKind::MySql => format!("`{}`", identifier.replace('`', "``")),
            DialectKind::PostgreSql => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }

    /// Quote a name and prefix it with the schema when the dialect has one.
    ///
    /// MySql has no schema concept here, so the schema is dropped.
    pub fn qualify(&self, name: &str, schema: Option<&str>) -> String {
        match (self, schema.filter(|s| !s.trim().is_empty())) {
            (DialectKind::MySql, _) | (_, None) => self.quote(name),
            (_, Some(schema)) => format!("{}.{}", self.quote(schema), self.quote(name)),
        }
    }

    /// Pagination clause for an already ordered SELECT
    ///
    /// `page_number` and `page_size` are 1-based and must be at least 1;
    /// the offset is `(page_number - 1) * page_size`.
    pub fn pagination_clause(&self, page_number: u32, page_size: u32) -> String {
        let offset = u64::from(page_number.saturating_sub(1)) * u64::from(page_size);
        match self {
            DialectKind::SqlServer => {
                format!("OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, page_size)
            }
            DialectKind::MySql | DialectKind::PostgreSql => {
                format!("LIMIT {} OFFSET {}", page_size, offset)
            }
        }
    }

    /// OFFSET/FETCH is only valid after ORDER BY on SqlServer
    pub fn requires_order_for_paging(&self) -> bool {
        matches!(self, DialectKind::SqlServer)
    }

    /// Column a paged SELECT is ordered by: the requested one, else the
    /// key column where the dialect cannot page unordered
    pub fn paging_order(&self, page: &PageSpec, key_column: &str) -> Option<String> {
        page.order_by.clone().or_else(|| {
            self.requires_order_for_paging()
                .then(|| key_column.to_string())
        })
    }

    /// Append ORDER BY and the pagination clause to an existing SELECT.
    ///
    /// Trailing `;` and whitespace are dropped first; the result carries
    /// no terminator.
    pub fn append_paging(
        &self,
        sql: &str,
        page: &PageSpec,
        key_column: &str,
    ) -> Result<String, SqlGenError> {
        page.checked()?;
        let mut paged = sql
            .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
            .to_string();
        if let Some(column) = self.paging_order(page, key_column) {
            paged.push_str(&format!(
                " ORDER BY {} {}",
                self.quote(&column),
                page.sort_direction
            ));
        }
        paged.push(' ');
        paged.push_str(&self.pagination_clause(page.page_number, page.page_size));
        Ok(paged)
    }

    /// Finish an INSERT statement so that it yields the generated key
    pub fn insert_with_key_readback(&self, insert_sql: &str, key_column: &str) -> String {
        match self {
            DialectKind::SqlServer => {
                format!("{}; SELECT CAST(SCOPE_IDENTITY() AS INT);", insert_sql)
            }
            DialectKind::MySql => format!("{}; SELECT LAST_INSERT_ID();", insert_sql),
            DialectKind::PostgreSql => {
                format!("{} RETURNING {};", insert_sql, self.quote(key_column))
            }
        }
    }

    /// How the count and page statements of a paged query are sent
    pub fn default_paging_strategy(&self) -> PagingStrategy {
        match self {
            DialectKind::SqlServer => PagingStrategy::SingleBatch,
            DialectKind::MySql | DialectKind::PostgreSql => PagingStrategy::SeparateRoundTrips,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = SqlGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(DialectKind::SqlServer),
            "mysql" => Ok(DialectKind::MySql),
            "postgresql" | "postgres" | "pgsql" => Ok(DialectKind::PostgreSql),
            _ => Err(SqlGenError::UnsupportedDialect(s.to_string())),
        }
    }
}

/// Transport of the COUNT + page statement pair
///
/// Not every driver accepts a multi-statement batch with bound
/// parameters, so the choice is per dialect and overridable in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStrategy {
    /// One multi-result round trip running both statements
    SingleBatch,
    /// COUNT first, then the page, each on its own command
    SeparateRoundTrips,
}

impl FromStr for PagingStrategy {
    type Err = SqlGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_batch" | "batch" => Ok(PagingStrategy::SingleBatch),
            "separate_round_trips" | "separate" => Ok(PagingStrategy::SeparateRoundTrips),
            _ => Err(SqlGenError::UnknownPagingStrategy(s.to_string())),
        }
    }
}
