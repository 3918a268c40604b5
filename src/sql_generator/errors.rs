use thiserror::Error;

use super::operator::SqlOperator;

#[derive(Debug, Clone, Error)]
pub enum SqlGenError {
    #[error("Unsupported database type: '{0}' (supported: SqlServer, MySql, PostgreSql)")]
    UnsupportedDialect(String),
    #[error("Unsupported SQL operator: '{0}'")]
    UnsupportedOperator(String),
    #[error("{0} is not initialized (install it on the SqlContext before first use)")]
    NotInitialized(&'static str),
    #[error("Database configuration for '{0}' not found")]
    KeyNotFound(String),
    #[error("Invalid page specification: {0}")]
    InvalidPage(#[from] validator::ValidationErrors),
    #[error("Filter on column '{column}' with operator {operator:?} requires a value")]
    MissingFilterValue {
        column: String,
        operator: SqlOperator,
    },
    #[error("Model '{model}' has no columns left for the {purpose} projection")]
    EmptyProjection { model: String, purpose: &'static str },
    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),
    #[error("Unknown paging strategy: '{0}' (expected single_batch or separate_round_trips)")]
    UnknownPagingStrategy(String),
    #[error("Template has {found} statement(s), expected {expected}")]
    StatementCount { expected: usize, found: usize },
}

impl SqlGenError {
    /// Create an InvalidFilter error carrying the offending input
    pub fn invalid_filter(message: impl Into<String>, input: impl AsRef<str>) -> Self {
        SqlGenError::InvalidFilter(format!("{} (input: '{}')", message.into(), input.as_ref()))
    }
}
