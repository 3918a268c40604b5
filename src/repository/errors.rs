use thiserror::Error;

use super::connection::ProviderError;
use crate::model::RowError;
use crate::sql_generator::SqlGenError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQL generation failed: {0}")]
    Generation(#[from] SqlGenError),

    #[error("Result mapping failed: {0}")]
    RowMapping(#[from] RowError),

    /// Driver failure, surfaced as-is
    #[error(transparent)]
    Execution(ProviderError),
}

impl RepositoryError {
    pub fn is_generation(&self) -> bool {
        matches!(self, RepositoryError::Generation(_))
    }
}
