//! Per-database generation context
//!
//! Everything that used to be process-wide state (dialect, schema, the
//! template cache handle) lives on a [`SqlContext`] value that is built
//! once at startup and handed to every call site. Several contexts can
//! share one cache, since signatures already carry the dialect.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::assembler::QueryAssembler;
use super::dialect::{DialectKind, PagingStrategy};
use super::errors::SqlGenError;
use super::template_cache::CacheProvider;
use crate::model::ProjectionCache;

pub struct SqlContext {
    dialect: DialectKind,
    schema: Option<String>,
    paging_strategy: PagingStrategy,
    projections: ProjectionCache,
    cache: OnceCell<Arc<dyn CacheProvider>>,
}

impl SqlContext {
    /// A context without a template cache; install one before generating SQL
    pub fn new(dialect: DialectKind) -> Self {
        SqlContext {
            dialect,
            schema: None,
            paging_strategy: dialect.default_paging_strategy(),
            projections: ProjectionCache::new(),
            cache: OnceCell::new(),
        }
    }

    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_paging_strategy(mut self, strategy: PagingStrategy) -> Self {
        self.paging_strategy = strategy;
        self
    }

    pub fn with_cache(self, cache: Arc<dyn CacheProvider>) -> Self {
        self.install_cache(cache);
        self
    }

    /// Wire the template cache. Only the first installation takes effect;
    /// returns whether this call installed it.
    pub fn install_cache(&self, cache: Arc<dyn CacheProvider>) -> bool {
        match self.cache.set(cache) {
            Ok(()) => true,
            Err(_) => {
                log::warn!(
                    "Template cache already installed for {} context, keeping the first one",
                    self.dialect
                );
                false
            }
        }
    }

    pub fn cache(&self) -> Result<&Arc<dyn CacheProvider>, SqlGenError> {
        self.cache
            .get()
            .ok_or(SqlGenError::NotInitialized("SQL template cache"))
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn paging_strategy(&self) -> PagingStrategy {
        self.paging_strategy
    }

    pub fn projections(&self) -> &ProjectionCache {
        &self.projections
    }

    /// Table name quoted and prefixed with the configured schema
    pub fn qualified_table(&self, table: &str) -> String {
        self.dialect.qualify(table, self.schema())
    }

    /// Stored procedure name quoted and prefixed with the configured schema
    pub fn qualified_procedure(&self, procedure: &str) -> String {
        self.dialect.qualify(procedure, self.schema())
    }

    pub fn assembler(&self) -> QueryAssembler<'_> {
        QueryAssembler::new(self)
    }
}

impl std::fmt::Debug for SqlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlContext")
            .field("dialect", &self.dialect)
            .field("schema", &self.schema)
            .field("paging_strategy", &self.paging_strategy)
            .field("cache_installed", &self.cache.initialized())
            .finish()
    }
}
