//! Named database routing
//!
//! Every registered database gets its own [`SqlContext`] (dialect, schema,
//! paging strategy). All contexts share one template cache; signatures
//! carry the dialect so their entries never collide.

use std::collections::HashMap;
use std::sync::Arc;

use super::connection::ConnectionTarget;
use crate::config::{DatabasesConfig, EngineConfig};
use crate::sql_generator::{CacheProvider, DialectKind, SqlContext, SqlGenError};

#[derive(Debug)]
pub struct DatabaseHandle {
    target: ConnectionTarget,
    context: Arc<SqlContext>,
}

impl DatabaseHandle {
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn context(&self) -> &SqlContext {
        &self.context
    }

    pub fn dialect(&self) -> DialectKind {
        self.target.dialect
    }
}

pub struct DatabaseRegistry {
    databases: HashMap<String, DatabaseHandle>,
    cache: Arc<dyn CacheProvider>,
}

impl DatabaseRegistry {
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        DatabaseRegistry {
            databases: HashMap::new(),
            cache,
        }
    }

    pub fn from_config(config: &DatabasesConfig, cache: Arc<dyn CacheProvider>) -> Self {
        let mut registry = Self::new(cache);
        for (name, database) in &config.databases {
            registry.register(
                name.as_str(),
                &EngineConfig::from_database(database),
                database.connection_string.as_str(),
            );
        }
        log::info!(
            "Loaded {} database configuration(s): {}",
            registry.len(),
            config.names().collect::<Vec<_>>().join(", ")
        );
        registry
    }

    /// Register (or replace) a database under `name`
    pub fn register(
        &mut self,
        name: impl Into<String>,
        engine: &EngineConfig,
        connection_string: impl Into<String>,
    ) -> &mut Self {
        let name = name.into();
        let context = engine.build_context().with_cache(Arc::clone(&self.cache));
        let handle = DatabaseHandle {
            target: ConnectionTarget {
                name: name.clone(),
                dialect: engine.dialect,
                connection_string: connection_string.into(),
            },
            context: Arc::new(context),
        };
        if self.databases.insert(name.clone(), handle).is_some() {
            log::warn!("Database '{}' registered twice, keeping the latest", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Result<&DatabaseHandle, SqlGenError> {
        self.databases
            .get(name)
            .ok_or_else(|| SqlGenError::KeyNotFound(name.to_string()))
    }

    pub fn dialect(&self, name: &str) -> Result<DialectKind, SqlGenError> {
        self.get(name).map(DatabaseHandle::dialect)
    }

    pub fn cache(&self) -> &Arc<dyn CacheProvider> {
        &self.cache
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}
