//! SQL template cache
//!
//! Memoizes generated SQL text by [`StructuralSignature`] so a query shape
//! is assembled once per process. Entries are never evicted: the number
//! of distinct signatures is bounded by the call sites in the program,
//! not by the data flowing through them.
//!
//! # Concurrency
//!
//! Readers take a shared lock. On a miss the template is built *outside*
//! any lock, then inserted with `entry().or_insert`, so concurrent callers
//! racing on the same new signature may each build it but all of them get
//! back the single stored entry.
//!
//! # Configuration
//!
//! Enabled unless `template_cache_enabled` is off in
//! [`EngineConfig`](crate::config::EngineConfig).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::errors::SqlGenError;
use super::params::SqlTemplate;
use super::signature::StructuralSignature;

/// Concurrent get-or-create store for templates
///
/// Implementations only have to guarantee that callers racing on one key
/// converge on one stored value; which builder wins is irrelevant because
/// building is a pure function of the key.
pub trait CacheProvider: Send + Sync {
    fn get(&self, key: &StructuralSignature) -> Option<Arc<SqlTemplate>>;

    fn get_or_try_insert_with(
        &self,
        key: &StructuralSignature,
        build: &mut dyn FnMut() -> Result<SqlTemplate, SqlGenError>,
    ) -> Result<Arc<SqlTemplate>, SqlGenError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration for the template cache
#[derive(Debug, Clone)]
pub struct TemplateCacheConfig {
    /// When disabled every call builds its template and nothing is stored
    pub enabled: bool,
}

impl Default for TemplateCacheConfig {
    fn default() -> Self {
        TemplateCacheConfig { enabled: true }
    }
}

/// In-process [`CacheProvider`] backed by a `RwLock<HashMap>`
pub struct TemplateCache {
    entries: RwLock<HashMap<StructuralSignature, Arc<SqlTemplate>>>,
    config: TemplateCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
}

impl TemplateCache {
    pub fn new(config: TemplateCacheConfig) -> Self {
        TemplateCache {
            entries: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TemplateCacheConfig::default())
    }

    pub fn shared(self) -> Arc<dyn CacheProvider> {
        Arc::new(self)
    }

    /// Drop every entry; templates are rebuilt on next use
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    fn lookup(&self, key: &StructuralSignature) -> Option<Arc<SqlTemplate>> {
        // Stored templates are immutable, so a poisoned map is still consistent
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned()
    }
}

impl CacheProvider for TemplateCache {
    fn get(&self, key: &StructuralSignature) -> Option<Arc<SqlTemplate>> {
        if !self.config.enabled {
            return None;
        }
        let found = self.lookup(key);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn get_or_try_insert_with(
        &self,
        key: &StructuralSignature,
        build: &mut dyn FnMut() -> Result<SqlTemplate, SqlGenError>,
    ) -> Result<Arc<SqlTemplate>, SqlGenError> {
        if let Some(template) = self.get(key) {
            return Ok(template);
        }

        self.builds.fetch_add(1, Ordering::Relaxed);
        let built = Arc::new(build()?);
        if !self.config.enabled {
            return Ok(built);
        }

        log::debug!(
            "Template cache miss: built {} [{}]",
            key.kind().as_str(),
            key.fingerprint()
        );
        log::trace!("Template [{}]: {}", key.fingerprint(), built.sql());

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have stored the same signature in the meantime
        let stored = entries.entry(key.clone()).or_insert(built);
        Ok(Arc::clone(stored))
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    /// Template builds, including redundant concurrent ones
    pub builds: u64,
    pub size: usize,
}

impl CacheMetrics {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
