use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::sql_generator::{DialectKind, PagingStrategy, SqlContext, TemplateCacheConfig};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid database configuration '{name}': {reason}")]
    Database { name: String, reason: String },
}

/// Generation settings of one target database
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct EngineConfig {
    pub dialect: DialectKind,

    /// Schema prefixed to table and procedure names (ignored for MySql)
    #[validate(length(min = 1, message = "Schema cannot be empty when set"))]
    pub schema: Option<String>,

    pub template_cache_enabled: bool,

    /// Overrides the dialect's default transport for paged queries
    pub paging_strategy: Option<PagingStrategy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::SqlServer,
            schema: None,
            template_cache_enabled: true,
            paging_strategy: None,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            dialect: parse_env_var("SQLWEAVE_DB_TYPE", "SqlServer")?,
            schema: env::var("SQLWEAVE_SCHEMA")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            template_cache_enabled: parse_env_var("SQLWEAVE_TEMPLATE_CACHE_ENABLED", "true")?,
            paging_strategy: parse_optional_env_var("SQLWEAVE_PAGING_STRATEGY")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides on top of this configuration
    pub fn with_cli(mut self, cli: CliConfig) -> Result<Self, ConfigError> {
        if let Some(dialect) = cli.dialect {
            self.dialect = parse_value("dialect", dialect)?;
        }
        if let Some(schema) = cli.schema {
            self.schema = Some(schema);
        }
        if let Some(strategy) = cli.paging_strategy {
            self.paging_strategy = Some(parse_value("paging_strategy", strategy)?);
        }
        if cli.no_template_cache {
            self.template_cache_enabled = false;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn from_database(database: &DatabaseConfig) -> Self {
        Self {
            dialect: database.db_type,
            schema: database.schema.clone(),
            template_cache_enabled: true,
            paging_strategy: database.paging_strategy,
        }
    }

    pub fn effective_paging_strategy(&self) -> PagingStrategy {
        self.paging_strategy
            .unwrap_or_else(|| self.dialect.default_paging_strategy())
    }

    pub fn template_cache_config(&self) -> TemplateCacheConfig {
        TemplateCacheConfig {
            enabled: self.template_cache_enabled,
        }
    }

    /// A context for this configuration, without a cache installed
    pub fn build_context(&self) -> SqlContext {
        SqlContext::new(self.dialect)
            .with_schema(self.schema.clone())
            .with_paging_strategy(self.effective_paging_strategy())
    }
}

/// One entry of the `databases` routing table
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(deserialize_with = "dialect_from_name")]
    pub db_type: DialectKind,

    #[serde(default)]
    #[validate(length(min = 1, message = "Schema cannot be empty when set"))]
    pub schema: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub connection_string: String,

    #[serde(default)]
    pub paging_strategy: Option<PagingStrategy>,
}

/// Named databases, loaded from YAML:
///
/// ```yaml
/// databases:
///   main:
///     db_type: SqlServer
///     schema: dbo
///     connection_string: "Server=.;Database=Shop"
///   reporting:
///     db_type: postgres
///     connection_string: "host=localhost dbname=reports"
///     paging_strategy: single_batch
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabasesConfig {
    pub databases: BTreeMap<String, DatabaseConfig>,
}

impl DatabasesConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content.to_string(),
            source: Box::new(e),
        })?;

        config.validate_all()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn validate_all(&self) -> Result<(), ConfigError> {
        for (name, database) in &self.databases {
            if name.trim().is_empty() {
                return Err(ConfigError::Database {
                    name: name.clone(),
                    reason: "database name cannot be empty".to_string(),
                });
            }
            database.validate().map_err(|e| ConfigError::Database {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseConfig> {
        self.databases.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub dialect: Option<String>,
    pub schema: Option<String>,
    pub paging_strategy: Option<String>,
    pub no_template_cache: bool,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Connection string cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

fn dialect_from_name<'de, D>(deserializer: D) -> Result<DialectKind, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

fn parse_value<T: std::str::FromStr>(field: &str, value: String) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| ConfigError::Parse {
        field: field.to_string(),
        value,
        source: Box::new(e),
    })
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, value)
}

fn parse_optional_env_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => parse_value(key, value).map(Some),
        _ => Ok(None),
    }
}
