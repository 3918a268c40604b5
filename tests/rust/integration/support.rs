//! Shared fixtures: a sample model and an in-memory connection provider

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlweave::config::EngineConfig;
use sqlweave::model::{ColumnDef, Model, Row, RowError};
use sqlweave::repository::{
    CommandKind, Connection, ConnectionProvider, ConnectionTarget, DatabaseRegistry, ProviderError,
};
use sqlweave::sql_generator::{
    DialectKind, PagingStrategy, ParameterSet, SqlValue, TemplateCache,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl Model for Category {
    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("Id"),
            ColumnDef::new("Name").column("CategoryName"),
            ColumnDef::new("ParentId"),
        ]
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("Id", self.id.into()),
            ("Name", self.name.as_str().into()),
            ("ParentId", self.parent_id.map_or(SqlValue::Null, SqlValue::from)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Category {
            id: row.get("Id")?,
            name: row.get("Name")?,
            parent_id: row.get("ParentId")?,
        })
    }
}

pub fn category_row(id: i64, name: &str) -> Row {
    Row::new()
        .with("Id", id)
        .with("Name", name)
        .with("ParentId", SqlValue::Null)
}

/// Registry with `main` on SQL Server (schema `dbo`) and `reports` on PostgreSQL
pub fn registry() -> DatabaseRegistry {
    let mut registry = DatabaseRegistry::new(TemplateCache::with_defaults().shared());
    registry
        .register(
            "main",
            &EngineConfig {
                dialect: DialectKind::SqlServer,
                schema: Some("dbo".to_string()),
                ..Default::default()
            },
            "Server=localhost;Database=shop",
        )
        .register(
            "reports",
            &EngineConfig {
                dialect: DialectKind::PostgreSql,
                ..Default::default()
            },
            "host=localhost dbname=reports",
        );
    registry
}

/// Like [`registry`], with `main` forced to send paged queries in two commands
pub fn registry_with_main_paging(strategy: PagingStrategy) -> DatabaseRegistry {
    let mut registry = registry();
    registry.register(
        "main",
        &EngineConfig {
            dialect: DialectKind::SqlServer,
            schema: Some("dbo".to_string()),
            paging_strategy: Some(strategy),
            ..Default::default()
        },
        "Server=localhost;Database=shop",
    );
    registry
}

/// A command seen by a [`RecordingConnection`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub database: String,
    pub sql: String,
    pub params: ParameterSet,
    pub kind: CommandKind,
}

/// Canned results handed back by every connection
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub rows: Vec<Row>,
    pub scalar: Option<SqlValue>,
    pub affected: u64,
}

/// Opens a fresh in-memory connection per call and records every command
#[derive(Debug, Default)]
pub struct RecordingProvider {
    script: Script,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingProvider {
    pub fn new(script: Script) -> Self {
        RecordingProvider {
            script,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionProvider for RecordingProvider {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn Connection>, ProviderError> {
        Ok(Box::new(RecordingConnection {
            database: target.name.clone(),
            script: self.script.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub struct RecordingConnection {
    database: String,
    script: Script,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingConnection {
    fn record(&self, sql: &str, params: &ParameterSet, kind: CommandKind) {
        self.calls.lock().unwrap().push(RecordedCall {
            database: self.database.clone(),
            sql: sql.to_string(),
            params: params.clone(),
            kind,
        });
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<u64, ProviderError> {
        self.record(sql, params, kind);
        Ok(self.script.affected)
    }

    async fn query_scalar(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<Option<SqlValue>, ProviderError> {
        self.record(sql, params, kind);
        Ok(self.script.scalar.clone())
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<Vec<Row>, ProviderError> {
        self.record(sql, params, kind);
        Ok(self.script.rows.clone())
    }

    async fn query_multiple(
        &mut self,
        sql: &str,
        params: &ParameterSet,
        kind: CommandKind,
    ) -> Result<Vec<Vec<Row>>, ProviderError> {
        self.record(sql, params, kind);
        let count = Row::new().with("", self.script.scalar.clone().unwrap_or(SqlValue::Null));
        Ok(vec![vec![count], self.script.rows.clone()])
    }
}
