//! Column projections
//!
//! A [`ColumnMapping`] is resolved once per model type from the model's
//! declared [`ColumnDef`] table and reused for the life of the process.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::sql_generator::dialect::DialectKind;
use crate::sql_generator::errors::SqlGenError;

use super::Model;

/// Declaration of one model property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub property: String,
    /// Column name when it differs from the property name
    pub column: Option<String>,
    /// Left out of every generated column list
    pub ignore: bool,
    /// Left out of INSERT only
    pub ignore_on_insert: bool,
}

impl ColumnDef {
    pub fn new(property: impl Into<String>) -> Self {
        ColumnDef {
            property: property.into(),
            column: None,
            ignore: false,
            ignore_on_insert: false,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn ignore_on_insert(mut self) -> Self {
        self.ignore_on_insert = true;
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.property)
    }
}

/// A property bound to its column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    pub property: String,
    pub column: String,
}

impl ProjectedColumn {
    fn from_def(def: &ColumnDef) -> Self {
        ProjectedColumn {
            property: def.property.clone(),
            column: def.column_name().to_string(),
        }
    }

    /// `column` or `column AS property` when the names diverge
    pub fn select_item(&self, dialect: DialectKind) -> String {
        if self.column == self.property {
            dialect.quote(&self.column)
        } else {
            format!(
                "{} AS {}",
                dialect.quote(&self.column),
                dialect.quote(&self.property)
            )
        }
    }
}

/// The select, insert and update projections of one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    model: String,
    /// Template signature identity: the type name for typed models, the
    /// full declaration for ad-hoc ones
    identity: String,
    key: ProjectedColumn,
    select: Vec<ProjectedColumn>,
    insert: Vec<ProjectedColumn>,
    update: Vec<ProjectedColumn>,
}

impl ColumnMapping {
    pub fn of<T: Model>() -> Self {
        let mut mapping = Self::from_defs(T::model_name(), T::key_column(), &T::columns());
        mapping.identity = std::any::type_name::<T>().to_string();
        mapping
    }

    /// Build a mapping from a declaration table.
    ///
    /// `key_column` names the primary key by property or by column,
    /// compared case-insensitively. A key not declared in `defs` is taken
    /// as both property and column name.
    pub fn from_defs(model: impl Into<String>, key_column: &str, defs: &[ColumnDef]) -> Self {
        let key = defs
            .iter()
            .find(|d| is_key(d, key_column))
            .map(ProjectedColumn::from_def)
            .unwrap_or_else(|| ProjectedColumn {
                property: key_column.to_string(),
                column: key_column.to_string(),
            });

        let visible: Vec<&ColumnDef> = defs.iter().filter(|d| !d.ignore).collect();
        let select = visible.iter().map(|d| ProjectedColumn::from_def(d)).collect();
        let insert = visible
            .iter()
            .filter(|d| !is_key(d, key_column) && !d.ignore_on_insert)
            .map(|d| ProjectedColumn::from_def(d))
            .collect();
        let update = visible
            .iter()
            .filter(|d| !is_key(d, key_column))
            .map(|d| ProjectedColumn::from_def(d))
            .collect();

        let model = model.into();
        ColumnMapping {
            identity: declaration_identity(&model, key_column, defs),
            model,
            key,
            select,
            insert,
            update,
        }
    }

    /// Mapping for an ad-hoc table whose property and column names agree
    pub fn from_columns<I, S>(model: impl Into<String>, key_column: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let defs: Vec<ColumnDef> = columns.into_iter().map(ColumnDef::new).collect();
        Self::from_defs(model, key_column, &defs)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn key(&self) -> &ProjectedColumn {
        &self.key
    }

    pub fn select(&self) -> &[ProjectedColumn] {
        &self.select
    }

    pub fn insert(&self) -> &[ProjectedColumn] {
        &self.insert
    }

    pub fn update(&self) -> &[ProjectedColumn] {
        &self.update
    }

    /// Comma-separated select list, `*` when nothing is declared
    pub fn select_list(&self, dialect: DialectKind) -> String {
        if self.select.is_empty() {
            return "*".to_string();
        }
        self.select
            .iter()
            .map(|c| c.select_item(dialect))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn require_insert(&self) -> Result<&[ProjectedColumn], SqlGenError> {
        non_empty(&self.insert, &self.model, "insert")
    }

    pub(crate) fn require_update(&self) -> Result<&[ProjectedColumn], SqlGenError> {
        non_empty(&self.update, &self.model, "update")
    }
}

/// `Name(key=Id;Id,Label->Title,Stamp[no-insert],Notes[ignored])`
fn declaration_identity(model: &str, key_column: &str, defs: &[ColumnDef]) -> String {
    let columns: Vec<String> = defs
        .iter()
        .map(|d| {
            let mut item = d.property.clone();
            if let Some(column) = &d.column {
                item.push_str("->");
                item.push_str(column);
            }
            if d.ignore {
                item.push_str("[ignored]");
            } else if d.ignore_on_insert {
                item.push_str("[no-insert]");
            }
            item
        })
        .collect();
    format!("{}(key={};{})", model, key_column, columns.join(","))
}

fn is_key(def: &ColumnDef, key_column: &str) -> bool {
    def.property.eq_ignore_ascii_case(key_column)
        || def.column_name().eq_ignore_ascii_case(key_column)
}

fn non_empty<'a>(
    columns: &'a [ProjectedColumn],
    model: &str,
    purpose: &'static str,
) -> Result<&'a [ProjectedColumn], SqlGenError> {
    if columns.is_empty() {
        return Err(SqlGenError::EmptyProjection {
            model: model.to_string(),
            purpose,
        });
    }
    Ok(columns)
}

/// Per-type memo of resolved [`ColumnMapping`]s
#[derive(Default)]
pub struct ProjectionCache {
    mappings: RwLock<HashMap<TypeId, Arc<ColumnMapping>>>,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the mapping of `T`, computing it on first use only
    pub fn resolve<T: Model>(&self) -> Arc<ColumnMapping> {
        let type_id = TypeId::of::<T>();
        {
            let mappings = self
                .mappings
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(mapping) = mappings.get(&type_id) {
                return Arc::clone(mapping);
            }
        }

        let mapping = Arc::new(ColumnMapping::of::<T>());
        log::debug!(
            "Resolved column mapping for {} ({} select, {} insert, {} update)",
            mapping.model(),
            mapping.select().len(),
            mapping.insert().len(),
            mapping.update().len()
        );

        let mut mappings = self
            .mappings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(mappings.entry(type_id).or_insert(mapping))
    }

    pub fn len(&self) -> usize {
        self.mappings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
