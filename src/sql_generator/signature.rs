//! Structural cache keys for generated SQL
//!
//! A signature captures the *shape* of a query: which statement kind,
//! which model projection, table, dialect, the sorted (column, operator)
//! pairs, ordering and page window. Literal filter values are never part
//! of it, so every call differing only in values shares one template.

use std::fmt;

use sha2::{Digest, Sha256};

use super::dialect::DialectKind;
use super::filter::{canonical_order, FilterCriterion, PageSpec, SortDirection};
use super::operator::SqlOperator;

/// Statement family a template belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    Insert,
    Update,
    Delete,
    SelectByKey,
    SelectAll,
    SelectWithFilters,
    Search,
    SelectIn,
    CountAndPage,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Insert => "Insert",
            QueryKind::Update => "Update",
            QueryKind::Delete => "Delete",
            QueryKind::SelectByKey => "SelectByKey",
            QueryKind::SelectAll => "SelectAll",
            QueryKind::SelectWithFilters => "SelectWithFilters",
            QueryKind::Search => "Search",
            QueryKind::SelectIn => "SelectIn",
            QueryKind::CountAndPage => "CountAndPage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageShape {
    order_by: Option<String>,
    direction: SortDirection,
    page_size: u32,
    page_number: u32,
}

/// Key under which a generated template is cached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralSignature {
    kind: QueryKind,
    model: Option<String>,
    table: String,
    dialect: DialectKind,
    key_column: Option<String>,
    /// Always kept sorted
    filters: Vec<(String, SqlOperator)>,
    page: Option<PageShape>,
}

impl StructuralSignature {
    pub fn new(kind: QueryKind, table: impl Into<String>, dialect: DialectKind) -> Self {
        StructuralSignature {
            kind,
            model: None,
            table: table.into(),
            dialect,
            key_column: None,
            filters: Vec::new(),
            page: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn key_column(mut self, key_column: impl Into<String>) -> Self {
        self.key_column = Some(key_column.into());
        self
    }

    /// Record the (column, operator) multiset of a filter list
    pub fn filters(mut self, filters: &[FilterCriterion]) -> Self {
        self.filters = canonical_order(filters)
            .into_iter()
            .map(|f| (f.column.clone(), f.operator))
            .collect();
        self
    }

    /// Record bare column names, e.g. for equality filters or search columns
    pub fn columns<I, S>(mut self, columns: I, operator: SqlOperator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pairs: Vec<(String, SqlOperator)> =
            columns.into_iter().map(|c| (c.into(), operator)).collect();
        pairs.sort();
        self.filters = pairs;
        self
    }

    pub fn page(mut self, page: &PageSpec, effective_order_by: Option<&str>) -> Self {
        self.page = Some(PageShape {
            order_by: effective_order_by.map(str::to_string),
            direction: page.sort_direction,
            page_size: page.page_size,
            page_number: page.page_number,
        });
        self
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Short stable digest of the signature, used in logs and metrics
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_string().as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for StructuralSignature {
    /// Canonical text form, e.g.
    /// `CountAndPage:app::Category:Category:PostgreSql:-:Name~Like:Id:ASC:10:2`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.kind.as_str(),
            self.model.as_deref().unwrap_or("-"),
            self.table,
            self.dialect,
            self.key_column.as_deref().unwrap_or("-"),
        )?;
        let filters: Vec<String> = self
            .filters
            .iter()
            .map(|(column, op)| format!("{}~{}", column, op))
            .collect();
        write!(f, ":{}", filters.join(","))?;
        if let Some(page) = &self.page {
            write!(
                f,
                ":{}:{}:{}:{}",
                page.order_by.as_deref().unwrap_or("-"),
                page.direction,
                page.page_size,
                page.page_number
            )?;
        }
        Ok(())
    }
}
