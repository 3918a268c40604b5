//! sqlweave - dialect-aware SQL generation with template caching
//!
//! This crate turns typed filter lists, page windows and statically
//! declared model mappings into parameterized SQL for SQL Server, MySQL
//! and PostgreSQL:
//! - Identifier quoting and operator spelling per dialect
//! - Structural signatures that ignore literal values, so one template
//!   serves every call of the same shape
//! - Combined COUNT + page queries with positionally stable parameters
//! - A thin repository facade over a pluggable connection provider
//!
//! ```
//! use sqlweave::model::ColumnMapping;
//! use sqlweave::sql_generator::{
//!     DialectKind, FilterCriterion, PageSpec, SortDirection, SqlContext, SqlOperator, SqlValue,
//!     TemplateCache,
//! };
//!
//! let ctx = SqlContext::new(DialectKind::PostgreSql)
//!     .with_cache(TemplateCache::with_defaults().shared());
//! let mapping = ColumnMapping::from_columns("Category", "Id", ["Id", "Name"]);
//! let filters = vec![FilterCriterion::new("Name", SqlOperator::Like, "ab")];
//! let page = PageSpec::new(2, 10).order_by("Id", SortDirection::Asc);
//!
//! let query = ctx
//!     .assembler()
//!     .count_and_page_for(&mapping, "Category", &filters, &page)
//!     .unwrap();
//! assert_eq!(
//!     query.template.statement(0),
//!     Some("SELECT COUNT(1) FROM Category WHERE \"Name\" ILIKE @Name_0;")
//! );
//! assert_eq!(query.params.get("@Name_0"), Some(&SqlValue::from("%ab%")));
//! ```

pub mod config;
pub mod model;
pub mod repository;
pub mod sql_generator;

pub use model::{ColumnDef, Model, Row};
pub use repository::{PagedRequest, PagedResult, Repository, RepositoryError};
pub use sql_generator::{DialectKind, FilterCriterion, SqlContext, SqlGenError, SqlOperator, SqlValue};
