//! Query assembly
//!
//! Every query kind follows the same two steps: look the template up by
//! its structural signature (building it on a miss), then bind a fresh
//! [`ParameterSet`] for this call. Only the first step touches the cache.
//!
//! Table names are used verbatim; callers that need schema qualification
//! pass the result of [`SqlContext::qualified_table`].

use std::sync::Arc;

use super::context::SqlContext;
use super::errors::SqlGenError;
use super::filter::{canonical_order, FilterCriterion, PageSpec};
use super::operator::SqlOperator;
use super::params::{ParameterSet, SqlTemplate};
use super::signature::{QueryKind, StructuralSignature};
use super::value::SqlValue;
use crate::model::{ColumnMapping, Model};

/// Placeholder of the IN-list query
pub const VALUES_PARAM: &str = "Values";

/// A template together with the values bound for one call
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub template: Arc<SqlTemplate>,
    pub params: ParameterSet,
}

impl PreparedQuery {
    pub fn sql(&self) -> &str {
        self.template.sql()
    }
}

pub struct QueryAssembler<'a> {
    ctx: &'a SqlContext,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(ctx: &'a SqlContext) -> Self {
        QueryAssembler { ctx }
    }

    fn signature(
        &self,
        kind: QueryKind,
        mapping: &ColumnMapping,
        table: &str,
    ) -> StructuralSignature {
        StructuralSignature::new(kind, table, self.ctx.dialect())
            .model(mapping.identity())
            .key_column(mapping.key().column.as_str())
    }

    fn template<F>(
        &self,
        signature: &StructuralSignature,
        mut build: F,
    ) -> Result<Arc<SqlTemplate>, SqlGenError>
    where
        F: FnMut() -> Result<SqlTemplate, SqlGenError>,
    {
        self.ctx.cache()?.get_or_try_insert_with(signature, &mut build)
    }

    fn mapping<T: Model>(&self) -> Arc<ColumnMapping> {
        self.ctx.projections().resolve::<T>()
    }

    // ------------------------------------------------------------------
    // Combined count + page
    // ------------------------------------------------------------------

    /// COUNT and paged SELECT sharing one WHERE clause.
    ///
    /// `filters` must already be significant; see
    /// [`significant_filters`](super::filter::significant_filters).
    pub fn count_and_page<T: Model>(
        &self,
        table: &str,
        filters: &[FilterCriterion],
        page: &PageSpec,
    ) -> Result<PreparedQuery, SqlGenError> {
        self.count_and_page_for(&self.mapping::<T>(), table, filters, page)
    }

    pub fn count_and_page_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        filters: &[FilterCriterion],
        page: &PageSpec,
    ) -> Result<PreparedQuery, SqlGenError> {
        page.checked()?;
        for filter in filters {
            filter.check_value()?;
        }

        let dialect = self.ctx.dialect();
        let key_column = mapping.key().column.as_str();
        let order_by = dialect.paging_order(page, key_column);

        let signature = self
            .signature(QueryKind::CountAndPage, mapping, table)
            .filters(filters)
            .page(page, order_by.as_deref());

        let ordered = canonical_order(filters);
        let template = self.template(&signature, || {
            let where_clause = where_clause(self.ctx, &ordered);
            let count = format!("SELECT COUNT(1) FROM {}{};", table, where_clause);

            let select = format!(
                "SELECT {} FROM {}{}",
                mapping.select_list(dialect),
                table,
                where_clause
            );
            let mut data = dialect.append_paging(&select, page, key_column)?;
            data.push(';');

            Ok(SqlTemplate::batch_of(vec![count, data]))
        })?;

        let mut params = ParameterSet::new();
        for (i, filter) in ordered.iter().enumerate() {
            bind_filter(&mut params, filter, i);
        }

        Ok(PreparedQuery { template, params })
    }

    // ------------------------------------------------------------------
    // Single-row and full-table reads
    // ------------------------------------------------------------------

    pub fn select_by_key<T: Model>(
        &self,
        table: &str,
        key: impl Into<SqlValue>,
    ) -> Result<PreparedQuery, SqlGenError> {
        self.select_by_key_for(&self.mapping::<T>(), table, key.into())
    }

    pub fn select_by_key_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        key: SqlValue,
    ) -> Result<PreparedQuery, SqlGenError> {
        let signature = self.signature(QueryKind::SelectByKey, mapping, table);
        let template = self.template(&signature, || {
            let dialect = self.ctx.dialect();
            Ok(SqlTemplate::single(format!(
                "SELECT {} FROM {} WHERE {};",
                mapping.select_list(dialect),
                table,
                key_predicate(self.ctx, mapping)
            )))
        })?;
        let params = ParameterSet::new().with(mapping.key().property.as_str(), key);
        Ok(PreparedQuery { template, params })
    }

    pub fn select_all<T: Model>(&self, table: &str) -> Result<PreparedQuery, SqlGenError> {
        self.select_all_for(&self.mapping::<T>(), table)
    }

    pub fn select_all_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
    ) -> Result<PreparedQuery, SqlGenError> {
        let signature = self.signature(QueryKind::SelectAll, mapping, table);
        let template = self.template(&signature, || {
            Ok(SqlTemplate::single(format!(
                "SELECT {} FROM {};",
                mapping.select_list(self.ctx.dialect()),
                table
            )))
        })?;
        Ok(PreparedQuery {
            template,
            params: ParameterSet::new(),
        })
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// INSERT that yields the generated key as a scalar
    pub fn insert<T: Model>(&self, table: &str, model: &T) -> Result<PreparedQuery, SqlGenError> {
        self.insert_for(&self.mapping::<T>(), table, &model.values())
    }

    pub fn insert_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        values: &[(&str, SqlValue)],
    ) -> Result<PreparedQuery, SqlGenError> {
        let columns = mapping.require_insert()?;
        let signature = self.signature(QueryKind::Insert, mapping, table);
        let template = self.template(&signature, || {
            let dialect = self.ctx.dialect();
            let names: Vec<String> = columns.iter().map(|c| dialect.quote(&c.column)).collect();
            let placeholders: Vec<String> =
                columns.iter().map(|c| format!("@{}", c.property)).collect();
            let insert = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                names.join(", "),
                placeholders.join(", ")
            );
            Ok(SqlTemplate::single(
                dialect.insert_with_key_readback(&insert, &mapping.key().column),
            ))
        })?;

        let mut params = ParameterSet::new();
        for column in columns {
            params.add(column.property.as_str(), property_value(values, &column.property));
        }
        Ok(PreparedQuery { template, params })
    }

    pub fn update<T: Model>(&self, table: &str, model: &T) -> Result<PreparedQuery, SqlGenError> {
        self.update_for(&self.mapping::<T>(), table, &model.values())
    }

    pub fn update_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        values: &[(&str, SqlValue)],
    ) -> Result<PreparedQuery, SqlGenError> {
        let columns = mapping.require_update()?;
        let signature = self.signature(QueryKind::Update, mapping, table);
        let template = self.template(&signature, || {
            let dialect = self.ctx.dialect();
            let assignments: Vec<String> = columns
                .iter()
                .map(|c| format!("{} = @{}", dialect.quote(&c.column), c.property))
                .collect();
            Ok(SqlTemplate::single(format!(
                "UPDATE {} SET {} WHERE {};",
                table,
                assignments.join(", "),
                key_predicate(self.ctx, mapping)
            )))
        })?;

        let mut params = ParameterSet::new();
        for column in columns {
            params.add(column.property.as_str(), property_value(values, &column.property));
        }
        let key = &mapping.key().property;
        params.add(key.as_str(), property_value(values, key));
        Ok(PreparedQuery { template, params })
    }

    pub fn delete<T: Model>(
        &self,
        table: &str,
        key: impl Into<SqlValue>,
    ) -> Result<PreparedQuery, SqlGenError> {
        self.delete_for(&self.mapping::<T>(), table, key.into())
    }

    pub fn delete_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        key: SqlValue,
    ) -> Result<PreparedQuery, SqlGenError> {
        // The statement text only depends on the key, not on the model
        let signature = StructuralSignature::new(QueryKind::Delete, table, self.ctx.dialect())
            .key_column(mapping.key().column.as_str());
        let template = self.template(&signature, || {
            Ok(SqlTemplate::single(format!(
                "DELETE FROM {} WHERE {};",
                table,
                key_predicate(self.ctx, mapping)
            )))
        })?;
        let params = ParameterSet::new().with(mapping.key().property.as_str(), key);
        Ok(PreparedQuery { template, params })
    }

    // ------------------------------------------------------------------
    // Filtered reads without paging
    // ------------------------------------------------------------------

    /// Equality filter on a fixed set of columns, bound as `@{column}`
    pub fn select_with_filters<T: Model>(
        &self,
        table: &str,
        filters: &[(&str, SqlValue)],
    ) -> Result<PreparedQuery, SqlGenError> {
        self.select_with_filters_for(&self.mapping::<T>(), table, filters)
    }

    pub fn select_with_filters_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        filters: &[(&str, SqlValue)],
    ) -> Result<PreparedQuery, SqlGenError> {
        let mut columns: Vec<&str> = filters.iter().map(|(c, _)| *c).collect();
        columns.sort_unstable();
        columns.dedup();

        let signature = self
            .signature(QueryKind::SelectWithFilters, mapping, table)
            .columns(columns.iter().copied(), SqlOperator::Equal);
        let template = self.template(&signature, || {
            let dialect = self.ctx.dialect();
            let mut sql = format!("SELECT {} FROM {}", mapping.select_list(dialect), table);
            if !columns.is_empty() {
                let predicates: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} = @{}", dialect.quote(c), c))
                    .collect();
                sql.push_str(" WHERE ");
                sql.push_str(&predicates.join(" AND "));
            }
            sql.push(';');
            Ok(SqlTemplate::single(sql))
        })?;

        let mut params = ParameterSet::new();
        for (column, value) in filters {
            params.add(*column, value.clone());
        }
        Ok(PreparedQuery { template, params })
    }

    /// Contains-style search of one term across several columns, OR-joined.
    ///
    /// Each column gets its own `@{column}_{i}` placeholder bound to the
    /// wildcard-wrapped term.
    pub fn search<T: Model>(
        &self,
        table: &str,
        columns: &[&str],
        term: impl Into<SqlValue>,
    ) -> Result<PreparedQuery, SqlGenError> {
        self.search_for(&self.mapping::<T>(), table, columns, term.into())
    }

    pub fn search_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        columns: &[&str],
        term: SqlValue,
    ) -> Result<PreparedQuery, SqlGenError> {
        let mut columns: Vec<&str> = columns.to_vec();
        columns.sort_unstable();
        columns.dedup();
        if columns.is_empty() {
            return Err(SqlGenError::invalid_filter("search needs at least one column", table));
        }

        let signature = self
            .signature(QueryKind::Search, mapping, table)
            .columns(columns.iter().copied(), SqlOperator::Like);
        let template = self.template(&signature, || {
            let dialect = self.ctx.dialect();
            let like = SqlOperator::Like.to_sql_token(dialect);
            let clauses: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{} {} @{}_{}", dialect.quote(c), like, c, i))
                .collect();
            Ok(SqlTemplate::single(format!(
                "SELECT {} FROM {} WHERE {};",
                mapping.select_list(dialect),
                table,
                clauses.join(" OR ")
            )))
        })?;

        let pattern = term.into_contains_pattern();
        let mut params = ParameterSet::new();
        for (i, column) in columns.iter().enumerate() {
            params.add(format!("{}_{}", column, i), pattern.clone());
        }
        Ok(PreparedQuery { template, params })
    }

    /// Rows whose `column` is one of `values`, bound as a single `@Values` list
    pub fn select_in<T, I, V>(
        &self,
        table: &str,
        column: &str,
        values: I,
    ) -> Result<PreparedQuery, SqlGenError>
    where
        T: Model,
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.select_in_for(&self.mapping::<T>(), table, column, SqlValue::list(values))
    }

    pub fn select_in_for(
        &self,
        mapping: &ColumnMapping,
        table: &str,
        column: &str,
        values: SqlValue,
    ) -> Result<PreparedQuery, SqlGenError> {
        let signature = self
            .signature(QueryKind::SelectIn, mapping, table)
            .columns([column], SqlOperator::In);
        let template = self.template(&signature, || {
            let dialect = self.ctx.dialect();
            Ok(SqlTemplate::single(format!(
                "SELECT {} FROM {} WHERE {} IN @{};",
                mapping.select_list(dialect),
                table,
                dialect.quote(column),
                VALUES_PARAM
            )))
        })?;
        let params = ParameterSet::new().with(VALUES_PARAM, as_list(values));
        Ok(PreparedQuery { template, params })
    }
}

fn key_predicate(ctx: &SqlContext, mapping: &ColumnMapping) -> String {
    let key = mapping.key();
    format!("{} = @{}", ctx.dialect().quote(&key.column), key.property)
}

fn property_value(values: &[(&str, SqlValue)], property: &str) -> SqlValue {
    values
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, v)| v.clone())
        .unwrap_or(SqlValue::Null)
}

fn as_list(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::List(_) => value,
        other => SqlValue::List(vec![other]),
    }
}

/// `" WHERE a AND b"`, or empty without filters
fn where_clause(ctx: &SqlContext, ordered: &[&FilterCriterion]) -> String {
    if ordered.is_empty() {
        return String::new();
    }
    let dialect = ctx.dialect();
    let predicates: Vec<String> = ordered
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let column = dialect.quote(&f.column);
            let token = f.operator.to_sql_token(dialect);
            let param = format!("{}_{}", f.column, i);
            match f.operator {
                SqlOperator::IsNull | SqlOperator::IsNotNull => format!("{} {}", column, token),
                SqlOperator::Between => {
                    format!("{} {} @{} AND @{}_end", column, token, param, param)
                }
                _ => format!("{} {} @{}", column, token, param),
            }
        })
        .collect();
    format!(" WHERE {}", predicates.join(" AND "))
}

/// Bind the value(s) of the filter at canonical position `i`
fn bind_filter(params: &mut ParameterSet, filter: &FilterCriterion, i: usize) {
    let name = format!("{}_{}", filter.column, i);
    match (filter.operator, &filter.value) {
        (SqlOperator::IsNull | SqlOperator::IsNotNull, _) => {}
        (SqlOperator::Between, SqlValue::Range(low, high)) => {
            let end = format!("{}_end", name);
            params.add(name, (**low).clone());
            params.add(end, (**high).clone());
        }
        (SqlOperator::Like | SqlOperator::NotLike, value) => {
            params.add(name, value.clone().into_contains_pattern());
        }
        (SqlOperator::In | SqlOperator::NotIn, value) => {
            params.add(name, as_list(value.clone()));
        }
        (_, value) => params.add(name, value.clone()),
    }
}
