use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlweave::model::{ColumnDef, ColumnMapping, Model, Row, RowError};
use sqlweave::sql_generator::{
    DialectKind, FilterCriterion, PageSpec, SortDirection, SqlContext, SqlGenError, SqlOperator,
    SqlValue, TemplateCache,
};

struct Product {
    id: i64,
    name: String,
    price: f64,
    created_at: NaiveDateTime,
}

impl Model for Product {
    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("Id"),
            ColumnDef::new("Name").column("ProductName"),
            ColumnDef::new("Price"),
            ColumnDef::new("CreatedAt").ignore_on_insert(),
            ColumnDef::new("Notes").ignore(),
        ]
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("Id", self.id.into()),
            ("Name", self.name.as_str().into()),
            ("Price", self.price.into()),
            ("CreatedAt", self.created_at.into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Product {
            id: row.get("Id")?,
            name: row.get("Name")?,
            price: row.get("Price")?,
            created_at: row.get("CreatedAt")?,
        })
    }
}

fn product() -> Product {
    let created_at = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    Product {
        id: 12,
        name: "Lamp".to_string(),
        price: 19.5,
        created_at,
    }
}

fn context_with_cache(dialect: DialectKind) -> (SqlContext, Arc<TemplateCache>) {
    let cache = Arc::new(TemplateCache::with_defaults());
    let ctx = SqlContext::new(dialect).with_cache(cache.clone());
    (ctx, cache)
}

#[test]
fn test_category_page_on_postgres() {
    let (ctx, _) = context_with_cache(DialectKind::PostgreSql);
    let mapping = ColumnMapping::from_columns("Category", "Id", ["Id", "Name"]);
    let filters = vec![FilterCriterion::new("Name", SqlOperator::Like, "ab")];
    let page = PageSpec::new(2, 10).order_by("Id", SortDirection::Asc);

    let query = ctx
        .assembler()
        .count_and_page_for(&mapping, "Category", &filters, &page)
        .unwrap();

    assert_eq!(query.template.statements().len(), 2);
    assert_eq!(
        query.template.statement(0),
        Some("SELECT COUNT(1) FROM Category WHERE \"Name\" ILIKE @Name_0;")
    );
    assert_eq!(
        query.template.statement(1),
        Some(
            "SELECT \"Id\", \"Name\" FROM Category WHERE \"Name\" ILIKE @Name_0 \
             ORDER BY \"Id\" ASC LIMIT 10 OFFSET 10;"
        )
    );
    assert_eq!(query.params.len(), 1);
    assert_eq!(query.params.get("Name_0"), Some(&SqlValue::from("%ab%")));
}

#[test]
fn test_permuted_filters_share_one_template() {
    let (ctx, cache) = context_with_cache(DialectKind::SqlServer);
    let mapping = ColumnMapping::from_columns("Product", "Id", ["Id", "Name", "Price", "Status"]);
    let page = PageSpec::new(1, 20);

    let first = vec![
        FilterCriterion::new("Status", SqlOperator::In, SqlValue::list([1, 2])),
        FilterCriterion::new("Name", SqlOperator::Like, "lamp"),
        FilterCriterion::new("Price", SqlOperator::Between, SqlValue::range(5, 10)),
    ];
    let second = vec![
        FilterCriterion::new("Price", SqlOperator::Between, SqlValue::range(20, 30)),
        FilterCriterion::new("Status", SqlOperator::In, 3),
        FilterCriterion::new("Name", SqlOperator::Like, "%desk"),
    ];

    let asm = ctx.assembler();
    let a = asm
        .count_and_page_for(&mapping, "Product", &first, &page)
        .unwrap();
    let b = asm
        .count_and_page_for(&mapping, "Product", &second, &page)
        .unwrap();

    assert!(Arc::ptr_eq(&a.template, &b.template));
    assert_eq!(cache.metrics().size, 1);
    assert_eq!(
        a.template.statement(0),
        Some(
            "SELECT COUNT(1) FROM Product WHERE [Name] LIKE @Name_0 \
             AND [Price] BETWEEN @Price_1 AND @Price_1_end AND [Status] IN @Status_2;"
        )
    );

    assert_eq!(a.params.get("Name_0"), Some(&SqlValue::from("%lamp%")));
    assert_eq!(a.params.get("Price_1"), Some(&SqlValue::Int(5)));
    assert_eq!(a.params.get("Price_1_end"), Some(&SqlValue::Int(10)));
    assert_eq!(a.params.get("Status_2"), Some(&SqlValue::list([1, 2])));

    assert_eq!(b.params.get("Name_0"), Some(&SqlValue::from("%desk")));
    assert_eq!(b.params.get("Price_1"), Some(&SqlValue::Int(20)));
    assert_eq!(b.params.get("Price_1_end"), Some(&SqlValue::Int(30)));
    assert_eq!(b.params.get("Status_2"), Some(&SqlValue::list([3])));
}

#[test]
fn test_every_placeholder_is_bound() {
    let (ctx, _) = context_with_cache(DialectKind::MySql);
    let mapping = ColumnMapping::from_columns("Product", "Id", ["Id", "Name"]);
    let filters = vec![
        FilterCriterion::new("Name", SqlOperator::NotLike, "x"),
        FilterCriterion::is_null("DeletedAt"),
        FilterCriterion::new("Price", SqlOperator::GreaterOrEqual, 3.5),
        FilterCriterion::new("Price", SqlOperator::LessThan, 9.0),
    ];
    let query = ctx
        .assembler()
        .count_and_page_for(&mapping, "Product", &filters, &PageSpec::new(1, 5))
        .unwrap();

    let placeholders = query.template.placeholders();
    assert!(!placeholders.is_empty());
    for name in &placeholders {
        assert!(query.params.get(name).is_some(), "unbound placeholder {}", name);
    }
    assert_eq!(placeholders.len(), query.params.len());
}

#[test]
fn test_repeated_build_is_identical_and_cached() {
    let (ctx, cache) = context_with_cache(DialectKind::PostgreSql);
    let mapping = ColumnMapping::from_columns("Category", "Id", ["Id", "Name"]);
    let filters = vec![FilterCriterion::new("Name", SqlOperator::Equal, "Books")];
    let page = PageSpec::new(1, 10).order_by("Name", SortDirection::Desc);

    let first = ctx
        .assembler()
        .count_and_page_for(&mapping, "Category", &filters, &page)
        .unwrap();
    let second = ctx
        .assembler()
        .count_and_page_for(&mapping, "Category", &filters, &page)
        .unwrap();

    assert_eq!(first.sql(), second.sql());
    assert_eq!(first.params, second.params);

    let metrics = cache.metrics();
    assert_eq!(metrics.builds, 1);
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.size, 1);
}

#[test]
fn test_page_window_is_part_of_the_template() {
    let (ctx, cache) = context_with_cache(DialectKind::SqlServer);
    let mapping = ColumnMapping::from_columns("Category", "Id", ["Id"]);
    let asm = ctx.assembler();

    let p1 = asm
        .count_and_page_for(&mapping, "Category", &[], &PageSpec::new(1, 10))
        .unwrap();
    let p2 = asm
        .count_and_page_for(&mapping, "Category", &[], &PageSpec::new(2, 10))
        .unwrap();

    assert!(p1.sql().ends_with("OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY;"));
    assert!(p2.sql().ends_with("OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY;"));
    assert_eq!(cache.metrics().size, 2);
}

#[test]
fn test_invalid_page_is_rejected_before_building() {
    let (ctx, cache) = context_with_cache(DialectKind::MySql);
    let mapping = ColumnMapping::from_columns("Category", "Id", ["Id"]);

    for page in [PageSpec::new(0, 10), PageSpec::new(1, 0)] {
        let err = ctx
            .assembler()
            .count_and_page_for(&mapping, "Category", &[], &page)
            .unwrap_err();
        assert!(matches!(err, SqlGenError::InvalidPage(_)));
    }
    assert_eq!(cache.metrics().builds, 0);
}

#[test]
fn test_typed_model_projection() {
    let (ctx, _) = context_with_cache(DialectKind::SqlServer);
    let asm = ctx.assembler();

    let by_key = asm.select_by_key::<Product>("Product", 12).unwrap();
    assert_eq!(
        by_key.sql(),
        "SELECT [Id], [ProductName] AS [Name], [Price], [CreatedAt] FROM Product WHERE [Id] = @Id;"
    );
    assert_eq!(by_key.params.get("@Id"), Some(&SqlValue::Int(12)));

    let insert = asm.insert("Product", &product()).unwrap();
    assert_eq!(
        insert.sql(),
        "INSERT INTO Product ([ProductName], [Price]) VALUES (@Name, @Price); \
         SELECT CAST(SCOPE_IDENTITY() AS INT);"
    );
    assert_eq!(insert.params.len(), 2);
    assert_eq!(insert.params.get("Price"), Some(&SqlValue::Float(19.5)));

    let update = asm.update("Product", &product()).unwrap();
    assert_eq!(
        update.sql(),
        "UPDATE Product SET [ProductName] = @Name, [Price] = @Price, [CreatedAt] = @CreatedAt \
         WHERE [Id] = @Id;"
    );
    assert_eq!(update.params.get("Id"), Some(&SqlValue::Int(12)));
    assert_eq!(update.params.get("Name"), Some(&SqlValue::from("Lamp")));
}

#[test]
fn test_model_mapping_is_resolved_once() {
    let (ctx, _) = context_with_cache(DialectKind::PostgreSql);
    let asm = ctx.assembler();

    asm.select_all::<Product>("Product").unwrap();
    asm.delete::<Product>("Product", 12).unwrap();
    asm.search::<Product>("Product", &["ProductName"], "la").unwrap();

    assert_eq!(ctx.projections().len(), 1);
}

#[test]
fn test_search_uses_dialect_like() {
    let (ctx, _) = context_with_cache(DialectKind::PostgreSql);
    let query = ctx
        .assembler()
        .search::<Product>("Product", &["ProductName", "Notes", "ProductName"], "la")
        .unwrap();
    assert_eq!(
        query.sql(),
        "SELECT \"Id\", \"ProductName\" AS \"Name\", \"Price\", \"CreatedAt\" FROM Product \
         WHERE \"Notes\" ILIKE @Notes_0 OR \"ProductName\" ILIKE @ProductName_1;"
    );
    assert_eq!(query.params.len(), 2);
    assert_eq!(query.params.get("ProductName_1"), Some(&SqlValue::from("%la%")));

    let err = ctx
        .assembler()
        .search::<Product>("Product", &[], "la")
        .unwrap_err();
    assert!(matches!(err, SqlGenError::InvalidFilter(_)));
}

#[test]
fn test_schema_qualified_table() {
    let ctx = SqlContext::new(DialectKind::SqlServer)
        .with_schema(Some("sales".to_string()))
        .with_cache(TemplateCache::with_defaults().shared());
    let table = ctx.qualified_table("Product");
    let query = ctx.assembler().select_all::<Product>(&table).unwrap();
    assert!(query.sql().ends_with("FROM [sales].[Product];"));
}

#[test]
fn test_same_named_mappings_keep_their_own_templates() {
    let (ctx, cache) = context_with_cache(DialectKind::MySql);
    let asm = ctx.assembler();
    let narrow = ColumnMapping::from_columns("Category", "Id", ["Id", "Name"]);
    let wide = ColumnMapping::from_columns("Category", "Id", ["Id", "Name", "ParentId"]);

    assert_eq!(
        asm.select_all_for(&narrow, "Category").unwrap().sql(),
        "SELECT `Id`, `Name` FROM Category;"
    );
    assert_eq!(
        asm.select_all_for(&wide, "Category").unwrap().sql(),
        "SELECT `Id`, `Name`, `ParentId` FROM Category;"
    );

    let wide_insert = asm
        .insert_for(&wide, "Category", &[("Name", "Toys".into()), ("ParentId", 3i64.into())])
        .unwrap();
    let narrow_insert = asm
        .insert_for(&narrow, "Category", &[("Name", "Toys".into())])
        .unwrap();
    assert_eq!(
        wide_insert.sql(),
        "INSERT INTO Category (`Name`, `ParentId`) VALUES (@Name, @ParentId); SELECT LAST_INSERT_ID();"
    );
    assert_eq!(
        narrow_insert.sql(),
        "INSERT INTO Category (`Name`) VALUES (@Name); SELECT LAST_INSERT_ID();"
    );
    for query in [&wide_insert, &narrow_insert] {
        assert_eq!(query.template.placeholders().len(), query.params.len());
    }
    assert_eq!(cache.metrics().size, 4);
}
