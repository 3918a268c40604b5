use chrono::NaiveDate;
use sqlweave::sql_generator::{significant_filters, FilterCriterion, SqlOperator, SqlValue};
use test_case::test_case;
use uuid::Uuid;

#[test_case(SqlValue::from(""), false ; "empty text")]
#[test_case(SqlValue::from("  "), false ; "blank text")]
#[test_case(SqlValue::from(0), false ; "zero")]
#[test_case(SqlValue::Date(NaiveDate::MIN), false ; "min date")]
#[test_case(SqlValue::Null, false ; "null")]
#[test_case(SqlValue::from("abc"), true ; "text")]
#[test_case(SqlValue::from(false), true ; "false")]
#[test_case(SqlValue::from(0.0), true ; "zero float")]
#[test_case(SqlValue::from(42u32), true ; "non zero")]
fn test_is_significant(value: SqlValue, expected: bool) {
    assert_eq!(value.is_significant(), expected);
}

#[test]
fn test_enum_like_values_pass_as_text() {
    #[derive(Debug)]
    enum Status {
        Active,
    }
    let value = SqlValue::from(format!("{:?}", Status::Active));
    assert!(value.is_significant());
}

#[test]
fn test_random_uuid_is_significant() {
    assert!(SqlValue::from(Uuid::new_v4()).is_significant());
}

#[test]
fn test_search_form_filters() {
    // A search form posts every field, filled in or not
    let posted = vec![
        FilterCriterion::new("Name", SqlOperator::Like, "ab"),
        FilterCriterion::new("Code", SqlOperator::Equal, ""),
        FilterCriterion::new("CategoryId", SqlOperator::Equal, 0),
        FilterCriterion::new("CreatedOn", SqlOperator::GreaterOrEqual, NaiveDate::MIN),
        FilterCriterion::new("IsActive", SqlOperator::Equal, false),
        FilterCriterion::is_not_null("ParentId"),
    ];
    let columns: Vec<String> = significant_filters(&posted)
        .into_iter()
        .map(|f| f.column)
        .collect();
    assert_eq!(columns, vec!["Name", "IsActive", "ParentId"]);
}
