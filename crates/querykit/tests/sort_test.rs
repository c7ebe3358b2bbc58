#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Sort fragment tests.
//!
//! Orderings are executed against an in-memory SQLite database so NULL
//! placement and tie-breaking are checked on real rows, not just on SQL text.

use querykit::{
    ColumnMap, FragmentConfig, NullsOrder, NullsPolicy, QueryError, SortBuilder, SortSpec,
    apply_order, sort_columns,
};
use querykit_test_utils::{assert, fetch_names, init_tracing, render, seed, test_db, test_item};
use sea_query::{Alias, Query, SelectStatement};
use sqlx::SqlitePool;

fn columns() -> ColumnMap {
    ColumnMap::new()
        .column("id", Alias::new("id"))
        .column("name", Alias::new("name"))
        .column("age", Alias::new("age"))
}

fn names_query() -> SelectStatement {
    let mut query = Query::select();
    query.column(Alias::new("name")).from(Alias::new("items"));
    query
}

async fn seeded_db() -> SqlitePool {
    init_tracing();
    let pool = test_db().await;
    seed(
        &pool,
        &[
            test_item(1, "Apple").with_age(30),
            test_item(2, "banana"),
            test_item(3, "Cherry").with_age(20),
            test_item(4, "date").with_age(30),
        ],
    )
    .await;
    pool
}

// ---------------------------------------------------------------------------
// SQL shape
// ---------------------------------------------------------------------------

#[test]
fn test_order_by_renders_in_spec_order() {
    let map = columns();
    let mut query = names_query();
    let fragments = sort_columns(&map, &[SortSpec::desc("name"), SortSpec::asc("age")]).unwrap();
    apply_order(&mut query, &fragments);

    let sql = render(&query);
    assert::contains(&sql, r#"ORDER BY "name" DESC NULLS LAST, "age" ASC NULLS FIRST"#);
}

#[test]
fn test_database_policy_omits_nulls_clause() {
    let map = columns();
    let mut query = names_query();
    SortBuilder::new(&map)
        .nulls_policy(NullsPolicy::Database)
        .apply(&mut query, &[SortSpec::asc("age")])
        .unwrap();

    let sql = render(&query);
    assert::contains(&sql, r#"ORDER BY "age" ASC"#);
    assert::not_contains(&sql, "NULLS");
}

#[test]
fn test_unknown_field_leaves_statement_untouched() {
    let map = columns();
    let mut query = names_query();
    let before = render(&query);

    let err = SortBuilder::new(&map)
        .apply(&mut query, &[SortSpec::asc("name"), SortSpec::asc("secret")])
        .unwrap_err();

    assert_eq!(err, QueryError::UnknownField("secret".to_string()));
    assert_eq!(render(&query), before);
}

#[test]
fn test_empty_specs_produce_no_ordering() {
    let map = columns();
    assert!(sort_columns(&map, &[]).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Executed orderings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ascending_puts_nulls_first() {
    let pool = seeded_db().await;
    let map = columns();
    let mut query = names_query();
    SortBuilder::new(&map)
        .stable_key("id")
        .apply(&mut query, &[SortSpec::asc("age")])
        .unwrap();

    assert_eq!(
        fetch_names(&pool, &query).await,
        vec!["banana", "Cherry", "Apple", "date"]
    );
}

#[tokio::test]
async fn test_descending_puts_nulls_last_and_tie_breaks_descending() {
    let pool = seeded_db().await;
    let map = columns();
    let mut query = names_query();
    SortBuilder::new(&map)
        .stable_key("id")
        .apply(&mut query, &[SortSpec::desc("age")])
        .unwrap();

    assert_eq!(
        fetch_names(&pool, &query).await,
        vec!["date", "Apple", "Cherry", "banana"]
    );
}

#[tokio::test]
async fn test_explicit_nulls_override_policy() {
    let pool = seeded_db().await;
    let map = columns();
    let mut query = names_query();
    SortBuilder::new(&map)
        .stable_key("id")
        .apply(&mut query, &[SortSpec::asc("age").with_nulls(NullsOrder::Last)])
        .unwrap();

    assert_eq!(
        fetch_names(&pool, &query).await,
        vec!["Cherry", "Apple", "date", "banana"]
    );
}

#[tokio::test]
async fn test_multiple_keys() {
    let pool = seeded_db().await;
    let map = columns();
    let mut query = names_query();
    SortBuilder::new(&map)
        .apply(&mut query, &[SortSpec::desc("age"), SortSpec::asc("name")])
        .unwrap();

    assert_eq!(
        fetch_names(&pool, &query).await,
        vec!["Apple", "date", "Cherry", "banana"]
    );
}

#[tokio::test]
async fn test_specs_from_json_request() {
    let pool = seeded_db().await;
    let specs: Vec<SortSpec> = serde_json::from_value(serde_json::json!([
        {"field": "age", "direction": "desc", "nulls": "first"},
        {"name": "name"}
    ]))
    .unwrap();

    let config = FragmentConfig {
        stable_key: Some("id".to_string()),
        ..Default::default()
    };
    let map = columns();
    let mut query = names_query();
    SortBuilder::from_config(&map, &config)
        .apply(&mut query, &specs)
        .unwrap();

    assert_eq!(
        fetch_names(&pool, &query).await,
        vec!["banana", "Apple", "date", "Cherry"]
    );
}

#[test]
fn test_malformed_direction_is_rejected() {
    let result: Result<Vec<SortSpec>, _> =
        serde_json::from_value(serde_json::json!([{"field": "age", "direction": "sideways"}]));
    assert!(result.is_err());
}
