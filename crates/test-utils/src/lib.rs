#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Querykit test utilities.
//!
//! Helpers for integration testing: an in-memory SQLite fixture, a test
//! item builder, and assertion utilities for generated SQL and JSON.

use sea_query::{SelectStatement, SqliteQueryBuilder};
use serde_json::{Map, Value as JsonValue};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a test subscriber. Safe to call from every test.
///
/// Honours `RUST_LOG`; defaults to `querykit=debug`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("querykit=debug,sqlx=warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

const SCHEMA: &str = "
    CREATE TABLE items (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER,
        country TEXT,
        price REAL,
        weight REAL
    );
    CREATE TABLE item_tags (
        item_id INTEGER NOT NULL REFERENCES items(id),
        tag TEXT NOT NULL
    );
";

/// Open a fresh in-memory database with the `items` and `item_tags` tables.
///
/// The pool is capped at one connection: every SQLite `:memory:` connection
/// is its own database.
pub async fn test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite database");

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create test schema");

    pool
}

/// Create a test item with default values.
pub fn test_item(id: i64, name: &str) -> TestItem {
    TestItem {
        id,
        name: name.to_string(),
        age: None,
        country: None,
        price: None,
        weight: None,
        tags: Vec::new(),
    }
}

/// A test item builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
    pub country: Option<String>,
    pub price: Option<f64>,
    pub weight: Option<f64>,
    pub tags: Vec<String>,
}

impl TestItem {
    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    /// Set the ISO country code.
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Add a tag row in `item_tags`.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Insert the item and its tags.
    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO items (id, name, age, country, price, weight) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(self.age)
        .bind(&self.country)
        .bind(self.price)
        .bind(self.weight)
        .execute(pool)
        .await
        .expect("Failed to insert test item");

        for tag in &self.tags {
            sqlx::query("INSERT INTO item_tags (item_id, tag) VALUES (?, ?)")
                .bind(self.id)
                .bind(tag)
                .execute(pool)
                .await
                .expect("Failed to insert test tag");
        }
    }
}

/// Insert every item.
pub async fn seed(pool: &SqlitePool, items: &[TestItem]) {
    for item in items {
        item.insert(pool).await;
    }
}

/// Render a statement for SQLite.
pub fn render(stmt: &SelectStatement) -> String {
    stmt.to_string(SqliteQueryBuilder)
}

/// Run a statement and return the first column of every row as a string.
pub async fn fetch_names(pool: &SqlitePool, stmt: &SelectStatement) -> Vec<String> {
    let sql = render(stmt);
    sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| panic!("query failed: {e}\nSQL: {sql}"))
}

/// Run a statement and return every row as a JSON object keyed by column name.
pub async fn fetch_rows(pool: &SqlitePool, stmt: &SelectStatement) -> Vec<Map<String, JsonValue>> {
    let sql = render(stmt);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| panic!("query failed: {e}\nSQL: {sql}"));

    rows.iter().map(row_to_json).collect()
}

fn row_to_json(row: &SqliteRow) -> Map<String, JsonValue> {
    let mut map = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(JsonValue::from).unwrap_or(JsonValue::Null)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            v.map(JsonValue::from).unwrap_or(JsonValue::Null)
        } else {
            row.try_get::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map(JsonValue::from)
                .unwrap_or(JsonValue::Null)
        };
        map.insert(column.name().to_string(), value);
    }
    map
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value equals expected.
    pub fn json_eq(actual: &Value, expected: &Value) {
        assert_eq!(
            actual,
            expected,
            "JSON mismatch:\nactual: {}\nexpected: {}",
            serde_json::to_string_pretty(actual).unwrap(),
            serde_json::to_string_pretty(expected).unwrap()
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}
