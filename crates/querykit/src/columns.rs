//! Column mapping and labelling helpers.
//!
//! A [`ColumnMap`] ties the logical field names used in request payloads to
//! the SeaQuery expressions they stand for. The sort and filter builders only
//! ever look columns up by name; they never construct them.

use std::collections::HashMap;

use sea_query::{Alias, Expr, IntoColumnRef, SelectStatement, SimpleExpr};

use crate::error::{QueryError, QueryResult};

/// Logical field name → column expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    columns: HashMap<String, SimpleExpr>,
}

impl ColumnMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `field` to a column reference, e.g. `(Alias::new("items"), Alias::new("name"))`.
    pub fn column(mut self, field: impl Into<String>, column: impl IntoColumnRef) -> Self {
        self.columns.insert(field.into(), Expr::col(column).into());
        self
    }

    /// Map `field` to an arbitrary expression (computed columns, JSON paths, ...).
    pub fn expr(mut self, field: impl Into<String>, expr: impl Into<SimpleExpr>) -> Self {
        self.columns.insert(field.into(), expr.into());
        self
    }

    /// Insert or replace a mapping, returning the previous expression.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        expr: impl Into<SimpleExpr>,
    ) -> Option<SimpleExpr> {
        self.columns.insert(field.into(), expr.into())
    }

    pub fn get(&self, field: &str) -> Option<&SimpleExpr> {
        self.columns.get(field)
    }

    /// Look up `field`, failing with [`QueryError::UnknownField`].
    pub fn resolve(&self, field: &str) -> QueryResult<&SimpleExpr> {
        self.columns.get(field).ok_or_else(|| {
            tracing::debug!(field, "field not present in column map");
            QueryError::UnknownField(field.to_string())
        })
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(field, expr)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SimpleExpr)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for ColumnMap
where
    K: Into<String>,
    V: Into<SimpleExpr>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An expression paired with the alias it is selected under.
#[derive(Debug, Clone, PartialEq)]
pub struct Labeled {
    pub expr: SimpleExpr,
    pub label: String,
}

impl Labeled {
    pub fn new(expr: impl Into<SimpleExpr>, label: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            label: label.into(),
        }
    }

    /// Add `expr AS label` to the statement's select list.
    pub fn select_into(self, stmt: &mut SelectStatement) {
        stmt.expr_as(self.expr, Alias::new(self.label));
    }
}

/// Qualified column labelled `<table>_<column>`, so joined tables can share
/// column names without clashing in the result row.
pub fn labeled(table: &str, column: &str) -> Labeled {
    Labeled {
        expr: Expr::col((Alias::new(table), Alias::new(column))).into(),
        label: format!("{table}_{column}"),
    }
}

/// Label every expression with its key, keeping the input order.
pub fn label_columns<I, K, V>(columns: I) -> Vec<Labeled>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<SimpleExpr>,
{
    columns
        .into_iter()
        .map(|(label, expr)| Labeled::new(expr, label))
        .collect()
}

/// Add all labelled expressions to the select list.
pub fn select_labeled(stmt: &mut SelectStatement, labels: impl IntoIterator<Item = Labeled>) {
    for label in labels {
        label.select_into(stmt);
    }
}
