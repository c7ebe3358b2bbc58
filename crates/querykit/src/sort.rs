//! Sort clause builder.
//!
//! Turns an ordered list of [`SortSpec`]s into ORDER BY fragments over the
//! columns of a [`ColumnMap`]:
//! - one fragment per spec, in input order
//! - unknown fields fail the whole call
//! - optional stable-key tie-breaker for deterministic paging

use std::str::FromStr;

use sea_query::{NullOrdering, Order, OrderedStatement, SimpleExpr};
use serde::{Deserialize, Serialize};

use crate::columns::ColumnMap;
use crate::config::FragmentConfig;
use crate::error::{QueryError, QueryResult};
use crate::types::{NullsOrder, SortDirection, SortSpec};

/// Where NULLs go when a spec doesn't say.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NullsPolicy {
    /// NULL sorts as the smallest value: first ascending, last descending.
    #[default]
    Smallest,
    /// No NULLS clause; the database default applies.
    Database,
}

impl NullsPolicy {
    fn nulls_for(self, direction: SortDirection) -> Option<NullsOrder> {
        match (self, direction) {
            (NullsPolicy::Smallest, SortDirection::Asc) => Some(NullsOrder::First),
            (NullsPolicy::Smallest, SortDirection::Desc) => Some(NullsOrder::Last),
            (NullsPolicy::Database, _) => None,
        }
    }
}

impl FromStr for NullsPolicy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smallest" => Ok(NullsPolicy::Smallest),
            "database" => Ok(NullsPolicy::Database),
            _ => Err(QueryError::InvalidNullsPolicy(s.to_string())),
        }
    }
}

impl From<NullsOrder> for NullOrdering {
    fn from(nulls: NullsOrder) -> Self {
        match nulls {
            NullsOrder::First => NullOrdering::First,
            NullsOrder::Last => NullOrdering::Last,
        }
    }
}

/// One ORDER BY term, ready to be spliced into a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFragment {
    pub expr: SimpleExpr,
    pub direction: SortDirection,
    pub nulls: Option<NullsOrder>,
}

impl OrderFragment {
    pub fn order(&self) -> Order {
        match self.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }

    /// Append this term to the statement's ORDER BY.
    pub fn apply<S: OrderedStatement>(&self, stmt: &mut S) {
        match self.nulls {
            Some(nulls) => {
                stmt.order_by_expr_with_nulls(self.expr.clone(), self.order(), nulls.into());
            }
            None => {
                stmt.order_by_expr(self.expr.clone(), self.order());
            }
        }
    }
}

/// Append every fragment, in order, to the statement's ORDER BY.
pub fn apply_order<S: OrderedStatement>(stmt: &mut S, fragments: &[OrderFragment]) {
    for fragment in fragments {
        fragment.apply(stmt);
    }
}

/// Build one ordering fragment per spec with the default policy and no
/// tie-breaker.
pub fn sort_columns(columns: &ColumnMap, specs: &[SortSpec]) -> QueryResult<Vec<OrderFragment>> {
    SortBuilder::new(columns).build(specs)
}

/// Configurable sort clause builder.
#[derive(Debug, Clone)]
pub struct SortBuilder<'a> {
    columns: &'a ColumnMap,
    stable_key: Option<String>,
    nulls_policy: NullsPolicy,
}

impl<'a> SortBuilder<'a> {
    pub fn new(columns: &'a ColumnMap) -> Self {
        Self {
            columns,
            stable_key: None,
            nulls_policy: NullsPolicy::default(),
        }
    }

    /// Builder seeded from a [`FragmentConfig`].
    pub fn from_config(columns: &'a ColumnMap, config: &FragmentConfig) -> Self {
        Self {
            columns,
            stable_key: config.stable_key.clone(),
            nulls_policy: config.nulls_policy,
        }
    }

    /// Append `key` as a tie-breaker unless a spec already sorts by it.
    ///
    /// The key is ignored when it is not in the column map.
    pub fn stable_key(mut self, key: impl Into<String>) -> Self {
        self.stable_key = Some(key.into());
        self
    }

    pub fn nulls_policy(mut self, policy: NullsPolicy) -> Self {
        self.nulls_policy = policy;
        self
    }

    /// Resolve every spec into an ordering fragment.
    pub fn build(&self, specs: &[SortSpec]) -> QueryResult<Vec<OrderFragment>> {
        let mut fragments = Vec::with_capacity(specs.len() + 1);

        for spec in specs {
            let expr = self.columns.resolve(&spec.field)?;
            let nulls = spec
                .nulls
                .or_else(|| self.nulls_policy.nulls_for(spec.direction));

            tracing::trace!(field = %spec.field, direction = %spec.direction, ?nulls, "sort term");

            fragments.push(OrderFragment {
                expr: expr.clone(),
                direction: spec.direction,
                nulls,
            });
        }

        if let Some(ref key) = self.stable_key
            && !specs.iter().any(|spec| &spec.field == key)
            && let Some(expr) = self.columns.get(key)
        {
            // Tie-breaker follows the leading sort so pages stay monotonic.
            let direction = match specs.first() {
                Some(first) if first.direction == SortDirection::Asc => SortDirection::Asc,
                _ => SortDirection::Desc,
            };
            tracing::trace!(field = %key, %direction, "stable key appended");
            fragments.push(OrderFragment {
                expr: expr.clone(),
                direction,
                nulls: None,
            });
        }

        tracing::debug!(
            specs = specs.len(),
            fragments = fragments.len(),
            "built sort fragments"
        );

        Ok(fragments)
    }

    /// Build the fragments and append them to the statement.
    ///
    /// The statement is left untouched when any spec fails to resolve.
    pub fn apply<S: OrderedStatement>(&self, stmt: &mut S, specs: &[SortSpec]) -> QueryResult<()> {
        let fragments = self.build(specs)?;
        apply_order(stmt, &fragments);
        Ok(())
    }
}
