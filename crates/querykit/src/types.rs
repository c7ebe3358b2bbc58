//! Declarative sort and filter specs.
//!
//! These are the shapes callers usually deserialize straight from a request
//! body, e.g. `{"name": "created", "direction": "desc"}`:
//! - SortSpec: field + direction (+ optional NULL placement)
//! - FilterSpec: field + match mode + value
//! - SortDirection, NullsOrder, MatchMode: the modifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// One requested ordering: a field name and a direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    /// Logical field to sort by. Also accepted as `name`.
    #[serde(alias = "name")]
    pub field: String,

    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,

    /// NULL handling. `None` defers to the builder's policy.
    #[serde(default)]
    pub nulls: Option<NullsOrder>,
}

impl SortSpec {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
            nulls: None,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
            nulls: None,
        }
    }

    /// Pin NULL placement for this sort.
    pub fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(QueryError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// NULL ordering preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
}

impl FromStr for NullsOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(NullsOrder::First),
            "last" => Ok(NullsOrder::Last),
            _ => Err(QueryError::InvalidNullsOrder(s.to_string())),
        }
    }
}

/// One requested filter: a field name, a match mode and the user term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSpec {
    /// Logical field to filter on. Also accepted as `name`.
    #[serde(alias = "name")]
    pub field: String,

    /// How `value` is compared against the column.
    #[serde(default)]
    pub mode: MatchMode,

    /// Raw term, usually user input.
    pub value: String,

    /// Scale applied to numeric terms before comparing (`Number` mode only).
    #[serde(default)]
    pub divisor: Option<f64>,
}

impl FilterSpec {
    /// Case-insensitive substring filter on `field`.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            mode: MatchMode::Contains,
            value: value.into(),
            divisor: None,
        }
    }

    /// Approximate numeric filter on `field`.
    pub fn number(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            mode: MatchMode::Number,
            value: value.into(),
            divisor: None,
        }
    }

    /// Set the divisor for numeric terms.
    pub fn with_divisor(mut self, divisor: f64) -> Self {
        self.divisor = Some(divisor);
        self
    }
}

/// Comparison semantics for a filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive substring match (LOWER(col) LIKE %value%).
    #[default]
    Contains,
    /// Numeric match within the configured epsilon.
    Number,
}

impl FromStr for MatchMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contains" => Ok(MatchMode::Contains),
            "number" => Ok(MatchMode::Number),
            _ => Err(QueryError::InvalidMatchMode(s.to_string())),
        }
    }
}
