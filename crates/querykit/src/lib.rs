//! Querykit
//!
//! Query fragment helpers on top of sea-query. A [`ColumnMap`] names the
//! sortable and filterable columns; sort and filter specs (typically
//! deserialized from a request) are resolved against it into ORDER BY
//! fragments and WHERE predicates. Result rows can then be reshaped into
//! nested JSON with the helpers in [`results`].

pub mod aggregate;
pub mod columns;
pub mod config;
pub mod error;
pub mod filter;
pub mod results;
pub mod sort;
pub mod types;

pub use aggregate::weighted_avg;
pub use columns::{ColumnMap, Labeled, label_columns, labeled, select_labeled};
pub use config::FragmentConfig;
pub use error::{QueryError, QueryResult};
pub use filter::{
    check_country, check_number, compare_number, filter_condition, filter_predicates,
    ilike_substr, literal_str, match_any, maybe_and,
};
pub use results::{EntityOptions, Row, entity_to_dict, group_result_set, result_list_to_dict, set_attribute};
pub use sort::{NullsPolicy, OrderFragment, SortBuilder, apply_order, sort_columns};
pub use types::{FilterSpec, MatchMode, NullsOrder, SortDirection, SortSpec};

pub mod prelude {
    pub use crate::columns::ColumnMap;
    pub use crate::filter::{ilike_substr, match_any, maybe_and};
    pub use crate::sort::SortBuilder;
    pub use crate::types::{FilterSpec, SortSpec};
}
