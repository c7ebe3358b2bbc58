//! Filter predicate factories.
//!
//! Every helper here returns a boolean `SimpleExpr` meant for
//! `SelectStatement::and_where` or a `Cond`. [`ilike_substr`] is curried:
//! it captures the term once and can then be applied to any number of
//! columns.

use sea_query::{Cond, Expr, Func, LikeExpr, SimpleExpr};

use crate::columns::ColumnMap;
use crate::config::FragmentConfig;
use crate::error::QueryResult;
use crate::types::{FilterSpec, MatchMode};

/// Escape character used in generated LIKE patterns.
pub const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcard characters (`%`, `_`) and the escape character itself.
pub fn escape_like_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring filter.
///
/// Returns a factory that, given a column, yields
/// `LOWER(column) LIKE '%term%' ESCAPE '!'`. The term is matched literally.
///
/// ```
/// use querykit::filter::ilike_substr;
/// use sea_query::{Alias, Expr};
///
/// let contains_gin = ilike_substr("Gin");
/// let by_name = contains_gin(Expr::col(Alias::new("name")).into());
/// let by_title = contains_gin(Expr::col(Alias::new("title")).into());
/// assert_ne!(by_name, by_title);
/// ```
pub fn ilike_substr(term: &str) -> impl Fn(SimpleExpr) -> SimpleExpr + Clone + Send + Sync + 'static {
    let pattern = format!("%{}%", escape_like_wildcards(&term.to_lowercase()));
    move |column| {
        Expr::expr(Func::lower(column)).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE))
    }
}

/// OR of `factory` applied to each column. Matches nothing when `columns`
/// is empty.
pub fn match_any<F>(columns: impl IntoIterator<Item = SimpleExpr>, factory: F) -> SimpleExpr
where
    F: Fn(SimpleExpr) -> SimpleExpr,
{
    let mut cond = Cond::any();
    let mut count = 0usize;
    for column in columns {
        cond = cond.add(factory(column));
        count += 1;
    }

    if count == 0 {
        return Expr::value(false);
    }
    cond.into()
}

/// AND of all predicates; a constant TRUE when there are none.
pub fn maybe_and(predicates: impl IntoIterator<Item = SimpleExpr>) -> SimpleExpr {
    let mut cond = Cond::all();
    let mut count = 0usize;
    for predicate in predicates {
        cond = cond.add(predicate);
        count += 1;
    }

    if count == 0 {
        return Expr::value(true);
    }
    cond.into()
}

/// `column BETWEEN value - epsilon AND value + epsilon`, to absorb float drift.
pub fn compare_number(column: SimpleExpr, value: f64, epsilon: f64) -> SimpleExpr {
    Expr::expr(column).between(value - epsilon, value + epsilon)
}

/// Parse a user-supplied numeric term. Non-finite values are rejected.
pub fn parse_number(term: &str) -> Option<f64> {
    let term = term.trim();
    let value = match term.parse::<i64>() {
        Ok(int) => int as f64,
        Err(_) => term.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Compare a numeric column with a textual term scaled by `divisor`.
///
/// A term that isn't a number (or a zero divisor) yields a predicate that
/// matches nothing, so a typo in a search box narrows rather than widens.
pub fn check_number(column: SimpleExpr, term: &str, divisor: f64, epsilon: f64) -> SimpleExpr {
    match parse_number(term).map(|value| value / divisor) {
        Some(value) if value.is_finite() => compare_number(column, value, epsilon),
        _ => {
            tracing::debug!(term, divisor, "numeric filter term rejected");
            Expr::value(false)
        }
    }
}

/// Compare a country-code column with a term that is either a code or a
/// country name.
///
/// `lookup` maps a country name to its code (e.g. "Germany" → "DE"); when it
/// returns `None` the term itself is treated as the code. The comparison is
/// case-insensitive.
pub fn check_country<F>(column: SimpleExpr, term: &str, lookup: F) -> SimpleExpr
where
    F: Fn(&str) -> Option<String>,
{
    let code = lookup(term).unwrap_or_else(|| term.to_string());
    Expr::expr(Func::lower(column)).eq(code.to_lowercase())
}

/// Raw SQL string literal, `'value'`. The value is NOT escaped; only use it
/// for trusted constants.
pub fn literal_str(value: &str) -> SimpleExpr {
    Expr::cust(format!("'{value}'"))
}

impl FilterSpec {
    /// Predicate for this spec against an already-resolved column.
    pub fn predicate(&self, column: SimpleExpr, epsilon: f64) -> SimpleExpr {
        match self.mode {
            MatchMode::Contains => ilike_substr(&self.value)(column),
            MatchMode::Number => {
                check_number(column, &self.value, self.divisor.unwrap_or(1.0), epsilon)
            }
        }
    }
}

/// Build one predicate per filter spec, in input order.
pub fn filter_predicates(
    columns: &ColumnMap,
    specs: &[FilterSpec],
    config: &FragmentConfig,
) -> QueryResult<Vec<SimpleExpr>> {
    let predicates = specs
        .iter()
        .map(|spec| -> QueryResult<SimpleExpr> {
            let column = columns.resolve(&spec.field)?;
            tracing::trace!(field = %spec.field, mode = ?spec.mode, "filter term");
            Ok(spec.predicate(column.clone(), config.number_epsilon))
        })
        .collect::<QueryResult<Vec<SimpleExpr>>>()?;

    tracing::debug!(filters = predicates.len(), "built filter predicates");
    Ok(predicates)
}

/// All filter specs combined with AND (TRUE when there are none).
pub fn filter_condition(
    columns: &ColumnMap,
    specs: &[FilterSpec],
    config: &FragmentConfig,
) -> QueryResult<SimpleExpr> {
    Ok(maybe_and(filter_predicates(columns, specs, config)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NUMBER_EPSILON;
    use crate::error::QueryError;
    use sea_query::{Alias, Query, SqliteQueryBuilder};

    fn col(name: &str) -> SimpleExpr {
        Expr::col(Alias::new(name)).into()
    }

    fn render(predicate: SimpleExpr) -> String {
        let mut query = Query::select();
        query
            .column(Alias::new("id"))
            .from(Alias::new("items"))
            .and_where(predicate);
        query.to_string(SqliteQueryBuilder)
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100!%");
        assert_eq!(escape_like_wildcards("a_b"), "a!_b");
        assert_eq!(escape_like_wildcards("wow!"), "wow!!");
    }

    #[test]
    fn ilike_substr_lowercases_and_wraps() {
        let sql = render(ilike_substr("GIN")(col("name")));
        assert!(sql.contains("LOWER(\"name\") LIKE '%gin%'"), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");
    }

    #[test]
    fn ilike_substr_escapes_wildcards() {
        let sql = render(ilike_substr("100%_done")(col("name")));
        assert!(sql.contains("100!%!_done"), "wildcards should be escaped: {sql}");
        assert!(!sql.contains("%100%_done%"), "{sql}");
    }

    #[test]
    fn ilike_substr_is_reusable() {
        let factory = ilike_substr("gin");
        let a = factory(col("name"));
        let b = factory(col("name"));
        let c = factory(col("title"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn match_any_ors_columns() {
        let sql = render(match_any(
            [col("name"), col("title")],
            ilike_substr("gin"),
        ));
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.contains("LOWER(\"title\")"), "{sql}");
    }

    #[test]
    fn match_any_empty_is_false() {
        assert_eq!(
            match_any(Vec::<SimpleExpr>::new(), ilike_substr("gin")),
            Expr::value(false)
        );
    }

    #[test]
    fn maybe_and_empty_is_true() {
        assert_eq!(maybe_and(Vec::<SimpleExpr>::new()), Expr::value(true));
    }

    #[test]
    fn maybe_and_joins_with_and() {
        let sql = render(maybe_and([
            Expr::col(Alias::new("a")).eq(1),
            Expr::col(Alias::new("b")).eq(2),
        ]));
        assert!(sql.contains("\"a\" = 1"), "{sql}");
        assert!(sql.contains(" AND "), "{sql}");
        assert!(sql.contains("\"b\" = 2"), "{sql}");
    }

    #[test]
    fn parse_number_variants() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number(" 2.5 "), Some(2.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn check_number_builds_between() {
        let sql = render(check_number(col("price"), "10", 1.0, DEFAULT_NUMBER_EPSILON));
        assert!(sql.contains("\"price\" BETWEEN"), "{sql}");
    }

    #[test]
    fn check_number_rejects_garbage() {
        assert_eq!(
            check_number(col("price"), "ten", 1.0, DEFAULT_NUMBER_EPSILON),
            Expr::value(false)
        );
        assert_eq!(
            check_number(col("price"), "10", 0.0, DEFAULT_NUMBER_EPSILON),
            Expr::value(false)
        );
    }

    #[test]
    fn check_number_applies_divisor() {
        assert_eq!(
            check_number(col("price"), "250", 100.0, 0.01),
            compare_number(col("price"), 2.5, 0.01)
        );
    }

    #[test]
    fn check_country_uses_lookup() {
        let lookup = |name: &str| (name.eq_ignore_ascii_case("germany")).then(|| "DE".to_string());

        assert_eq!(
            check_country(col("country"), "Germany", lookup),
            check_country(col("country"), "de", |_| None)
        );
        let sql = render(check_country(col("country"), "Germany", lookup));
        assert!(sql.contains("LOWER(\"country\") = 'de'"), "{sql}");
    }

    #[test]
    fn literal_str_is_verbatim() {
        assert_eq!(literal_str("fruit"), Expr::cust("'fruit'"));
        let sql = render(Expr::col(Alias::new("kind")).eq(literal_str("fruit")));
        assert!(sql.contains("\"kind\" = ('fruit')"), "{sql}");
    }

    #[test]
    fn filter_predicates_resolve_fields() {
        let map = ColumnMap::new()
            .column("name", Alias::new("name"))
            .column("price", Alias::new("price"));
        let specs = [
            FilterSpec::contains("name", "gin"),
            FilterSpec::number("price", "3").with_divisor(2.0),
        ];

        let predicates = filter_predicates(&map, &specs, &FragmentConfig::default()).unwrap();
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0], ilike_substr("gin")(col("name")));
        assert_eq!(
            predicates[1],
            compare_number(col("price"), 1.5, DEFAULT_NUMBER_EPSILON)
        );
    }

    #[test]
    fn filter_predicates_unknown_field() {
        let map = ColumnMap::new().column("name", Alias::new("name"));
        let err = filter_predicates(
            &map,
            &[FilterSpec::contains("unknown", "x")],
            &FragmentConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, QueryError::UnknownField("unknown".to_string()));
    }

    #[test]
    fn filter_condition_without_specs_is_true() {
        let map = ColumnMap::new();
        let cond = filter_condition(&map, &[], &FragmentConfig::default()).unwrap();
        assert_eq!(cond, Expr::value(true));
    }
}
