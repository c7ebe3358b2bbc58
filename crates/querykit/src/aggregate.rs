//! Aggregate expressions.

use sea_query::{Expr, Func, SimpleExpr};

/// Weighted average of `value` by `weight`:
/// `CASE WHEN SUM(weight) = 0 THEN NULL ELSE SUM(value * weight) / SUM(weight) END`.
///
/// Groups whose weights sum to zero yield NULL instead of a division error.
pub fn weighted_avg(value: SimpleExpr, weight: SimpleExpr) -> SimpleExpr {
    let total_weight: SimpleExpr = Func::sum(weight.clone()).into();
    let weighted_total: SimpleExpr = Func::sum(Expr::expr(value).mul(weight)).into();

    Expr::case(
        Expr::expr(total_weight.clone()).eq(0),
        Expr::value(Option::<f64>::None),
    )
    .finally(Expr::expr(weighted_total).div(total_weight))
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Alias, Query, SqliteQueryBuilder};

    #[test]
    fn weighted_avg_sql() {
        let mut query = Query::select();
        query
            .expr_as(
                weighted_avg(
                    Expr::col(Alias::new("score")).into(),
                    Expr::col(Alias::new("weight")).into(),
                ),
                Alias::new("avg_score"),
            )
            .from(Alias::new("reviews"));
        let sql = query.to_string(SqliteQueryBuilder);

        assert!(sql.contains("CASE WHEN"), "{sql}");
        assert!(sql.contains("SUM(\"weight\") = 0"), "{sql}");
        assert!(sql.contains("THEN NULL"), "{sql}");
        assert!(sql.contains("\"score\" * \"weight\""), "{sql}");
        assert!(sql.contains("AS \"avg_score\""), "{sql}");
    }
}
