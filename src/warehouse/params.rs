//! Typed query parameters bound positionally ($1, $2, ...).

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgTypeInfo, Postgres};
use sqlx::query::Query;
use sqlx::Type;

/// A value that can be bound to a warehouse query.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryParam {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Json(Value),
}

impl QueryParam {
    /// Bind onto a query, keeping each variant's native PostgreSQL type.
    pub fn bind_to<'q>(&self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(b) => query.bind(*b),
            QueryParam::I64(n) => query.bind(*n),
            QueryParam::F64(n) => query.bind(*n),
            QueryParam::String(s) => query.bind(s.clone()),
            QueryParam::Json(v) => query.bind(v.clone()),
        }
    }

    /// The PostgreSQL type [`QueryParam::bind_to`] sends for this value.
    pub fn type_info(&self) -> PgTypeInfo {
        match self {
            QueryParam::Null | QueryParam::String(_) => <String as Type<Postgres>>::type_info(),
            QueryParam::Bool(_) => <bool as Type<Postgres>>::type_info(),
            QueryParam::I64(_) => <i64 as Type<Postgres>>::type_info(),
            QueryParam::F64(_) => <f64 as Type<Postgres>>::type_info(),
            QueryParam::Json(_) => <Value as Type<Postgres>>::type_info(),
        }
    }
}

impl From<&str> for QueryParam {
    fn from(s: &str) -> Self {
        QueryParam::String(s.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(s: String) -> Self {
        QueryParam::String(s)
    }
}

impl From<i64> for QueryParam {
    fn from(n: i64) -> Self {
        QueryParam::I64(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_native_variants() {
        assert_eq!(QueryParam::from("USD"), QueryParam::String("USD".into()));
        assert_eq!(QueryParam::from(7i64), QueryParam::I64(7));
    }

    #[test]
    fn declared_types_match_bound_values() {
        use sqlx::TypeInfo;
        assert_eq!(QueryParam::I64(7).type_info().name(), "INT8");
        assert_eq!(QueryParam::from("x").type_info().name(), "TEXT");
        assert_eq!(QueryParam::Json(Value::Null).type_info().name(), "JSONB");
    }
}
