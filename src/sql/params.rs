//! Bindable parameter values for dynamically built queries.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, Postgres};

/// A value collected while building SQL, bound when the query is executed.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Json(serde_json::Value),
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Register a parameter and return its `$n` placeholder index.
    pub fn push_param(&mut self, v: SqlParam) -> usize {
        self.params.push(v);
        self.params.len()
    }

    pub fn query_as<'q, T>(&'q self) -> QueryAs<'q, Postgres, T, PgArguments>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let mut q = sqlx::query_as::<_, T>(&self.sql);
        for p in &self.params {
            q = match p {
                SqlParam::Text(s) => q.bind(s.as_str()),
                SqlParam::Int(n) => q.bind(*n),
                SqlParam::Bool(b) => q.bind(*b),
                SqlParam::Json(v) => q.bind(v),
            };
        }
        q
    }

    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        let mut q = sqlx::query(&self.sql);
        for p in &self.params {
            q = match p {
                SqlParam::Text(s) => q.bind(s.as_str()),
                SqlParam::Int(n) => q.bind(*n),
                SqlParam::Bool(b) => q.bind(*b),
                SqlParam::Json(v) => q.bind(v),
            };
        }
        q
    }

    pub fn query_scalar_i64(&self) -> QueryScalar<'_, Postgres, i64, PgArguments> {
        let mut q = sqlx::query_scalar::<_, i64>(&self.sql);
        for p in &self.params {
            q = match p {
                SqlParam::Text(s) => q.bind(s.as_str()),
                SqlParam::Int(n) => q.bind(*n),
                SqlParam::Bool(b) => q.bind(*b),
                SqlParam::Json(v) => q.bind(v),
            };
        }
        q
    }
}

impl Default for QueryBuf {
    fn default() -> Self {
        Self::new()
    }
}
