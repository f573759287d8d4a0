use serde_json::{Map, Number, Value};
use sqlx::{postgres::PgArguments, PgExecutor, Row};

use crate::database::manager::DatabaseError;
use crate::types::Collection;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

/// Statement returning one JSON document per row in a column named `row`
pub struct JsonQuery<'q> {
    collection: Collection,
    query: PgQuery<'q>,
}

impl<'q> JsonQuery<'q> {
    pub fn new(collection: Collection, sql: &'q str) -> Self {
        if crate::config::config().database.enable_query_logging {
            tracing::debug!(collection = %collection, "SQL: {}", sql);
        }
        Self {
            collection,
            query: sqlx::query(sql),
        }
    }

    pub fn bind(mut self, value: &'q Value) -> Self {
        self.query = bind_param_query(self.query, value);
        self
    }

    pub fn bind_all(mut self, values: &'q [Value]) -> Self {
        for v in values {
            self.query = bind_param_query(self.query, v);
        }
        self
    }

    /// Bind a whole document as JSONB
    pub fn bind_document(mut self, document: Value) -> Self {
        self.query = self.query.bind(document);
        self
    }

    pub async fn fetch_all<'e, E: PgExecutor<'e>>(self, executor: E) -> Result<Vec<Map<String, Value>>, DatabaseError> {
        let collection = self.collection;
        let rows = self
            .query
            .fetch_all(executor)
            .await
            .map_err(|e| DatabaseError::from_sqlx(collection, e))?;
        rows.iter().map(decode_row).collect()
    }

    pub async fn fetch_optional<'e, E: PgExecutor<'e>>(self, executor: E) -> Result<Option<Map<String, Value>>, DatabaseError> {
        let collection = self.collection;
        let row = self
            .query
            .fetch_optional(executor)
            .await
            .map_err(|e| DatabaseError::from_sqlx(collection, e))?;
        row.as_ref().map(decode_row).transpose()
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Map<String, Value>, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::QueryError(format!("expected JSON object row, got {}", other))),
    }
}

#[derive(Debug, PartialEq)]
enum NumberParam {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Postgres has no u64, so integers past `i64::MAX` travel as their exact text
fn number_param(n: &Number) -> NumberParam {
    if let Some(i) = n.as_i64() {
        NumberParam::Int(i)
    } else if n.is_u64() {
        NumberParam::Text(n.to_string())
    } else if let Some(f) = n.as_f64() {
        NumberParam::Float(f)
    } else {
        NumberParam::Text(n.to_string())
    }
}

pub(crate) fn bind_param_query<'q>(q: PgQuery<'q>, v: &'q Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => match number_param(n) {
            NumberParam::Int(i) => q.bind(i),
            NumberParam::Float(f) => q.bind(f),
            NumberParam::Text(t) => q.bind(t),
        },
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(arr) => {
            // Lists of scalars bind as text[]
            let items: Vec<String> = arr
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            q.bind(items)
        }
        Value::Object(_) => q.bind(v), // JSONB
    }
}
