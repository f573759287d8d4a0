use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::JsonQuery;
use crate::database::store::{Record, RecordPage, Store};
use crate::filter::error::is_identifier;
use crate::filter::{Filter, FilterData, FilterError};
use crate::types::Collection;

/// [`Store`] over the relational schema created by the migrations.
///
/// Rows travel as JSON documents: reads project `row_to_json`, writes go
/// through `jsonb_populate_record` so column typing stays with Postgres.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn columns(record: &Record) -> Result<Vec<String>, DatabaseError> {
        record
            .keys()
            .map(|k| {
                if is_identifier(k) {
                    Ok(format!("\"{}\"", k))
                } else {
                    Err(DatabaseError::InvalidQuery(FilterError::InvalidColumn(k.clone())))
                }
            })
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<RecordPage, DatabaseError> {
        let table = collection.table_name();
        let mut sql_filter = Filter::new(table)?;
        sql_filter.assign(filter.clone())?;

        let select = sql_filter.to_sql_with(&format!("row_to_json(\"{}\") AS row", table))?;
        let docs = JsonQuery::new(collection, &select.query)
            .bind_all(&select.params)
            .fetch_all(&self.pool)
            .await?;

        let count = sql_filter.to_count_sql()?;
        let mut q = sqlx::query(&count.query);
        for p in count.params.iter() {
            q = crate::database::query_builder::bind_param_query(q, p);
        }
        let total: i64 = q.fetch_one(&self.pool).await?.try_get("count")?;

        Ok(RecordPage {
            docs,
            total: total as u64,
            limit: filter.limit,
            offset: filter.offset.unwrap_or(0),
        })
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Record>, DatabaseError> {
        let table = collection.table_name();
        let sql = format!("SELECT row_to_json(t) AS row FROM \"{}\" t WHERE t.\"id\" = $1", table);
        let id = Value::String(id.to_string());
        JsonQuery::new(collection, &sql).bind(&id).fetch_optional(&self.pool).await
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record, DatabaseError> {
        let table = collection.table_name();
        let columns = Self::columns(&record)?.join(", ");
        let sql = format!(
            "INSERT INTO \"{table}\" AS t ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1) \
             RETURNING row_to_json(t) AS row"
        );
        JsonQuery::new(collection, &sql)
            .bind_document(Value::Object(record))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, collection: Collection, id: &str, mut changes: Record) -> Result<Record, DatabaseError> {
        changes.remove("id");
        if changes.is_empty() {
            return self
                .find_by_id(collection, id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", collection, id)));
        }

        let table = collection.table_name();
        let columns = Self::columns(&changes)?.join(", ");
        let sql = format!(
            "UPDATE \"{table}\" AS t SET ({columns}) = \
             (SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1)) \
             WHERE t.\"id\" = $2 RETURNING row_to_json(t) AS row"
        );
        let id_value = Value::String(id.to_string());
        JsonQuery::new(collection, &sql)
            .bind_document(Value::Object(changes))
            .bind(&id_value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", collection, id)))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<Record, DatabaseError> {
        let table = collection.table_name();
        let id_value = Value::String(id.to_string());
        let mut tx = self.pool.begin().await?;

        if collection == Collection::Websites {
            // Memberships live in an array column, which foreign keys cannot cover
            sqlx::query(
                "UPDATE \"users\" SET \"websites\" = array_remove(\"websites\", $1), \
                 \"default_website\" = NULLIF(\"default_website\", $1), \"updated_at\" = now() \
                 WHERE $1 = ANY(\"websites\") OR \"default_website\" = $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!("DELETE FROM \"{}\" AS t WHERE t.\"id\" = $1 RETURNING row_to_json(t) AS row", table);
        let removed = JsonQuery::new(collection, &sql)
            .bind(&id_value)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", collection, id)))?;

        tx.commit().await?;
        Ok(removed)
    }

    async fn count(&self, collection: Collection, where_clause: &Value) -> Result<u64, DatabaseError> {
        let mut filter = Filter::new(collection.table_name())?;
        filter.where_clause(where_clause.clone())?;
        let sql = filter.to_count_sql()?;

        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = crate::database::query_builder::bind_param_query(q, p);
        }
        let total: i64 = q.fetch_one(&self.pool).await?.try_get("count")?;
        Ok(total as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
