//! Repository over PostgreSQL using the safe SQL builder.

use super::{FindMany, Record, Repository};
use crate::config::ModelDescriptor;
use crate::error::StoreError;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

pub struct PgRepository {
    pool: PgPool,
    model: ModelDescriptor,
}

impl PgRepository {
    pub fn new(pool: PgPool, model: ModelDescriptor) -> Self {
        PgRepository { pool, model }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Record>, StoreError> {
        tracing::debug!(model = %self.model.name, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_record(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(model = %self.model.name, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    fn with_id(mut q: QueryBuf, id: &Value) -> QueryBuf {
        q.params.push(id.clone());
        q
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_one(&self, id: &Value) -> Result<Option<Record>, StoreError> {
        let q = Self::with_id(sql::select_by_id(&self.model), id);
        self.fetch_optional(&q).await
    }

    async fn find_many(&self, args: &FindMany) -> Result<Vec<Record>, StoreError> {
        let q = sql::select_many(&self.model, args);
        self.fetch_all(&q).await
    }

    async fn create(&self, data: &Record) -> Result<Record, StoreError> {
        let q = sql::insert(&self.model, data);
        self.fetch_optional(&q)
            .await?
            .ok_or_else(|| StoreError::Database("insert returned no row".into()))
    }

    async fn update(&self, id: &Value, data: &Record) -> Result<Record, StoreError> {
        let q = sql::update(&self.model, id, data);
        self.fetch_optional(&q)
            .await?
            .ok_or(StoreError::RecordNotFound("update"))
    }

    async fn delete(&self, id: &Value) -> Result<Record, StoreError> {
        let q = Self::with_id(sql::delete(&self.model), id);
        self.fetch_optional(&q)
            .await?
            .ok_or(StoreError::RecordNotFound("delete"))
    }
}

fn row_to_record(row: &PgRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Record::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
