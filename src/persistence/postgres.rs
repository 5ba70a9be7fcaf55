//! PostgreSQL repository: every statement comes from `sql::builder`, values bind as text.

use super::{include_tree, OptionsQuery, Page, Repository};
use crate::config::{Registry, ResolvedEntity};
use crate::error::AppError;
use crate::query::QueryPlan;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        PgRepository { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn query_count(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn paginate(
        &self,
        registry: &Registry,
        entity: &ResolvedEntity,
        plan: &QueryPlan,
        page: u64,
        per_page: u64,
    ) -> Result<Page, AppError> {
        let includes = include_tree(registry, entity, &plan.with)?;
        let total = self.query_count(&sql::count(entity, plan)).await?;
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let q = sql::select_page(registry, entity, plan, &includes, per_page, offset);
        let rows = self.query_many(&q).await?;
        Ok(Page { rows, total })
    }

    async fn find(
        &self,
        registry: &Registry,
        entity: &ResolvedEntity,
        id: &Value,
        with: &[String],
    ) -> Result<Option<Value>, AppError> {
        let includes = include_tree(registry, entity, with)?;
        self.query_optional(&sql::select_by_id(entity, id, &includes)).await
    }

    async fn create(&self, entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Value, AppError> {
        self.query_optional(&sql::insert(entity, body))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        self.query_optional(&sql::update(entity, id, body)).await
    }

    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError> {
        Ok(self.query_optional(&sql::delete(entity, id)).await?.is_some())
    }

    async fn options(&self, entity: &ResolvedEntity, query: &OptionsQuery) -> Result<Vec<Value>, AppError> {
        self.query_many(&sql::select_options(entity, query)).await
    }
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::{Column, Row};
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

/// Decode one cell by trying the column types the schemas use; unknown types become null.
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
