//! Record persistence behind a trait: the table-view service never talks to storage directly.

mod include;
mod memory;
mod postgres;

pub use include::{include_tree, Include};
pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use crate::config::{Registry, ResolvedEntity};
use crate::error::AppError;
use crate::query::{Direction, QueryPlan};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One page of records plus the total count before paging.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: u64,
}

/// Distinct lookup values for one column, optionally paired with a title column.
#[derive(Debug, Clone)]
pub struct OptionsQuery {
    pub value_column: String,
    pub title_column: Option<String>,
    pub direction: Direction,
    pub limit: Option<u64>,
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Apply filters, search and sorts; eager-load `plan.with`; return one page.
    async fn paginate(
        &self,
        registry: &Registry,
        entity: &ResolvedEntity,
        plan: &QueryPlan,
        page: u64,
        per_page: u64,
    ) -> Result<Page, AppError>;

    async fn find(
        &self,
        registry: &Registry,
        entity: &ResolvedEntity,
        id: &Value,
        with: &[String],
    ) -> Result<Option<Value>, AppError>;

    async fn create(&self, entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Value, AppError>;

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError>;

    /// True when a row was removed.
    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError>;

    /// Items are `{ "value": .., "title": .. }`; `title` only when a title column was asked for.
    async fn options(&self, entity: &ResolvedEntity, query: &OptionsQuery) -> Result<Vec<Value>, AppError>;
}
