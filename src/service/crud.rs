//! Create, update, delete and lookup options over the repository.

use crate::config::{PkType, Registry, ResolvedEntity};
use crate::error::{AppError, QueryError};
use crate::persistence::{OptionsQuery, Repository};
use crate::query::ColumnSelection;
use crate::service::params::{parse_direction, parse_u64, present, OptionsParams};
use crate::service::shape::shape_record;
use crate::service::RequestValidator;
use crate::settings::ServiceOptions;
use serde_json::{Map, Value};

/// Parse a path id by primary key type. `None` when it cannot be a valid key.
pub fn parse_id(entity: &ResolvedEntity, raw: &str) -> Option<Value> {
    match entity.pk_type {
        PkType::Uuid => uuid::Uuid::parse_str(raw).ok().map(|u| Value::String(u.to_string())),
        PkType::Int => raw.parse::<i64>().ok().map(|n| Value::Number(n.into())),
        PkType::Text => Some(Value::String(raw.to_string())),
    }
}

/// Keep only schema-declared keys. Anything else is logged and dropped.
fn whitelist(entity: &ResolvedEntity, body: Value) -> Result<Map<String, Value>, AppError> {
    let Value::Object(map) = body else {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    };
    let mut out = Map::new();
    for (k, v) in map {
        if entity.has_column(&k) {
            out.insert(k, v);
        } else {
            tracing::warn!(model = %entity.name, field = %k, "dropping undeclared field from body");
        }
    }
    Ok(out)
}

pub struct CrudService<'a> {
    pub registry: &'a Registry,
    pub repository: &'a dyn Repository,
    pub options: &'a ServiceOptions,
}

impl<'a> CrudService<'a> {
    fn entity(&self, model: &str) -> Result<&'a ResolvedEntity, AppError> {
        self.registry
            .get(model)
            .ok_or_else(|| AppError::ModelNotFound(model.to_string()))
    }

    /// Output records use the full schema under each column's key.
    fn shape(&self, entity: &ResolvedEntity, row: &Value) -> Value {
        let all = ColumnSelection::all(entity);
        shape_record(self.registry, entity, row, &all.tokens, &[], self.options.record_shape)
    }

    pub async fn create(&self, model: &str, body: Value) -> Result<Value, AppError> {
        let entity = self.entity(model)?;
        let body = whitelist(entity, body)?;
        RequestValidator::validate(entity, &body)?;
        let row = self.repository.create(entity, &body).await?;
        let id = row.get(&entity.primary_key).cloned().unwrap_or_default();
        tracing::info!(model = %entity.name, id = %id, "record created");
        Ok(self.shape(entity, &row))
    }

    pub async fn update(&self, model: &str, id: &str, body: Value) -> Result<Value, AppError> {
        let entity = self.entity(model)?;
        let id_value = parse_id(entity, id).ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let mut body = whitelist(entity, body)?;
        body.remove(&entity.primary_key);
        RequestValidator::validate_partial(entity, &body)?;
        let row = self
            .repository
            .update(entity, &id_value, &body)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        Ok(self.shape(entity, &row))
    }

    pub async fn delete(&self, model: &str, id: &str) -> Result<(), AppError> {
        let entity = self.entity(model)?;
        let id_value = parse_id(entity, id).ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if !self.repository.delete(entity, &id_value).await? {
            return Err(AppError::NotFound(id.to_string()));
        }
        tracing::info!(model = %entity.name, id = %id, "record deleted");
        Ok(())
    }

    /// Distinct values of `field`, or `{title, value}` pairs when `itemTitle` is given.
    pub async fn options(&self, model: &str, field: &str, params: &OptionsParams) -> Result<Vec<Value>, AppError> {
        let entity = self.entity(model)?;
        let require = |column: &str| -> Result<String, AppError> {
            if entity.has_column(column) {
                Ok(column.to_string())
            } else {
                Err(QueryError::UnknownColumn {
                    model: entity.name.clone(),
                    column: column.to_string(),
                }
                .into())
            }
        };
        require(field)?;
        let value_column = require(present(&params.item_value).unwrap_or(field))?;
        let title_column = present(&params.item_title).map(|t| require(t)).transpose()?;
        let limit = parse_u64("limit", &params.limit)?
            .unwrap_or(self.options.max_per_page)
            .min(self.options.max_per_page);
        let query = OptionsQuery {
            value_column,
            title_column,
            direction: parse_direction(&params.sort)?,
            limit: Some(limit),
        };
        tracing::debug!(model = %entity.name, ?query, "options query");
        self.repository.options(entity, &query).await
    }
}
