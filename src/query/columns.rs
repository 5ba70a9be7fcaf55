//! Column subset parser: `id,name,country_id.name_eng`.

use crate::config::{Registry, ResolvedEntity};
use crate::error::QueryError;
use crate::query::plan::{ColumnSelection, ColumnToken};
use crate::query::relation::resolve_relation;

/// Parse a comma-separated column list. `None` (or a blank string) means "no restriction".
pub fn parse_columns(
    registry: &Registry,
    entity: &ResolvedEntity,
    raw: Option<&str>,
) -> Result<Option<ColumnSelection>, QueryError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let mut selection = ColumnSelection::default();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let parsed = match token.split_once('.') {
            Some((alias, field)) => {
                let relation = resolve_relation(entity, alias).ok_or_else(|| QueryError::InvalidToken {
                    token: token.to_string(),
                    segment: alias.to_string(),
                })?;
                let related = registry.related(relation).ok_or_else(|| QueryError::InvalidToken {
                    token: token.to_string(),
                    segment: alias.to_string(),
                })?;
                if !related.has_column(field) {
                    return Err(QueryError::UnknownColumn {
                        model: related.name.clone(),
                        column: field.to_string(),
                    });
                }
                if !selection.relations.contains(&relation.name) {
                    selection.relations.push(relation.name.clone());
                }
                ColumnToken::Related {
                    alias: alias.to_string(),
                    relation: relation.name.clone(),
                    field: field.to_string(),
                }
            }
            None => {
                if !entity.has_column(token) {
                    return Err(QueryError::UnknownColumn {
                        model: entity.name.clone(),
                        column: token.to_string(),
                    });
                }
                ColumnToken::Plain(token.to_string())
            }
        };
        selection.tokens.push(parsed);
    }

    Ok(Some(selection))
}
