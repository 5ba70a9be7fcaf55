//! Sort token parser: `-created_at,name,country_id.name_eng`.

use crate::config::ResolvedEntity;
use crate::error::QueryError;
use crate::query::plan::{ColumnSelection, ColumnToken, Direction, SortDirective, SortTarget};

/// Parse sort tokens in request order; a leading `-` sorts descending.
/// Relation-qualified fields are only accepted when they are among the selected column tokens.
pub fn parse_sort(
    entity: &ResolvedEntity,
    raw: Option<&str>,
    columns: Option<&ColumnSelection>,
) -> Result<Vec<SortDirective>, QueryError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (field, direction) = match token.strip_prefix('-') {
            Some(rest) => (rest.trim(), Direction::Desc),
            None => (token, Direction::Asc),
        };
        let target = if field.contains('.') {
            match columns.and_then(|c| c.find(field)) {
                Some(ColumnToken::Related { relation, field, .. }) => SortTarget::Related {
                    relation: relation.clone(),
                    field: field.clone(),
                },
                _ => return Err(QueryError::UnknownSortField(field.to_string())),
            }
        } else if entity.has_column(field) {
            SortTarget::Column(field.to_string())
        } else {
            return Err(QueryError::UnknownSortField(field.to_string()));
        };
        out.push(SortDirective { target, direction });
    }
    Ok(out)
}
