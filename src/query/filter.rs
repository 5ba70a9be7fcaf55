//! Filter string parser: `status:active,name:*ali*`.

use crate::config::ResolvedEntity;
use crate::error::QueryError;
use crate::query::plan::{FilterDirective, FilterValue};

/// Parse `field:value` pairs. A `*` in the value turns it into a LIKE pattern (`*` -> `%`).
/// `allowed`, when given, restricts which columns may be filtered. A repeated field keeps the last value.
pub fn parse_filters(
    entity: &ResolvedEntity,
    raw: Option<&str>,
    allowed: Option<&[String]>,
) -> Result<Vec<FilterDirective>, QueryError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut out: Vec<FilterDirective> = Vec::new();
    for segment in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let (field, value) = segment
            .split_once(':')
            .map(|(f, v)| (f.trim(), v.trim()))
            .filter(|(f, v)| !f.is_empty() && !v.is_empty())
            .ok_or_else(|| QueryError::InvalidFilterSegment(segment.trim().to_string()))?;
        if !entity.has_column(field) {
            return Err(QueryError::UnknownFilterField(field.to_string()));
        }
        if let Some(allowed) = allowed {
            if !allowed.iter().any(|a| a == field) {
                return Err(QueryError::FilterNotAllowed(field.to_string()));
            }
        }
        let value = if value.contains('*') {
            FilterValue::Like(value.replace('*', "%"))
        } else {
            FilterValue::Exact(value.to_string())
        };
        out.retain(|d| d.column != field);
        out.push(FilterDirective {
            column: field.to_string(),
            value,
        });
    }
    Ok(out)
}
