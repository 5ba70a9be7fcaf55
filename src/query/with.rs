//! Eager-load parser: `country,entry_type_id,country.people`.

use crate::config::ResolvedEntity;
use crate::error::QueryError;
use crate::query::relation::resolve_relation;

/// Parse eager-load paths. Only the first segment is resolved against `entity`; deeper
/// segments are passed through for the persistence layer.
pub fn parse_with(entity: &ResolvedEntity, raw: Option<&str>) -> Result<Vec<String>, QueryError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut out: Vec<String> = Vec::new();
    for path in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };
        let relation = resolve_relation(entity, first).ok_or_else(|| QueryError::InvalidRelation {
            model: entity.name.clone(),
            relation: first.to_string(),
        })?;
        let resolved = match rest {
            Some(rest) => format!("{}.{}", relation.name, rest),
            None => relation.name.clone(),
        };
        if !out.contains(&resolved) {
            out.push(resolved);
        }
    }
    Ok(out)
}

/// Union of two eager-load lists, keeping first-seen order.
pub fn merge_with(explicit: &[String], implied: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(explicit.len() + implied.len());
    for path in explicit.iter().chain(implied) {
        if !out.contains(path) {
            out.push(path.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::registry;

    #[test]
    fn resolves_first_segment_only() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let w = parse_with(person, Some("country_id.people, entry_type ,country")).unwrap();
        assert_eq!(w, vec!["country.people", "entryType", "country"]);
    }

    #[test]
    fn unknown_relation_fails() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        assert_eq!(
            parse_with(person, Some("planet.moons")).unwrap_err(),
            QueryError::InvalidRelation {
                model: "person".into(),
                relation: "planet".into()
            }
        );
    }

    #[test]
    fn merge_deduplicates() {
        let merged = merge_with(&["country".into(), "office".into()], &["entryType".into(), "country".into()]);
        assert_eq!(merged, vec!["country", "office", "entryType"]);
    }
}
