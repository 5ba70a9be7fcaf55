//! Relation-name resolution against an entity's relation table.

use crate::case::to_camel_case;
use crate::config::{Relation, ResolvedEntity};

/// Names tried for `candidate`, in priority order: as given, camelCased, and for `_id`
/// names the camelCased name without the suffix. Duplicates are dropped.
pub fn relation_candidates(candidate: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(3);
    let mut push = |name: String| {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    };
    push(candidate.to_string());
    push(to_camel_case(candidate));
    if let Some(stripped) = candidate.strip_suffix("_id") {
        push(to_camel_case(stripped));
    }
    out
}

/// Resolve `candidate` to a relation of `entity`. First match wins; no match is `None`.
pub fn resolve_relation<'a>(entity: &'a ResolvedEntity, candidate: &str) -> Option<&'a Relation> {
    relation_candidates(candidate)
        .iter()
        .find_map(|name| entity.relation(name))
}
