//! Eager-load paths resolved into a relation tree.

use crate::config::{Registry, Relation, ResolvedEntity};
use crate::error::QueryError;
use crate::query::resolve_relation;

#[derive(Debug)]
pub struct Include<'a> {
    pub relation: &'a Relation,
    pub related: &'a ResolvedEntity,
    pub children: Vec<Include<'a>>,
}

/// Resolve dotted eager-load paths (`country.people`) segment by segment. Shared prefixes merge.
pub fn include_tree<'a>(
    registry: &'a Registry,
    entity: &'a ResolvedEntity,
    paths: &[String],
) -> Result<Vec<Include<'a>>, QueryError> {
    let mut roots: Vec<Include<'a>> = Vec::new();
    for path in paths {
        let mut level = &mut roots;
        let mut owner = entity;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let relation = resolve_relation(owner, segment).ok_or_else(|| QueryError::InvalidRelation {
                model: owner.name.clone(),
                relation: segment.to_string(),
            })?;
            let related = registry.related(relation).ok_or_else(|| QueryError::InvalidRelation {
                model: owner.name.clone(),
                relation: segment.to_string(),
            })?;
            let current = level;
            let idx = match current.iter().position(|i| i.relation.name == relation.name) {
                Some(idx) => idx,
                None => {
                    current.push(Include {
                        relation,
                        related,
                        children: Vec::new(),
                    });
                    current.len() - 1
                }
            };
            owner = related;
            level = &mut current[idx].children;
        }
    }
    Ok(roots)
}
