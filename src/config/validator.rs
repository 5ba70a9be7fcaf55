//! Entity definition validation: referential integrity and naming consistency.

use crate::config::EntityDefinition;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(definitions: &[EntityDefinition]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for def in definitions {
        if !names.insert(def.name.to_lowercase()) {
            return Err(ConfigError::DuplicateEntity(def.name.clone()));
        }
    }

    for def in definitions {
        let mut keys = HashSet::new();
        for c in &def.columns {
            if !keys.insert(c.key.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    entity: def.name.clone(),
                    column: c.key.clone(),
                });
            }
        }
        if !def.columns.iter().any(|c| c.name == def.primary_key) {
            return Err(ConfigError::InvalidPrimaryKey {
                entity: def.name.clone(),
                column: def.primary_key.clone(),
            });
        }
        for s in &def.searchable {
            if !def.columns.iter().any(|c| &c.name == s) {
                return Err(ConfigError::MissingReference {
                    kind: "searchable column",
                    id: format!("{}.{}", def.name, s),
                });
            }
        }

        let mut relation_names = HashSet::new();
        for rel in &def.relations {
            if !names.contains(&rel.related.to_lowercase()) {
                return Err(ConfigError::MissingReference {
                    kind: "related entity type",
                    id: rel.related.clone(),
                });
            }
            for n in std::iter::once(&rel.name).chain(rel.aliases.iter()) {
                if !relation_names.insert(n.as_str()) {
                    return Err(ConfigError::MissingReference {
                        kind: "unique relation name",
                        id: format!("{}.{}", def.name, n),
                    });
                }
            }
        }
    }

    Ok(())
}
