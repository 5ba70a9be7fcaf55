//! Build the registry from entity definitions, loaded from a file or from the document store.

use crate::case::to_snake_case;
use crate::config::resolved::{PkType, Registry, Relation, ResolvedEntity};
use crate::config::types::*;
use crate::config::validate;
use crate::error::{AppError, ConfigError};
use crate::store::DocumentStore;
use std::path::Path;

/// Document key holding the entity definitions array.
pub const MODELS_DOCUMENT: &str = "models";

/// Build resolved registry from entity definitions (validates first).
pub fn resolve(definitions: &[EntityDefinition]) -> Result<Registry, ConfigError> {
    validate(definitions)?;

    let mut entities = Vec::with_capacity(definitions.len());
    for def in definitions {
        let pk_col = def
            .columns
            .iter()
            .find(|c| c.name == def.primary_key)
            .ok_or_else(|| ConfigError::InvalidPrimaryKey {
                entity: def.name.clone(),
                column: def.primary_key.clone(),
            })?;
        let relations = def
            .relations
            .iter()
            .map(|r| resolve_relation_keys(def, r, definitions))
            .collect();
        let name = def.name.to_lowercase();
        entities.push(ResolvedEntity {
            table_name: def.table.clone().unwrap_or_else(|| name.clone()),
            schema_name: def.schema.clone().unwrap_or_else(|| "public".into()),
            primary_key: def.primary_key.clone(),
            pk_type: infer_pk_type(pk_col),
            columns: def.columns.clone(),
            searchable: def.searchable.clone(),
            relations,
            name,
        });
    }
    tracing::debug!(entities = entities.len(), "registry resolved");
    Ok(Registry::from_entities(entities))
}

fn resolve_relation_keys(owner: &EntityDefinition, rel: &RelationDefinition, all: &[EntityDefinition]) -> Relation {
    let related_pk = all
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(&rel.related))
        .map(|d| d.primary_key.clone())
        .unwrap_or_else(|| "id".into());
    let (local_key, remote_key) = match rel.cardinality {
        Cardinality::ToOne => (
            rel.foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}_id", to_snake_case(&rel.name))),
            rel.owner_key.clone().unwrap_or(related_pk),
        ),
        Cardinality::ToMany => (
            rel.owner_key.clone().unwrap_or_else(|| owner.primary_key.clone()),
            rel.foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}_id", to_snake_case(&owner.name).to_lowercase())),
        ),
    };
    Relation {
        name: rel.name.clone(),
        aliases: rel.aliases.clone(),
        related: rel.related.to_lowercase(),
        cardinality: rel.cardinality,
        local_key,
        remote_key,
    }
}

fn infer_pk_type(col: &ColumnDescriptor) -> PkType {
    let is_uuid_format = col
        .rules
        .as_ref()
        .and_then(|r| r.format.as_deref())
        .map(|f| f.eq_ignore_ascii_case("uuid"))
        .unwrap_or(false);
    match col.column_type {
        ColumnType::Number => PkType::Int,
        _ if is_uuid_format => PkType::Uuid,
        _ => PkType::Text,
    }
}

/// Load entity definitions from a JSON file holding an array of definitions.
pub async fn load_definitions_from_path(path: impl AsRef<Path>) -> Result<Vec<EntityDefinition>, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Load entity definitions from the document store under [`MODELS_DOCUMENT`].
pub async fn load_definitions(store: &dyn DocumentStore) -> Result<Vec<EntityDefinition>, AppError> {
    let doc = store
        .load(MODELS_DOCUMENT)
        .await?
        .ok_or_else(|| ConfigError::Load(format!("document '{}' not found", MODELS_DOCUMENT)))?;
    let defs = serde_json::from_value(doc).map_err(|e| ConfigError::InvalidDocument {
        key: MODELS_DOCUMENT.into(),
        reason: e.to_string(),
    })?;
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        let defs: Vec<EntityDefinition> = serde_json::from_value(json!([
            { "name": "Country", "columns": { "id": { "type": "number" }, "name": {} } },
            { "name": "Person", "table": "people", "columns": { "id": { "type": "number" }, "country_id": {}, "entry_type_id": {} },
              "relations": [
                { "name": "country", "related": "Country", "cardinality": "to_one" },
                { "name": "entryType", "related": "entry_type", "cardinality": "to_one", "foreign_key": "entry_type_id" }
              ] },
            { "name": "entry_type", "columns": { "code": {} }, "primary_key": "code",
              "relations": [{ "name": "people", "related": "person", "cardinality": "to_many" }] }
        ]))
        .unwrap();
        resolve(&defs).unwrap()
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let reg = registry();
        assert!(reg.get("country").is_some());
        assert!(reg.get("COUNTRY").is_some());
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.get("person").unwrap().table_name, "people");
        assert_eq!(reg.get("country").unwrap().table_name, "country");
        assert_eq!(reg.get("country").unwrap().pk_type, PkType::Int);
        assert_eq!(reg.get("entry_type").unwrap().pk_type, PkType::Text);
    }

    #[test]
    fn relation_keys_default_by_cardinality() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let country = person.relation("country").unwrap();
        assert_eq!(country.local_key, "country_id");
        assert_eq!(country.remote_key, "id");
        let entry = person.relation("entryType").unwrap();
        assert_eq!(entry.local_key, "entry_type_id");
        assert_eq!(entry.remote_key, "code");

        let people = reg.get("entry_type").unwrap().relation("people").unwrap();
        assert_eq!(people.local_key, "code");
        assert_eq!(people.remote_key, "entry_type_id");
        assert_eq!(reg.related(people).unwrap().name, "person");
    }
}
