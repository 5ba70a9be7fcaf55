//! Resolved entity registry: definitions validated and flattened for runtime use.

use crate::config::{Cardinality, ColumnDescriptor};
use std::collections::HashMap;

/// Primary key type for parsing path ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkType {
    Uuid,
    Int,
    Text,
}

/// One entry of an entity type's relation table.
#[derive(Clone, Debug)]
pub struct Relation {
    pub name: String,
    pub aliases: Vec<String>,
    /// Canonical name of the related entity type.
    pub related: String,
    pub cardinality: Cardinality,
    /// Our column used in the join (our FK for to_one; our key for to_many).
    pub local_key: String,
    /// Their column used in the join (their key for to_one; their FK for to_many).
    pub remote_key: String,
}

impl Relation {
    /// True when `name` is the relation name or one of its declared aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    /// Canonical lowercase type name used in URLs.
    pub name: String,
    pub schema_name: String,
    pub table_name: String,
    pub primary_key: String,
    pub pk_type: PkType,
    /// Declaration order is the default output and header order.
    pub columns: Vec<ColumnDescriptor>,
    pub searchable: Vec<String>,
    pub relations: Vec<Relation>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Relation whose name or alias equals `name` exactly. See `query::resolve_relation` for guessing.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.answers_to(name))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    entities: Vec<ResolvedEntity>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub(crate) fn from_entities(entities: Vec<ResolvedEntity>) -> Self {
        let by_name = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        Registry { entities, by_name }
    }

    /// Lookup by type name; case-insensitive.
    pub fn get(&self, name: &str) -> Option<&ResolvedEntity> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|&i| self.entities.get(i))
    }

    pub fn related(&self, relation: &Relation) -> Option<&ResolvedEntity> {
        self.get(&relation.related)
    }

    pub fn entities(&self) -> &[ResolvedEntity] {
        &self.entities
    }
}
