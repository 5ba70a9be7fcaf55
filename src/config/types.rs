//! Raw entity definition types matching the JSON model documents.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A label: either plain text or a language-code -> text mapping (declaration order kept).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Label {
    Plain(String),
    Localized(Vec<(String, String)>),
}

impl Label {
    /// Text for an exact language key, if this is a localized label that has one.
    pub fn get(&self, lang: &str) -> Option<&str> {
        match self {
            Label::Plain(_) => None,
            Label::Localized(entries) => entries.iter().find(|(k, _)| k == lang).map(|(_, v)| v.as_str()),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            Label::Plain(s) => Some(s.as_str()),
            Label::Localized(entries) => entries.first().map(|(_, v)| v.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        match v {
            Value::String(s) => Ok(Label::Plain(s)),
            Value::Object(obj) => {
                let mut entries = Vec::with_capacity(obj.len());
                for (lang, text) in obj {
                    match text {
                        Value::String(s) => entries.push((lang, s)),
                        other => {
                            return Err(serde::de::Error::custom(format!(
                                "label for language '{}' must be a string; got {}",
                                lang,
                                type_name_of_json(&other)
                            )))
                        }
                    }
                }
                Ok(Label::Localized(entries))
            }
            other => Err(serde::de::Error::custom(format!(
                "label must be a string or a language map; got {}",
                type_name_of_json(&other)
            ))),
        }
    }
}

impl Serialize for Label {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        match self {
            Label::Plain(s) => serializer.serialize_str(s),
            Label::Localized(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

fn type_name_of_json(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    #[default]
    String,
    Date,
    Datetime,
    Boolean,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Search,
    Select,
    Date,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    #[serde(rename = "self")]
    Inline,
    #[serde(rename = "relation")]
    Relation,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default)]
    pub label: Option<Label>,
    /// Output filter key; the column key when absent.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub mode: FilterMode,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub item_title: Option<Label>,
    #[serde(default)]
    pub item_value: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

/// One schema-declared attribute of an entity type.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Declared attribute name; filled from the `columns` map key.
    #[serde(skip)]
    pub name: String,
    /// Stable output name; defaults to `name`.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub label: Option<Label>,
    /// Label used when the column is shown through a relation of another entity.
    #[serde(default)]
    pub relation_label: Option<Label>,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub display_type: Option<Value>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub lang: Option<Vec<String>>,
    #[serde(default)]
    pub filterable: Option<FilterDescriptor>,
    #[serde(default)]
    pub rules: Option<ValidationRule>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ColumnDescriptor {
            key: name.clone(),
            name,
            label: None,
            relation_label: None,
            column_type: ColumnType::default(),
            display_type: None,
            hidden: false,
            sortable: false,
            lang: None,
            filterable: None,
            rules: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RelationDefinition {
    /// Relation accessor name, e.g. "entryType".
    pub name: String,
    /// Related entity type name.
    pub related: String,
    pub cardinality: Cardinality,
    /// Extra names that match this relation exactly.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// to_one: our column holding the related key. to_many: their column pointing back at us.
    #[serde(default)]
    pub foreign_key: Option<String>,
    /// to_one: their key column. to_many: our key column. Primary key when absent.
    #[serde(default)]
    pub owner_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(deserialize_with = "ordered_columns")]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub searchable: Vec<String>,
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

fn default_primary_key() -> String {
    "id".into()
}

/// `columns` is a JSON object keyed by attribute name; declaration order is the default column order.
fn ordered_columns<'de, D>(deserializer: D) -> Result<Vec<ColumnDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
    let mut out = Vec::with_capacity(map.len());
    for (name, raw) in map {
        let mut col: ColumnDescriptor = serde_json::from_value(raw)
            .map_err(|e| serde::de::Error::custom(format!("column '{}': {}", name, e)))?;
        if col.key.is_empty() {
            col.key = name.clone();
        }
        col.name = name;
        out.push(col);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn columns_keep_declaration_order_and_default_key() {
        let def: EntityDefinition = serde_json::from_value(json!({
            "name": "country",
            "columns": {
                "id": { "type": "number", "sortable": true },
                "name_eng": { "label": { "en": "Name", "dv": "Nan" }, "lang": ["en"] },
                "code": { "key": "iso_code" }
            }
        }))
        .unwrap();
        let names: Vec<_> = def.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name_eng", "code"]);
        assert_eq!(def.columns[0].key, "id");
        assert_eq!(def.columns[2].key, "iso_code");
        assert_eq!(def.columns[0].column_type, ColumnType::Number);
        assert_eq!(def.primary_key, "id");
    }

    #[test]
    fn localized_label_keeps_order() {
        let label: Label = serde_json::from_value(json!({ "dv": "b", "en": "a" })).unwrap();
        assert_eq!(label.first(), Some("b"));
        assert_eq!(label.get("en"), Some("a"));
        assert_eq!(label.get("fr"), None);
    }

    #[test]
    fn label_rejects_non_string_values() {
        let res: Result<Label, _> = serde_json::from_value(json!({ "en": 1 }));
        assert!(res.is_err());
    }

    #[test]
    fn filter_descriptor_modes() {
        let f: FilterDescriptor = serde_json::from_value(json!({
            "type": "select",
            "mode": "relation",
            "relationship": "country",
            "itemTitle": { "en": "name_eng", "dv": "name_div" },
            "itemValue": "id"
        }))
        .unwrap();
        assert_eq!(f.mode, FilterMode::Relation);
        assert_eq!(f.item_value.as_deref(), Some("id"));

        let f: FilterDescriptor = serde_json::from_value(json!({ "type": "search" })).unwrap();
        assert_eq!(f.mode, FilterMode::Inline);
    }
}
