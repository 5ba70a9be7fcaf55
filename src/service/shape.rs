//! Record shaping: project raw rows onto the requested token order.

use crate::config::{Registry, ResolvedEntity};
use crate::query::ColumnToken;
use crate::settings::RecordShape;
use serde_json::{Map, Value};

/// Value of `field` on an eager-loaded relation: object -> field, array -> list of fields.
fn related_value(source: Option<&Value>, field: &str) -> Value {
    match source {
        Some(Value::Object(o)) => o.get(field).cloned().unwrap_or(Value::Null),
        Some(Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|i| i.get(field).cloned().unwrap_or(Value::Null))
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// Merge `field` into a nested group: an object for to-one, an array of objects for to-many.
fn merge_group(slot: &mut Value, source: Option<&Value>, field: &str) {
    match (slot, source) {
        (Value::Array(group), Some(Value::Array(items))) => {
            for (entry, item) in group.iter_mut().zip(items) {
                if let Value::Object(m) = entry {
                    m.insert(field.to_string(), item.get(field).cloned().unwrap_or(Value::Null));
                }
            }
        }
        (Value::Object(m), source) => {
            m.insert(field.to_string(), related_value(source, field));
        }
        _ => {}
    }
}

fn empty_group(source: Option<&Value>) -> Value {
    match source {
        Some(Value::Array(items)) => Value::Array(vec![Value::Object(Map::new()); items.len()]),
        _ => Value::Object(Map::new()),
    }
}

/// Shape one raw record. `tokens` must already be language-filtered. Relations listed in
/// `with` are appended under their relation name after the token fields.
pub fn shape_record(
    registry: &Registry,
    entity: &ResolvedEntity,
    row: &Value,
    tokens: &[ColumnToken],
    with: &[String],
    shape: RecordShape,
) -> Value {
    let mut out = Map::new();
    for token in tokens {
        match token {
            ColumnToken::Plain(name) => {
                let key = entity.column(name).map(|c| c.key.as_str()).unwrap_or(name.as_str());
                out.insert(key.to_string(), row.get(name).cloned().unwrap_or(Value::Null));
            }
            ColumnToken::Related { alias, relation, field } => {
                let source = row.get(relation);
                match shape {
                    RecordShape::Flat => {
                        out.insert(token.to_string(), related_value(source, field));
                    }
                    RecordShape::Nested => {
                        // A plain field may already own the alias key (`country_id`).
                        let group_key = match out.get(alias) {
                            Some(Value::Object(_)) | Some(Value::Array(_)) | None => alias.as_str(),
                            Some(_) => relation.as_str(),
                        };
                        let slot = out
                            .entry(group_key.to_string())
                            .or_insert_with(|| empty_group(source));
                        merge_group(slot, source, field);
                    }
                }
            }
        }
    }
    for path in with {
        let name = path.split('.').next().unwrap_or(path.as_str());
        if out.contains_key(name) {
            continue;
        }
        let Some(loaded) = row.get(name) else { continue };
        if entity.relation(name).and_then(|r| registry.related(r)).is_some() {
            out.insert(name.to_string(), loaded.clone());
        }
    }
    Value::Object(out)
}

pub fn shape_records(
    registry: &Registry,
    entity: &ResolvedEntity,
    rows: &[Value],
    tokens: &[ColumnToken],
    with: &[String],
    shape: RecordShape,
) -> Vec<Value> {
    rows.iter()
        .map(|r| shape_record(registry, entity, r, tokens, with, shape))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_columns;
    use crate::testing::registry;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": 1,
            "name": "Aisha",
            "country_id": 3,
            "status": "active",
            "country": { "id": 3, "name_eng": "Maldives", "code": "MV" }
        })
    }

    #[test]
    fn flat_keeps_dotted_keys_in_token_order() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let sel = parse_columns(&reg, person, Some("country_id.name_eng,name,id")).unwrap().unwrap();
        let out = shape_record(&reg, person, &row(), &sel.tokens, &[], RecordShape::Flat);
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["country_id.name_eng", "name", "id"]);
        assert_eq!(out["country_id.name_eng"], "Maldives");
    }

    #[test]
    fn nested_groups_under_alias() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let sel = parse_columns(&reg, person, Some("id,nation.name_eng,nation.code")).unwrap().unwrap();
        let out = shape_record(&reg, person, &row(), &sel.tokens, &[], RecordShape::Nested);
        assert_eq!(out, json!({ "id": 1, "nation": { "name_eng": "Maldives", "code": "MV" } }));
    }

    #[test]
    fn nested_alias_colliding_with_plain_field_uses_relation_name() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let sel = parse_columns(&reg, person, Some("country_id,country_id.name_eng")).unwrap().unwrap();
        let out = shape_record(&reg, person, &row(), &sel.tokens, &[], RecordShape::Nested);
        assert_eq!(out, json!({ "country_id": 3, "country": { "name_eng": "Maldives" } }));
    }

    #[test]
    fn to_many_tokens() {
        let reg = registry();
        let country = reg.get("country").unwrap();
        let raw = json!({ "id": 3, "people": [{ "name": "Aisha" }, { "name": "Bilal" }] });
        let sel = parse_columns(&reg, country, Some("id,people.name")).unwrap().unwrap();
        let flat = shape_record(&reg, country, &raw, &sel.tokens, &[], RecordShape::Flat);
        assert_eq!(flat["people.name"], json!(["Aisha", "Bilal"]));
        let nested = shape_record(&reg, country, &raw, &sel.tokens, &[], RecordShape::Nested);
        assert_eq!(nested["people"], json!([{ "name": "Aisha" }, { "name": "Bilal" }]));
    }

    #[test]
    fn explicit_with_is_appended() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let tokens = vec![ColumnToken::Plain("name".into())];
        let out = shape_record(&reg, person, &row(), &tokens, &["country".into()], RecordShape::Flat);
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "country"]);
        assert_eq!(out["country"]["code"], "MV");
    }
}
