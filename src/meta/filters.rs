//! Filter descriptors for the table component.

use crate::config::{Cardinality, ColumnDescriptor, FilterDescriptor, FilterMode, FilterType, Registry, ResolvedEntity};
use crate::meta::lang::{label_or_headline, resolve_label};
use crate::query::resolve_relation;
use serde_json::{Map, Value};

const DEFAULT_ITEM_TITLE: &str = "title";
const DEFAULT_ITEM_VALUE: &str = "value";

pub struct FilterContext<'a> {
    pub registry: &'a Registry,
    pub entity: &'a ResolvedEntity,
    pub lang: &'a str,
    /// Column names allowed as filters; `None` allows every filterable column.
    pub allowed: Option<&'a [String]>,
    /// URL prefix of the API, used for relation lookup URLs.
    pub api_prefix: &'a str,
}

/// Filters for every filterable column, in declaration order.
pub fn build_filters(ctx: &FilterContext<'_>) -> Vec<Value> {
    ctx.entity
        .columns
        .iter()
        .filter(|c| {
            ctx.allowed
                .map(|allowed| allowed.iter().any(|a| a == &c.name))
                .unwrap_or(true)
        })
        .filter_map(|c| c.filterable.as_ref().map(|f| (c, f)))
        .filter_map(|(c, f)| build_filter(ctx, c, f))
        .map(Value::Object)
        .collect()
}

/// Relation filters point at the related type's options endpoint, which returns the distinct title/value pairs a filter dropdown needs.
fn build_filter(ctx: &FilterContext<'_>, col: &ColumnDescriptor, f: &FilterDescriptor) -> Option<Map<String, Value>> {
    let mut out = Map::new();
    out.insert("type".into(), serde_json::to_value(f.filter_type).unwrap_or(Value::Null));
    out.insert(
        "key".into(),
        Value::String(f.value.clone().unwrap_or_else(|| col.key.clone())),
    );
    let label = resolve_label(f.label.as_ref(), ctx.lang, true)
        .unwrap_or_else(|| label_or_headline(col.label.as_ref(), ctx.lang, &col.name));
    out.insert("label".into(), Value::String(label));

    if f.filter_type != FilterType::Select {
        return Some(out);
    }

    match f.mode {
        FilterMode::Inline => {
            let title_field =
                resolve_label(f.item_title.as_ref(), ctx.lang, true).unwrap_or_else(|| DEFAULT_ITEM_TITLE.into());
            let value_field = f.item_value.clone().unwrap_or_else(|| DEFAULT_ITEM_VALUE.into());
            let items = f
                .items
                .iter()
                .filter_map(Value::as_object)
                .map(|item| {
                    let mut projected = Map::new();
                    projected.insert(
                        title_field.clone(),
                        item.get(&title_field).cloned().unwrap_or(Value::Null),
                    );
                    projected.insert(
                        value_field.clone(),
                        item.get(&value_field).cloned().unwrap_or(Value::Null),
                    );
                    Value::Object(projected)
                })
                .collect();
            out.insert("mode".into(), Value::String("self".into()));
            out.insert("itemTitle".into(), Value::String(title_field));
            out.insert("itemValue".into(), Value::String(value_field));
            out.insert("items".into(), Value::Array(items));
        }
        FilterMode::Relation => {
            let relation = resolve_relation(ctx.entity, f.relationship.as_deref()?)?;
            let related = ctx.registry.related(relation)?;
            let value_field = f.item_value.clone().unwrap_or_else(|| match relation.cardinality {
                Cardinality::ToOne => relation.remote_key.clone(),
                Cardinality::ToMany => related.primary_key.clone(),
            });
            let title_field = resolve_label(f.item_title.as_ref(), ctx.lang, true).unwrap_or_else(|| {
                if related.has_column("name") {
                    "name".into()
                } else {
                    value_field.clone()
                }
            });
            let url = format!(
                "{}/{}/options/{}?itemTitle={}&itemValue={}&lang={}",
                ctx.api_prefix, related.name, value_field, title_field, value_field, ctx.lang
            );
            out.insert("mode".into(), Value::String("relation".into()));
            out.insert("itemTitle".into(), Value::String(title_field));
            out.insert("itemValue".into(), Value::String(value_field));
            out.insert("url".into(), Value::String(url));
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::registry;
    use serde_json::json;

    fn ctx<'a>(reg: &'a Registry, lang: &'a str, allowed: Option<&'a [String]>) -> FilterContext<'a> {
        FilterContext {
            registry: reg,
            entity: reg.get("person").unwrap(),
            lang,
            allowed,
            api_prefix: "/api",
        }
    }

    #[test]
    fn builds_in_declaration_order_and_omits_unresolved_relations() {
        let reg = registry();
        let filters = build_filters(&ctx(&reg, "en", None));
        let keys: Vec<_> = filters.iter().map(|f| f["key"].as_str().unwrap()).collect();
        // entry_type_id points at an unknown relationship and is dropped.
        assert_eq!(keys, vec!["name", "status", "country_id", "joined"]);
        assert_eq!(filters[0], json!({ "type": "search", "key": "name", "label": "Name" }));
        assert_eq!(filters[3], json!({ "type": "date", "key": "joined", "label": "Joined On" }));
    }

    #[test]
    fn inline_items_are_projected_per_language() {
        let reg = registry();
        let filters = build_filters(&ctx(&reg, "dv", None));
        let status = &filters[1];
        assert_eq!(status["label"], json!("Haalu"));
        assert_eq!(status["mode"], json!("self"));
        assert_eq!(status["itemTitle"], json!("title_dv"));
        assert_eq!(
            status["items"],
            json!([
                { "title_dv": "Harakaaiy", "value": "active" },
                { "title_dv": "Vazeefaa", "value": "retired" }
            ])
        );
    }

    #[test]
    fn relation_filters_emit_lookup_url() {
        let reg = registry();
        let filters = build_filters(&ctx(&reg, "en", None));
        let country = &filters[2];
        assert_eq!(country["mode"], json!("relation"));
        assert_eq!(country["itemTitle"], json!("name_eng"));
        assert_eq!(
            country["url"],
            json!("/api/country/options/id?itemTitle=name_eng&itemValue=id&lang=en")
        );
        assert!(country.get("items").is_none());
    }

    #[test]
    fn allow_list_limits_filters() {
        let reg = registry();
        let allowed = vec!["status".to_string(), "id".to_string()];
        let filters = build_filters(&ctx(&reg, "en", Some(&allowed)));
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0]["key"], json!("status"));
    }
}
