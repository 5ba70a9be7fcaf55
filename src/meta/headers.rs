//! Header descriptors for the table component.

use crate::config::{ColumnCustomization, ColumnDescriptor, Registry, ResolvedEntity};
use crate::meta::lang::{filter_tokens_by_lang, label_or_headline, pick_header_lang_override, resolve_label};
use crate::query::ColumnToken;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub struct HeaderContext<'a> {
    pub registry: &'a Registry,
    pub entity: &'a ResolvedEntity,
    pub lang: &'a str,
    pub customizations: Option<&'a HashMap<String, ColumnCustomization>>,
    pub include_hidden: bool,
}

/// Build headers for `tokens` (language filtered here), in token order.
pub fn build_headers(ctx: &HeaderContext<'_>, tokens: &[ColumnToken]) -> Vec<Value> {
    filter_tokens_by_lang(ctx.registry, ctx.entity, tokens, ctx.lang)
        .iter()
        .filter_map(|token| build_header(ctx, token))
        .map(Value::Object)
        .collect()
}

fn build_header(ctx: &HeaderContext<'_>, token: &ColumnToken) -> Option<Map<String, Value>> {
    let token_text = token.to_string();
    let custom = ctx.customizations.and_then(|c| c.get(&token_text));
    let col = token.column(ctx.registry, ctx.entity)?;

    let hidden = custom.and_then(|c| c.hidden).unwrap_or(col.hidden);
    if hidden && !ctx.include_hidden {
        return None;
    }

    let custom_title = custom.and_then(|c| resolve_label(c.title.as_ref(), ctx.lang, true));
    let (title, value) = match token {
        ColumnToken::Plain(_) => (
            custom_title.unwrap_or_else(|| label_or_headline(col.label.as_ref(), ctx.lang, &col.name)),
            col.key.clone(),
        ),
        ColumnToken::Related { .. } => (
            custom_title
                .or_else(|| resolve_label(col.relation_label.as_ref(), ctx.lang, false))
                .unwrap_or_else(|| label_or_headline(col.label.as_ref(), ctx.lang, &col.name)),
            token_text,
        ),
    };

    let mut header = Map::new();
    header.insert("title".into(), Value::String(title));
    header.insert("value".into(), Value::String(value));
    header.insert(
        "sortable".into(),
        Value::Bool(custom.and_then(|c| c.sortable).unwrap_or(col.sortable)),
    );
    header.insert("hidden".into(), Value::Bool(hidden));
    header.insert("type".into(), header_type(col, custom));
    if let Some(display) = custom.and_then(|c| c.display_type.clone()).or_else(|| col.display_type.clone()) {
        header.insert("displayType".into(), display);
    }
    if let Some(alt) = pick_header_lang_override(col.lang.as_deref(), ctx.lang) {
        header.insert("lang".into(), Value::String(alt));
    }
    if let Some(custom) = custom {
        for (k, v) in &custom.extra {
            if !header.contains_key(k) {
                header.insert(k.clone(), v.clone());
            }
        }
    }
    Some(header)
}

fn header_type(col: &ColumnDescriptor, custom: Option<&ColumnCustomization>) -> Value {
    custom
        .and_then(|c| c.column_type.clone())
        .unwrap_or_else(|| serde_json::to_value(col.column_type).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{parse_columns, ColumnSelection};
    use crate::testing::registry;
    use serde_json::json;

    fn titles(headers: &[Value]) -> Vec<String> {
        headers.iter().map(|h| h["value"].as_str().unwrap().to_string()).collect()
    }

    #[test]
    fn language_filters_headers() {
        let reg = registry();
        let country = reg.get("country").unwrap();
        let ctx = HeaderContext {
            registry: &reg,
            entity: country,
            lang: "en",
            customizations: None,
            include_hidden: false,
        };
        let headers = build_headers(&ctx, &ColumnSelection::all(country).tokens);
        // name_div is dv-only, code is hidden.
        assert_eq!(titles(&headers), vec!["id", "name_eng"]);
        assert_eq!(headers[0]["title"], json!("Id"));
        assert_eq!(headers[1]["title"], json!("Name"));
        assert_eq!(headers[1]["type"], json!("string"));
        assert!(headers[1].get("lang").is_none());
    }

    #[test]
    fn hidden_columns_can_be_included() {
        let reg = registry();
        let country = reg.get("country").unwrap();
        let ctx = HeaderContext {
            registry: &reg,
            entity: country,
            lang: "dv",
            customizations: None,
            include_hidden: true,
        };
        let headers = build_headers(&ctx, &ColumnSelection::all(country).tokens);
        assert_eq!(titles(&headers), vec!["id", "name_div", "code"]);
        assert_eq!(headers[1]["title"], json!("Nan (dv)"));
        assert_eq!(headers[2]["hidden"], json!(true));
    }

    #[test]
    fn relation_headers_prefer_relation_label() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let sel = parse_columns(&reg, person, Some("country_id.name_eng,entry_type_id.name"))
            .unwrap()
            .unwrap();
        let ctx = HeaderContext {
            registry: &reg,
            entity: person,
            lang: "en",
            customizations: None,
            include_hidden: false,
        };
        let headers = build_headers(&ctx, &sel.tokens);
        assert_eq!(titles(&headers), vec!["country_id.name_eng", "entry_type_id.name"]);
        assert_eq!(headers[0]["title"], json!("Country"));
        assert_eq!(headers[0]["sortable"], json!(true));
        assert_eq!(headers[1]["title"], json!("Entry type"));
    }

    #[test]
    fn customizations_override_and_pass_through() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let custom: HashMap<String, ColumnCustomization> = serde_json::from_value(json!({
            "name": { "title": { "en": "Full name" }, "sortable": false, "width": 200, "value": "ignored" },
            "secret": { "hidden": false },
            "joined_on": { "type": "date-range", "displayType": "calendar" }
        }))
        .unwrap();
        let sel = parse_columns(&reg, person, Some("name,secret,joined_on")).unwrap().unwrap();
        let ctx = HeaderContext {
            registry: &reg,
            entity: person,
            lang: "en",
            customizations: Some(&custom),
            include_hidden: false,
        };
        let headers = build_headers(&ctx, &sel.tokens);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0]["title"], json!("Full name"));
        assert_eq!(headers[0]["sortable"], json!(false));
        assert_eq!(headers[0]["width"], json!(200));
        assert_eq!(headers[0]["value"], json!("name"));
        assert_eq!(headers[1]["hidden"], json!(false));
        assert_eq!(headers[2]["type"], json!("date-range"));
        assert_eq!(headers[2]["displayType"], json!("calendar"));
        assert_eq!(headers[2]["title"], json!("Joined On"));
    }

    #[test]
    fn header_key_order() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let ctx = HeaderContext {
            registry: &reg,
            entity: person,
            lang: "en",
            customizations: None,
            include_hidden: false,
        };
        let sel = parse_columns(&reg, person, Some("joined_on")).unwrap().unwrap();
        let headers = build_headers(&ctx, &sel.tokens);
        let keys: Vec<&String> = headers[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["title", "value", "sortable", "hidden", "type", "displayType"]);
    }
}
