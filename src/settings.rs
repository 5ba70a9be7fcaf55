//! Service-level options. Passed into the assembler on every request; nothing here is global state.

use std::str::FromStr;

/// How relation-qualified tokens appear in output records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordShape {
    /// `"country_id.name_eng": "Maldives"`
    #[default]
    Flat,
    /// `"country_id": { "name_eng": "Maldives" }`
    Nested,
}

impl FromStr for RecordShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(RecordShape::Flat),
            "nested" => Ok(RecordShape::Nested),
            other => Err(format!("unknown record shape '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceOptions {
    pub default_lang: String,
    pub default_per_page: u64,
    pub max_per_page: u64,
    pub include_hidden_columns_in_headers: bool,
    pub top_level_headers: bool,
    pub top_level_filters: bool,
    pub top_level_pagination: bool,
    pub record_shape: RecordShape,
    /// Prefix the entity routes are mounted under; used in generated links.
    pub api_prefix: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        ServiceOptions {
            default_lang: "en".into(),
            default_per_page: 25,
            max_per_page: 1000,
            include_hidden_columns_in_headers: false,
            top_level_headers: false,
            top_level_filters: false,
            top_level_pagination: false,
            record_shape: RecordShape::Flat,
            api_prefix: "/api".into(),
        }
    }
}

impl ServiceOptions {
    /// Read `TABLEVIEW_*` variables over the defaults. Malformed values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = ServiceOptions::default();
        if let Some(v) = lookup("TABLEVIEW_DEFAULT_LANG").filter(|v| !v.trim().is_empty()) {
            opts.default_lang = v.trim().to_string();
        }
        parse_into(&lookup, "TABLEVIEW_DEFAULT_PER_PAGE", &mut opts.default_per_page);
        parse_into(&lookup, "TABLEVIEW_MAX_PER_PAGE", &mut opts.max_per_page);
        parse_into(
            &lookup,
            "TABLEVIEW_INCLUDE_HIDDEN_HEADERS",
            &mut opts.include_hidden_columns_in_headers,
        );
        parse_into(&lookup, "TABLEVIEW_TOP_LEVEL_HEADERS", &mut opts.top_level_headers);
        parse_into(&lookup, "TABLEVIEW_TOP_LEVEL_FILTERS", &mut opts.top_level_filters);
        parse_into(&lookup, "TABLEVIEW_TOP_LEVEL_PAGINATION", &mut opts.top_level_pagination);
        parse_into(&lookup, "TABLEVIEW_RECORD_SHAPE", &mut opts.record_shape);
        if let Some(v) = lookup("TABLEVIEW_API_PREFIX") {
            opts.api_prefix = v.trim_end_matches('/').to_string();
        }
        opts
    }
}

fn parse_into<T, F>(lookup: &F, key: &str, slot: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key = %key, value = %raw, "ignoring malformed setting"),
    }
}

/// Parse a boolean query value: true/false/1/0/yes/no/on/off.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let o = ServiceOptions::default();
        assert_eq!(o.default_per_page, 25);
        assert_eq!(o.default_lang, "en");
        assert!(!o.top_level_headers);
        assert_eq!(o.record_shape, RecordShape::Flat);
    }

    #[test]
    fn reads_lookup_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("TABLEVIEW_DEFAULT_PER_PAGE", "50"),
            ("TABLEVIEW_MAX_PER_PAGE", "lots"),
            ("TABLEVIEW_TOP_LEVEL_PAGINATION", "true"),
            ("TABLEVIEW_RECORD_SHAPE", "Nested"),
            ("TABLEVIEW_API_PREFIX", "/v2/"),
        ]
        .into_iter()
        .collect();
        let o = ServiceOptions::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(o.default_per_page, 50);
        assert_eq!(o.max_per_page, 1000);
        assert!(o.top_level_pagination);
        assert_eq!(o.record_shape, RecordShape::Nested);
        assert_eq!(o.api_prefix, "/v2");
    }

    #[test]
    fn bool_values() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
