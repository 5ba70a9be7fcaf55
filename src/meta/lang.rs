//! Language resolution: column visibility, label selection and the alternate-language hint.

use crate::case::headline;
use crate::config::{Label, Registry, ResolvedEntity};
use crate::query::ColumnToken;

pub const FALLBACK_LANG: &str = "en";
const SECONDARY_LANG: &str = "dv";

/// A column with no declared language set is visible in every language.
pub fn is_visible(langs: Option<&[String]>, lang: &str) -> bool {
    langs.map(|l| l.iter().any(|x| x == lang)).unwrap_or(true)
}

/// Keep only tokens whose column is meaningful in `lang`. Order is preserved.
pub fn filter_tokens_by_lang(
    registry: &Registry,
    entity: &ResolvedEntity,
    tokens: &[ColumnToken],
    lang: &str,
) -> Vec<ColumnToken> {
    tokens
        .iter()
        .filter(|t| {
            t.column(registry, entity)
                .map(|c| is_visible(c.lang.as_deref(), lang))
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}

/// Pick label text: exact language, then `en`, then (when `first_entry`) the first declared entry.
pub fn resolve_label(label: Option<&Label>, lang: &str, first_entry: bool) -> Option<String> {
    match label? {
        Label::Plain(s) => Some(s.clone()),
        l @ Label::Localized(_) => l
            .get(lang)
            .or_else(|| l.get(FALLBACK_LANG))
            .or_else(|| if first_entry { l.first() } else { None })
            .map(str::to_string),
    }
}

/// Label text with the full fallback chain, ending in a title-cased field name.
pub fn label_or_headline(label: Option<&Label>, lang: &str, field: &str) -> String {
    resolve_label(label, lang, true).unwrap_or_else(|| headline(field))
}

/// Suggest one alternate language for a column declared in `langs`, given the current request language.
pub fn pick_header_lang_override(langs: Option<&[String]>, current: &str) -> Option<String> {
    let langs = langs.filter(|l| !l.is_empty())?;
    let has = |code: &str| langs.iter().any(|l| l == code);
    if has(current) {
        if langs.len() < 2 {
            return None;
        }
        let preferred = match current {
            FALLBACK_LANG => Some(SECONDARY_LANG),
            SECONDARY_LANG => Some(FALLBACK_LANG),
            _ => None,
        };
        return match preferred.filter(|p| has(p)) {
            Some(p) => Some(p.to_string()),
            None => langs.iter().find(|l| l.as_str() != current).cloned(),
        };
    }
    if has(FALLBACK_LANG) {
        Some(FALLBACK_LANG.to_string())
    } else if has(SECONDARY_LANG) {
        Some(SECONDARY_LANG.to_string())
    } else {
        langs.first().cloned()
    }
}

/// Message of the soft-fail response for a language outside a component's allow-list.
pub fn unsupported_lang_message(lang: &str) -> String {
    format!("Language '{}' not supported by view config", lang)
}
