//! Per-entity view config documents: which component shows which columns, in which languages.

use crate::config::Label;
use crate::error::{AppError, ConfigError};
use crate::store::{view_document_key, DocumentStore};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Per-token header overrides. Unknown keys are kept and passed through to the header.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCustomization {
    #[serde(default)]
    pub title: Option<Label>,
    #[serde(default)]
    pub sortable: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(rename = "type", default)]
    pub column_type: Option<Value>,
    #[serde(default)]
    pub display_type: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    /// Default column tokens when the request has no `columns`.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Language allow-list. Absent or empty admits no language.
    #[serde(default)]
    pub lang: Option<Vec<String>>,
    /// Filter allow-list. Absent means no restriction.
    #[serde(default)]
    pub filters: Option<Vec<String>>,
    #[serde(default)]
    pub column_customizations: HashMap<String, ColumnCustomization>,
    #[serde(default, alias = "per_page")]
    pub per_page: Option<u64>,
}

impl ComponentConfig {
    pub fn allows_lang(&self, lang: &str) -> bool {
        self.lang
            .as_deref()
            .map(|langs| langs.iter().any(|l| l == lang))
            .unwrap_or(false)
    }

    /// Default columns as a comma-joined token string, if any are declared.
    pub fn default_columns(&self) -> Option<String> {
        self.columns
            .as_ref()
            .filter(|cols| cols.iter().any(|c| !c.trim().is_empty()))
            .map(|cols| cols.join(","))
    }
}

/// A view config document: component key -> component config.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ViewConfig {
    pub components: HashMap<String, ComponentConfig>,
}

impl ViewConfig {
    pub fn component(&self, key: &str) -> Option<&ComponentConfig> {
        self.components.get(key)
    }
}

/// Load the view config document for `model` and pick `component` from it.
/// A missing document or a missing component key is a client error.
pub async fn load_component(
    store: &dyn DocumentStore,
    model: &str,
    component: &str,
) -> Result<ComponentConfig, AppError> {
    let key = view_document_key(model);
    let doc = store
        .load(&key)
        .await?
        .ok_or_else(|| AppError::ViewConfigNotFound(model.to_string()))?;
    let mut view: ViewConfig = serde_json::from_value(doc).map_err(|e| ConfigError::InvalidDocument {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    tracing::debug!(model = %model, component = %component, "view config loaded");
    view.components
        .remove(component)
        .ok_or_else(|| AppError::ComponentNotFound(component.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::new().with(
            "views/person",
            json!({
                "table": {
                    "columns": ["id", "name"],
                    "lang": ["en", "dv"],
                    "filters": ["status"],
                    "per_page": 10,
                    "columnCustomizations": {
                        "name": { "title": "Full name", "sortable": false, "width": 200 }
                    }
                },
                "bare": {}
            }),
        )
    }

    #[tokio::test]
    async fn loads_component() {
        let c = load_component(&store(), "person", "table").await.unwrap();
        assert_eq!(c.default_columns().as_deref(), Some("id,name"));
        assert_eq!(c.per_page, Some(10));
        assert!(c.allows_lang("dv"));
        assert!(!c.allows_lang("fr"));
        let custom = &c.column_customizations["name"];
        assert_eq!(custom.sortable, Some(false));
        assert_eq!(custom.extra.get("width"), Some(&json!(200)));
        assert!(!custom.extra.contains_key("title"));
    }

    #[tokio::test]
    async fn missing_lang_rejects_every_language() {
        let c = load_component(&store(), "person", "bare").await.unwrap();
        assert!(!c.allows_lang("en"));
        assert!(c.default_columns().is_none());
    }

    #[tokio::test]
    async fn missing_document_or_component_is_client_error() {
        let err = load_component(&store(), "country", "table").await.unwrap_err();
        assert!(matches!(err, AppError::ViewConfigNotFound(_)));
        let err = load_component(&store(), "person", "grid").await.unwrap_err();
        assert!(matches!(err, AppError::ComponentNotFound(_)));
        assert_eq!(err.to_string(), "component key not found in view config");
    }
}
