//! Layout config: a nested settings tree whose `"on"`/`"off"` leaves mark where built sections go.

use crate::error::{AppError, ConfigError};
use crate::store::{is_valid_key, layout_document_key, DocumentStore};
use serde_json::Value;

/// Sections that can be built into a layout tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Headers,
    Filters,
    Pagination,
    DataLink,
}

impl Section {
    pub fn from_key(key: &str) -> Option<Section> {
        match key {
            "headers" => Some(Section::Headers),
            "filters" => Some(Section::Filters),
            "pagination" => Some(Section::Pagination),
            "datalink" => Some(Section::DataLink),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutNode {
    /// A section key whose leaf is `"on"` (true) or `"off"` (false).
    Toggle(Section, bool),
    Value(Value),
    Branch(Vec<(String, LayoutNode)>),
}

impl LayoutNode {
    /// Parse a layout document. The root must be an object.
    pub fn parse(doc: Value) -> Result<LayoutNode, ConfigError> {
        match doc {
            Value::Object(_) => Ok(Self::from_value(None, doc)),
            other => Err(ConfigError::InvalidDocument {
                key: "layout".into(),
                reason: format!("root must be an object, got {}", other),
            }),
        }
    }

    fn from_value(key: Option<&str>, value: Value) -> LayoutNode {
        match value {
            Value::Object(map) => LayoutNode::Branch(
                map.into_iter()
                    .map(|(k, v)| {
                        let node = Self::from_value(Some(&k), v);
                        (k, node)
                    })
                    .collect(),
            ),
            Value::String(s) => match (key.and_then(Section::from_key), s.as_str()) {
                (Some(section), "on") => LayoutNode::Toggle(section, true),
                (Some(section), "off") => LayoutNode::Toggle(section, false),
                _ => LayoutNode::Value(Value::String(s)),
            },
            other => LayoutNode::Value(other),
        }
    }

    /// Render the tree, asking `build` for the content of every section switched on.
    /// Sections switched off are dropped from their parent.
    pub fn render<F>(&self, build: &mut F) -> Value
    where
        F: FnMut(Section) -> Value,
    {
        match self {
            LayoutNode::Toggle(section, true) => build(*section),
            LayoutNode::Toggle(_, false) => Value::Null,
            LayoutNode::Value(v) => v.clone(),
            LayoutNode::Branch(children) => {
                let mut out = serde_json::Map::new();
                for (k, child) in children {
                    if matches!(child, LayoutNode::Toggle(_, false)) {
                        continue;
                    }
                    out.insert(k.clone(), child.render(build));
                }
                Value::Object(out)
            }
        }
    }
}

/// Load and parse a layout document. `Ok(None)` when the document does not exist.
pub async fn load_layout(store: &dyn DocumentStore, name: &str) -> Result<Option<LayoutNode>, AppError> {
    if !is_valid_key(name) {
        return Err(AppError::InvalidParameter {
            name: "componentSettings",
            reason: format!("'{}' is not a valid layout name", name),
        });
    }
    let key = layout_document_key(name);
    let Some(doc) = store.load(&key).await? else {
        tracing::debug!(key = %key, "layout document not found");
        return Ok(None);
    };
    let node = LayoutNode::parse(doc).map_err(|e| match e {
        ConfigError::InvalidDocument { reason, .. } => ConfigError::InvalidDocument { key, reason },
        other => other,
    })?;
    Ok(Some(node))
}
