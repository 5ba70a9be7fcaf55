//! Configuration document stores. Documents are JSON values addressed by a string key
//! such as `views/person` or `layouts/table`. Every request re-reads what it needs.

use crate::error::DocumentError;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

/// Key of the view config document for an entity type.
pub fn view_document_key(model: &str) -> String {
    format!("views/{}", model)
}

/// Key of a layout config document.
pub fn layout_document_key(name: &str) -> String {
    format!("layouts/{}", name)
}

/// Document keys come partly from query strings; only plain path-like keys are accepted.
pub fn is_valid_key(key: &str) -> bool {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    let re = KEY_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+(/[A-Za-z0-9_\-]+)*$").expect("static regex"));
    re.is_match(key)
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document by key. `Ok(None)` when it does not exist.
    async fn load(&self, key: &str) -> Result<Option<Value>, DocumentError>;
}

/// Directory of `{key}.json` files.
#[derive(Clone, Debug)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileDocumentStore { root: root.into() }
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<Value>, DocumentError> {
        if !is_valid_key(key) {
            tracing::warn!(key = %key, "rejected document key");
            return Ok(None);
        }
        let path = self.root.join(format!("{}.json", key));
        tracing::debug!(path = %path.display(), "load document");
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DocumentError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        };
        let doc = serde_json::from_str(&raw).map_err(|source| DocumentError::Parse {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(doc))
    }
}

/// In-process documents; used by tests and for embedding.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, doc: Value) -> Self {
        self.put(key, doc);
        self
    }

    pub fn put(&self, key: impl Into<String>, doc: Value) {
        let mut guard = self.docs.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(key.into(), doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<Value>, DocumentError> {
        let guard = self.docs.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.get(key).cloned())
    }
}

/// Schema name for the documents table. From env `TABLEVIEW_SCHEMA`, default `tableview`.
pub fn tableview_schema() -> String {
    std::env::var("TABLEVIEW_SCHEMA").unwrap_or_else(|_| "tableview".into())
}

/// Returns schema-qualified table name (e.g. "tableview._sys_documents").
pub fn qualified_sys_table(table: &str) -> String {
    format!("{}.{}", tableview_schema(), table)
}

/// Documents kept in `{TABLEVIEW_SCHEMA}._sys_documents`.
#[derive(Clone, Debug)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PgDocumentStore { pool }
    }

    /// Create the schema and documents table if they do not exist.
    pub async fn ensure_table(&self) -> Result<(), DocumentError> {
        let schema = tableview_schema();
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .execute(&self.pool)
            .await?;
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key TEXT PRIMARY KEY,
                payload JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            qualified_sys_table("_sys_documents")
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert or replace a document.
    pub async fn put(&self, key: &str, doc: &Value) -> Result<(), DocumentError> {
        let sql = format!(
            "INSERT INTO {} (key, payload) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()",
            qualified_sys_table("_sys_documents")
        );
        tracing::debug!(sql = %sql, key = %key, "query");
        sqlx::query(&sql).bind(key).bind(doc).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<Value>, DocumentError> {
        let sql = format!("SELECT payload FROM {} WHERE key = $1", qualified_sys_table("_sys_documents"));
        tracing::debug!(sql = %sql, key = %key, "query");
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
