//! Example consumer: serves the table-view API over a config directory.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! With `DATABASE_URL` set, records live in PostgreSQL; otherwise in memory, seeded from
//! `{CONFIG_PATH}/seed.json` when present.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tableview_sdk::{
    common_routes, entity_routes, load_definitions_from_path, resolve, AppState, FileDocumentStore,
    MemoryRepository, PgRepository, Repository, ServiceOptions,
};
use tokio::net::TcpListener;

async fn memory_repository(config: &Path) -> Result<MemoryRepository, Box<dyn std::error::Error>> {
    let repo = MemoryRepository::new();
    let seed = config.join("seed.json");
    match tokio::fs::read_to_string(&seed).await {
        Ok(raw) => {
            let tables: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)?;
            for (entity, rows) in tables {
                let rows = match rows {
                    serde_json::Value::Array(rows) => rows,
                    _ => continue,
                };
                tracing::info!(entity = %entity, rows = rows.len(), "seeded");
                repo.insert_rows(&entity, rows);
            }
        }
        Err(e) => tracing::info!(path = %seed.display(), error = %e, "no seed data"),
    }
    Ok(repo)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tableview_sdk=info,example_consumer=info")),
        )
        .init();

    let config = PathBuf::from(
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/config").into()),
    );
    let definitions = load_definitions_from_path(config.join("models.json")).await?;
    let registry = resolve(&definitions)?;
    tracing::info!(entities = registry.entities().len(), "registry loaded");

    let repository: Arc<dyn Repository> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await?;
            Arc::new(PgRepository::new(pool))
        }
        Err(_) => Arc::new(memory_repository(&config).await?),
    };

    let options = ServiceOptions::from_env();
    let prefix = options.api_prefix.clone();
    let state = AppState::new(registry, repository, Arc::new(FileDocumentStore::new(config.clone())), options);

    let app = if prefix.is_empty() {
        common_routes().merge(entity_routes(state))
    } else {
        common_routes().nest(&prefix, entity_routes(state))
    };
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Example consumer listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
