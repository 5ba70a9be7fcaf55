//! Tableview SDK: schema-driven generic CRUD REST backend for configurable table components.

pub mod case;
pub mod config;
pub mod error;
pub mod handlers;
pub mod meta;
pub mod persistence;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{load_definitions, load_definitions_from_path, resolve, EntityDefinition, Registry, ResolvedEntity};
pub use error::{AppError, ConfigError, DocumentError, QueryError};
pub use persistence::{MemoryRepository, PgRepository, Repository};
pub use routes::{common_routes, entity_routes};
pub use service::{CrudService, TableView};
pub use settings::{RecordShape, ServiceOptions};
pub use state::AppState;
pub use store::{DocumentStore, FileDocumentStore, MemoryDocumentStore, PgDocumentStore};
