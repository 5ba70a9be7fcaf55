//! Shared application state for all routes. Registry and options are fixed at start-up;
//! documents are re-read on every request.

use crate::config::Registry;
use crate::persistence::Repository;
use crate::service::{CrudService, TableView};
use crate::settings::ServiceOptions;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub repository: Arc<dyn Repository>,
    pub documents: Arc<dyn DocumentStore>,
    pub options: Arc<ServiceOptions>,
}

impl AppState {
    pub fn new(
        registry: Registry,
        repository: Arc<dyn Repository>,
        documents: Arc<dyn DocumentStore>,
        options: ServiceOptions,
    ) -> Self {
        AppState {
            registry: Arc::new(registry),
            repository,
            documents,
            options: Arc::new(options),
        }
    }

    pub fn table_view(&self) -> TableView<'_> {
        TableView {
            registry: &self.registry,
            repository: self.repository.as_ref(),
            documents: self.documents.as_ref(),
            options: &self.options,
        }
    }

    pub fn crud(&self) -> CrudService<'_> {
        CrudService {
            registry: &self.registry,
            repository: self.repository.as_ref(),
            options: &self.options,
        }
    }
}
