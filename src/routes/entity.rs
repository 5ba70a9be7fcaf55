//! Entity routes. The model is a path parameter; handlers resolve it against the registry.

use crate::handlers::entity::{create, delete as delete_handler, list, options, show, update};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

const BODY_LIMIT: usize = 1024 * 1024;

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:model", get(list).post(create))
        .route("/:model/options/:field", get(options))
        .route("/:model/:id", get(show).put(update).delete(delete_handler))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .with_state(state)
}
