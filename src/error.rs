//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Problems in entity definitions or configuration documents. Raised while building the
/// registry at startup, or when a stored document has the wrong shape.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate entity type: {0}")]
    DuplicateEntity(String),
    #[error("duplicate column '{column}' on entity type '{entity}'")]
    DuplicateColumn { entity: String, column: String },
    #[error("invalid primary key: entity {entity} column {column}")]
    InvalidPrimaryKey { entity: String, column: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("invalid document '{key}': {reason}")]
    InvalidDocument { key: String, reason: String },
}

/// Token parser failures. Always a client error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid relation '{segment}' in column token '{token}'")]
    InvalidToken { token: String, segment: String },
    #[error("Column '{column}' does not exist on model '{model}'")]
    UnknownColumn { model: String, column: String },
    #[error("Invalid filter segment '{0}', expected field:value")]
    InvalidFilterSegment(String),
    #[error("Filter field '{0}' does not exist")]
    UnknownFilterField(String),
    #[error("Filter field '{0}' is not allowed for this component")]
    FilterNotAllowed(String),
    #[error("Sort field '{0}' is not allowed")]
    UnknownSortField(String),
    #[error("Relation '{relation}' is not defined on model '{model}'")]
    InvalidRelation { model: String, relation: String },
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document io '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("document parse '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Model '{0}' not found or missing schema")]
    ModelNotFound(String),
    #[error("The {0} parameter is required")]
    MissingParameter(&'static str),
    #[error("The {name} parameter is invalid: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("view config not found for model '{0}'")]
    ViewConfigNotFound(String),
    #[error("component key not found in view config")]
    ComponentNotFound(String),
    #[error("no columns requested and component '{0}' declares no default columns")]
    NoColumns(String),
    #[error("Record '{0}' not found")]
    NotFound(String),
    #[error("The given data was invalid")]
    Validation(BTreeMap<String, Vec<String>>),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("persistence: {0}")]
    Persistence(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Query(_)
            | AppError::ModelNotFound(_)
            | AppError::MissingParameter(_)
            | AppError::InvalidParameter { .. }
            | AppError::ViewConfigNotFound(_)
            | AppError::ComponentNotFound(_)
            | AppError::NoColumns(_)
            | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Document(_) | AppError::Db(_) | AppError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let errors = match &self {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}
