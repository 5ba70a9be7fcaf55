//! Standard response envelope helpers.

use crate::service::Assembled;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
}

/// Language-gate soft failure: a valid request with nothing to show in this language.
#[derive(Serialize)]
pub struct SoftEmpty {
    pub message: String,
    pub data: Vec<serde_json::Value>,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    (StatusCode::OK, Json(SuccessMany { data }))
}

impl IntoResponse for Assembled {
    fn into_response(self) -> Response {
        match self {
            Assembled::Body(body) => (StatusCode::OK, Json(body)).into_response(),
            Assembled::LanguageUnsupported { message } => {
                (StatusCode::OK, Json(SoftEmpty { message, data: Vec::new() })).into_response()
            }
        }
    }
}
