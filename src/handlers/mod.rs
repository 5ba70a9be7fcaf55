//! HTTP handlers for the entity endpoints.

pub mod entity;
pub use entity::*;
