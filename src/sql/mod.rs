//! SQL generation for PostgreSQL.

pub mod builder;
pub mod params;

pub use builder::{column_cast, count, delete, insert, select_by_id, select_options, select_page, update, QueryBuf};
pub use params::PgBindValue;
