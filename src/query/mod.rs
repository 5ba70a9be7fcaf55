//! Request-to-query compiler: token parsers, relation resolution and the resulting plan.

mod columns;
mod filter;
mod plan;
mod relation;
mod sort;
mod with;

pub use columns::parse_columns;
pub use filter::parse_filters;
pub use plan::*;
pub use relation::{relation_candidates, resolve_relation};
pub use sort::parse_sort;
pub use with::{merge_with, parse_with};
