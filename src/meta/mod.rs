//! Response metadata: language resolution, headers, filters and pagination.

pub mod filters;
pub mod headers;
pub mod lang;
pub mod pagination;

pub use filters::{build_filters, FilterContext};
pub use headers::{build_headers, HeaderContext};
pub use lang::{
    filter_tokens_by_lang, is_visible, label_or_headline, pick_header_lang_override, resolve_label,
    unsupported_lang_message,
};
pub use pagination::{resolve_per_page, Pagination};
