//! Page-size resolution and the pagination block.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl Pagination {
    pub fn new(total: u64, per_page: u64, current_page: u64, returned: usize) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if returned == 0 {
            (None, None)
        } else {
            let from = (current_page - 1) * per_page + 1;
            (Some(from), Some(from + returned as u64 - 1))
        };
        Pagination {
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
        }
    }
}

/// Request value, else component default, else service fallback; capped at `max`.
pub fn resolve_per_page(requested: Option<u64>, component_default: Option<u64>, fallback: u64, max: u64) -> u64 {
    requested
        .filter(|&n| n > 0)
        .or(component_default.filter(|&n| n > 0))
        .unwrap_or(fallback)
        .min(max)
        .max(1)
}
