//! Query-string parameters for the table-view endpoints. Everything arrives as text so that
//! malformed numbers surface as 422 parameter errors rather than extractor rejections.

use crate::error::AppError;
use crate::query::Direction;
use crate::settings::parse_bool;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub component: Option<String>,
    pub columns: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub with: Option<String>,
    pub lang: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub include_meta: Option<String>,
    #[serde(rename = "componentSettings")]
    pub component_settings: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowParams {
    pub component: Option<String>,
    pub columns: Option<String>,
    pub with: Option<String>,
    pub lang: Option<String>,
    pub include_meta: Option<String>,
    #[serde(rename = "componentSettings")]
    pub component_settings: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsParams {
    #[serde(rename = "itemTitle")]
    pub item_title: Option<String>,
    #[serde(rename = "itemValue")]
    pub item_value: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

/// Treat blank values as absent.
pub(crate) fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_u64(name: &'static str, v: &Option<String>) -> Result<Option<u64>, AppError> {
    present(v)
        .map(|s| {
            s.parse::<u64>().map_err(|_| AppError::InvalidParameter {
                name,
                reason: format!("'{}' is not a non-negative integer", s),
            })
        })
        .transpose()
}

pub(crate) fn parse_flag(name: &'static str, v: &Option<String>) -> Result<Option<bool>, AppError> {
    present(v)
        .map(|s| {
            parse_bool(s).ok_or_else(|| AppError::InvalidParameter {
                name,
                reason: format!("'{}' is not a boolean", s),
            })
        })
        .transpose()
}

pub(crate) fn parse_direction(v: &Option<String>) -> Result<Direction, AppError> {
    match present(v).map(str::to_lowercase).as_deref() {
        None | Some("asc") => Ok(Direction::Asc),
        Some("desc") => Ok(Direction::Desc),
        Some(other) => Err(AppError::InvalidParameter {
            name: "sort",
            reason: format!("'{}' must be asc or desc", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_flags() {
        assert_eq!(parse_u64("page", &Some(" 3 ".into())).unwrap(), Some(3));
        assert_eq!(parse_u64("page", &Some("".into())).unwrap(), None);
        assert!(parse_u64("page", &Some("-1".into())).is_err());
        assert_eq!(parse_flag("include_meta", &Some("off".into())).unwrap(), Some(false));
        assert!(parse_flag("include_meta", &Some("perhaps".into())).is_err());
    }

    #[test]
    fn direction() {
        assert_eq!(parse_direction(&None).unwrap(), Direction::Asc);
        assert_eq!(parse_direction(&Some("DESC".into())).unwrap(), Direction::Desc);
        assert!(parse_direction(&Some("up".into())).is_err());
    }
}
