//! Validated query directives handed to the persistence layer.

use crate::config::{ColumnDescriptor, Registry, ResolvedEntity};
use std::fmt;

/// One parsed column-subset token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnToken {
    Plain(String),
    /// `alias.field`; `alias` is kept as written, `relation` is what it resolved to.
    Related {
        alias: String,
        relation: String,
        field: String,
    },
}

impl ColumnToken {
    pub fn relation(&self) -> Option<&str> {
        match self {
            ColumnToken::Plain(_) => None,
            ColumnToken::Related { relation, .. } => Some(relation),
        }
    }

    /// The column this token points at, on the entity itself or on the related entity.
    pub fn column<'a>(&self, registry: &'a Registry, entity: &'a ResolvedEntity) -> Option<&'a ColumnDescriptor> {
        match self {
            ColumnToken::Plain(name) => entity.column(name),
            ColumnToken::Related { relation, field, .. } => entity
                .relation(relation)
                .and_then(|r| registry.related(r))
                .and_then(|related| related.column(field)),
        }
    }
}

impl fmt::Display for ColumnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnToken::Plain(name) => f.write_str(name),
            ColumnToken::Related { alias, field, .. } => write!(f, "{}.{}", alias, field),
        }
    }
}

/// Ordered column tokens plus the distinct relations they imply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    pub tokens: Vec<ColumnToken>,
    pub relations: Vec<String>,
}

impl ColumnSelection {
    /// Every declared column of `entity`, in declaration order.
    pub fn all(entity: &ResolvedEntity) -> Self {
        ColumnSelection {
            tokens: entity.column_names().map(|n| ColumnToken::Plain(n.to_string())).collect(),
            relations: Vec::new(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.to_string() == token)
    }

    pub fn find(&self, token: &str) -> Option<&ColumnToken> {
        self.tokens.iter().find(|t| t.to_string() == token)
    }

    /// Comma-joined token text.
    pub fn joined(&self) -> String {
        self.tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Exact(String),
    /// SQL LIKE pattern (`%` wildcards).
    Like(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterDirective {
    pub column: String,
    pub value: FilterValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortTarget {
    Column(String),
    Related { relation: String, field: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDirective {
    pub target: SortTarget,
    pub direction: Direction,
}

/// Case-insensitive "contains" over the entity's searchable columns, OR-ed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Search {
    pub term: String,
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub filters: Vec<FilterDirective>,
    pub search: Option<Search>,
    /// Eager-load paths; the first segment is a resolved relation name, the rest is passed through.
    pub with: Vec<String>,
    pub sorts: Vec<SortDirective>,
}
