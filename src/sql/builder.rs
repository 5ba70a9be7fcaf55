//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resolved entity and a query plan.

use crate::config::{Cardinality, ColumnDescriptor, ColumnType, Registry, ResolvedEntity};
use crate::persistence::{Include, OptionsQuery};
use crate::query::{FilterValue, QueryPlan, SortTarget};
use serde_json::{Map, Value};

const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL (safe: only from definitions).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(entity: &ResolvedEntity) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

fn aliased(alias: &str, column: &str) -> String {
    format!("{}.{}", alias, quoted(column))
}

/// Cast applied to text parameters bound for a column.
pub fn column_cast(col: &ColumnDescriptor) -> &'static str {
    let is_uuid = col
        .rules
        .as_ref()
        .and_then(|r| r.format.as_deref())
        .map(|f| f.eq_ignore_ascii_case("uuid"))
        .unwrap_or(false);
    match col.column_type {
        ColumnType::Number => "numeric",
        ColumnType::Date => "date",
        ColumnType::Datetime => "timestamptz",
        ColumnType::Boolean => "boolean",
        ColumnType::Json => "jsonb",
        ColumnType::String if is_uuid => "uuid",
        ColumnType::String => "text",
    }
}

/// Escape LIKE metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn column_list(entity: &ResolvedEntity, alias: &str) -> Vec<String> {
    entity.columns.iter().map(|c| aliased(alias, &c.name)).collect()
}

/// Scalar JSON subquery for one include, recursing into nested includes.
fn include_select(inc: &Include<'_>, parent_alias: &str, depth: usize) -> String {
    let alias = format!("r{}", depth);
    let mut cols = column_list(inc.related, &alias);
    for child in &inc.children {
        cols.push(format!(
            "{} AS {}",
            include_select(child, &alias, depth + 1),
            quoted(&child.relation.name)
        ));
    }
    let inner = format!(
        "SELECT {} FROM {} {} WHERE {} = {}",
        cols.join(", "),
        qualified_table(inc.related),
        alias,
        aliased(&alias, &inc.relation.remote_key),
        aliased(parent_alias, &inc.relation.local_key)
    );
    match inc.relation.cardinality {
        Cardinality::ToOne => format!("(SELECT row_to_json(sub) FROM ({} LIMIT 1) sub)", inner),
        Cardinality::ToMany => format!(
            "(SELECT COALESCE(json_agg(row_to_json(sub)), '[]'::json) FROM ({}) sub)",
            inner
        ),
    }
}

fn select_parts(entity: &ResolvedEntity, includes: &[Include<'_>]) -> String {
    let mut parts = column_list(entity, MAIN_ALIAS);
    for inc in includes {
        parts.push(format!(
            "{} AS {}",
            include_select(inc, MAIN_ALIAS, 1),
            quoted(&inc.relation.name)
        ));
    }
    parts.join(", ")
}

fn where_clause(q: &mut QueryBuf, plan: &QueryPlan) -> String {
    let mut parts = Vec::new();
    for f in &plan.filters {
        let (op, value) = match &f.value {
            FilterValue::Exact(v) => ("=", v),
            FilterValue::Like(p) => ("LIKE", p),
        };
        let n = q.push_param(Value::String(value.clone()));
        parts.push(format!("{}::text {} ${}::text", aliased(MAIN_ALIAS, &f.column), op, n));
    }
    if let Some(search) = plan.search.as_ref().filter(|s| !s.columns.is_empty()) {
        let n = q.push_param(Value::String(format!("%{}%", escape_like(&search.term))));
        let ors: Vec<String> = search
            .columns
            .iter()
            .map(|c| format!("{}::text ILIKE ${}::text", aliased(MAIN_ALIAS, c), n))
            .collect();
        parts.push(format!("({})", ors.join(" OR ")));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn order_clause(registry: &Registry, entity: &ResolvedEntity, plan: &QueryPlan) -> String {
    let mut parts = Vec::new();
    for s in &plan.sorts {
        let expr = match &s.target {
            SortTarget::Column(c) => aliased(MAIN_ALIAS, c),
            SortTarget::Related { relation, field } => {
                let Some(rel) = entity.relation(relation) else { continue };
                let Some(related) = registry.related(rel) else { continue };
                let (pick, limit) = match rel.cardinality {
                    Cardinality::ToOne => (aliased("s", field), " LIMIT 1"),
                    Cardinality::ToMany => (format!("MIN({}::text)", aliased("s", field)), ""),
                };
                format!(
                    "(SELECT {} FROM {} s WHERE {} = {}{})",
                    pick,
                    qualified_table(related),
                    aliased("s", &rel.remote_key),
                    aliased(MAIN_ALIAS, &rel.local_key),
                    limit
                )
            }
        };
        parts.push(format!("{} {}", expr, s.direction.as_sql()));
    }
    parts.push(format!("{} ASC", aliased(MAIN_ALIAS, &entity.primary_key)));
    format!(" ORDER BY {}", parts.join(", "))
}

/// One page of rows with includes as JSON subqueries.
pub fn select_page(
    registry: &Registry,
    entity: &ResolvedEntity,
    plan: &QueryPlan,
    includes: &[Include<'_>],
    limit: u64,
    offset: u64,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, plan);
    q.sql = format!(
        "SELECT {} FROM {} {}{}{} LIMIT {} OFFSET {}",
        select_parts(entity, includes),
        qualified_table(entity),
        MAIN_ALIAS,
        where_sql,
        order_clause(registry, entity, plan),
        limit,
        offset
    );
    q
}

/// Total rows matching the plan's filters and search.
pub fn count(entity: &ResolvedEntity, plan: &QueryPlan) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, plan);
    q.sql = format!(
        "SELECT COUNT(*) FROM {} {}{}",
        qualified_table(entity),
        MAIN_ALIAS,
        where_sql
    );
    q
}

fn pk_placeholder(entity: &ResolvedEntity, n: usize) -> String {
    let cast = entity.column(&entity.primary_key).map(column_cast).unwrap_or("text");
    format!("${}::{}", n, cast)
}

/// SELECT by primary key with includes. Id is the sole param.
pub fn select_by_id(entity: &ResolvedEntity, id: &Value, includes: &[Include<'_>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone());
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {} = {}",
        select_parts(entity, includes),
        qualified_table(entity),
        MAIN_ALIAS,
        aliased(MAIN_ALIAS, &entity.primary_key),
        pk_placeholder(entity, n)
    );
    q
}

fn returning(entity: &ResolvedEntity) -> String {
    entity.columns.iter().map(|c| quoted(&c.name)).collect::<Vec<_>>().join(", ")
}

/// INSERT the declared columns present in body; absent ones get the database default.
pub fn insert(entity: &ResolvedEntity, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        let Some(val) = body.get(&c.name) else { continue };
        let n = q.push_param(val.clone());
        cols.push(quoted(&c.name));
        placeholders.push(format!("${}::{}", n, column_cast(c)));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            qualified_table(entity),
            returning(entity)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(entity),
            cols.join(", "),
            placeholders.join(", "),
            returning(entity)
        )
    };
    q
}

/// UPDATE by id: SET only declared, non-key columns present in body.
pub fn update(entity: &ResolvedEntity, id: &Value, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.name == entity.primary_key {
            continue;
        }
        let Some(val) = body.get(&c.name) else { continue };
        let n = q.push_param(val.clone());
        sets.push(format!("{} = ${}::{}", quoted(&c.name), n, column_cast(c)));
    }
    let table = qualified_table(entity);
    let id_param = q.push_param(id.clone());
    q.sql = if sets.is_empty() {
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            returning(entity),
            table,
            quoted(&entity.primary_key),
            pk_placeholder(entity, id_param)
        )
    } else {
        format!(
            "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
            table,
            sets.join(", "),
            quoted(&entity.primary_key),
            pk_placeholder(entity, id_param),
            returning(entity)
        )
    };
    q
}

/// DELETE by id.
pub fn delete(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(entity),
        quoted(&entity.primary_key),
        pk_placeholder(entity, n),
        quoted(&entity.primary_key)
    );
    q
}

/// Distinct values (or value/title pairs) of one column for lookup lists.
pub fn select_options(entity: &ResolvedEntity, query: &OptionsQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let value = quoted(&query.value_column);
    let limit = query.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let dir = query.direction.as_sql();
    q.sql = match &query.title_column {
        Some(title) => format!(
            "SELECT {value} AS value, MIN({title}::text) AS title FROM {table} WHERE {value} IS NOT NULL \
             GROUP BY {value} ORDER BY title {dir}, value {dir}{limit}",
            value = value,
            title = quoted(title),
            table = table,
            dir = dir,
            limit = limit
        ),
        None => format!(
            "SELECT DISTINCT {value} AS value FROM {table} WHERE {value} IS NOT NULL ORDER BY value {dir}{limit}",
            value = value,
            table = table,
            dir = dir,
            limit = limit
        ),
    };
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::include_tree;
    use crate::query::{Direction, FilterDirective, Search, SortDirective};
    use crate::testing::registry;
    use serde_json::json;

    #[test]
    fn page_with_filters_search_sort_and_includes() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let plan = QueryPlan {
            filters: vec![
                FilterDirective {
                    column: "status".into(),
                    value: FilterValue::Like("%act%".into()),
                },
                FilterDirective {
                    column: "country_id".into(),
                    value: FilterValue::Exact("3".into()),
                },
            ],
            search: Some(Search {
                term: "50%_off".into(),
                columns: vec!["name".into()],
            }),
            with: vec!["country".into()],
            sorts: vec![SortDirective {
                target: SortTarget::Related {
                    relation: "country".into(),
                    field: "name_eng".into(),
                },
                direction: Direction::Desc,
            }],
        };
        let includes = include_tree(&reg, person, &plan.with).unwrap();
        let q = select_page(&reg, person, &plan, &includes, 10, 20);
        assert!(q.sql.starts_with("SELECT main.\"id\", main.\"name\""));
        assert!(q.sql.contains(
            "(SELECT row_to_json(sub) FROM (SELECT r1.\"id\", r1.\"name_eng\", r1.\"name_div\", r1.\"code\" \
             FROM \"public\".\"country\" r1 WHERE r1.\"id\" = main.\"country_id\" LIMIT 1) sub) AS \"country\""
        ));
        assert!(q.sql.contains(
            " WHERE main.\"status\"::text LIKE $1::text AND main.\"country_id\"::text = $2::text \
             AND (main.\"name\"::text ILIKE $3::text)"
        ));
        assert!(q.sql.contains(
            " ORDER BY (SELECT s.\"name_eng\" FROM \"public\".\"country\" s WHERE s.\"id\" = main.\"country_id\" LIMIT 1) DESC, main.\"id\" ASC"
        ));
        assert!(q.sql.ends_with(" LIMIT 10 OFFSET 20"));
        assert_eq!(q.params, vec![json!("%act%"), json!("3"), json!("%50\\%\\_off%")]);
    }

    #[test]
    fn nested_to_many_include() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let includes = include_tree(&reg, person, &["country.people".to_string()]).unwrap();
        let q = select_by_id(person, &json!(7), &includes);
        assert!(q.sql.contains(
            "(SELECT COALESCE(json_agg(row_to_json(sub)), '[]'::json) FROM (SELECT r2.\"id\""
        ));
        assert!(q.sql.contains("WHERE r2.\"country_id\" = r1.\"id\") sub) AS \"people\""));
        assert!(q.sql.ends_with("WHERE main.\"id\" = $1::numeric"));
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn count_shares_where_clause() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let plan = QueryPlan {
            filters: vec![FilterDirective {
                column: "status".into(),
                value: FilterValue::Exact("active".into()),
            }],
            ..Default::default()
        };
        let q = count(person, &plan);
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM \"public\".\"person\" main WHERE main.\"status\"::text = $1::text"
        );
    }

    #[test]
    fn insert_update_delete() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let body: Map<String, Value> = serde_json::from_value(json!({ "name": "Ali", "joined_on": "2024-01-01" })).unwrap();
        let q = insert(person, &body);
        assert!(q.sql.starts_with(
            "INSERT INTO \"public\".\"person\" (\"name\", \"joined_on\") VALUES ($1::text, $2::date) RETURNING \"id\""
        ));

        let body: Map<String, Value> = serde_json::from_value(json!({ "id": 9, "status": "retired" })).unwrap();
        let q = update(person, &json!(4), &body);
        assert!(q.sql.starts_with(
            "UPDATE \"public\".\"person\" SET \"status\" = $1::text WHERE \"id\" = $2::numeric RETURNING"
        ));
        assert_eq!(q.params, vec![json!("retired"), json!(4)]);

        let q = update(person, &json!(4), &Map::new());
        assert!(q.sql.starts_with("SELECT"));

        let q = delete(person, &json!(4));
        assert_eq!(
            q.sql,
            "DELETE FROM \"public\".\"person\" WHERE \"id\" = $1::numeric RETURNING \"id\""
        );
    }

    #[test]
    fn options_queries() {
        let reg = registry();
        let country = reg.get("country").unwrap();
        let q = select_options(
            country,
            &OptionsQuery {
                value_column: "id".into(),
                title_column: Some("name_eng".into()),
                direction: Direction::Asc,
                limit: Some(5),
            },
        );
        assert_eq!(
            q.sql,
            "SELECT \"id\" AS value, MIN(\"name_eng\"::text) AS title FROM \"public\".\"country\" WHERE \"id\" IS NOT NULL \
             GROUP BY \"id\" ORDER BY title ASC, value ASC LIMIT 5"
        );
        let q = select_options(
            country,
            &OptionsQuery {
                value_column: "code".into(),
                title_column: None,
                direction: Direction::Desc,
                limit: None,
            },
        );
        assert_eq!(
            q.sql,
            "SELECT DISTINCT \"code\" AS value FROM \"public\".\"country\" WHERE \"code\" IS NOT NULL ORDER BY value DESC"
        );
    }
}
