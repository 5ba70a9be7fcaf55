//! In-process repository over JSON rows. Filter and sort semantics follow the PostgreSQL
//! repository: values compare as text, nulls sort last ascending.

use super::{include_tree, Include, OptionsQuery, Page, Repository};
use crate::config::{Cardinality, PkType, Registry, ResolvedEntity};
use crate::error::AppError;
use crate::query::{Direction, FilterValue, QueryPlan, SortTarget};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

type Row = Map<String, Value>;

#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to an entity's table. Non-object values are skipped.
    pub fn insert_rows(&self, entity: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let table = tables.entry(entity.to_lowercase()).or_default();
        table.extend(rows.into_iter().filter_map(|v| match v {
            Value::Object(m) => Some(m),
            _ => None,
        }));
    }

    pub fn with_rows(self, entity: &str, rows: impl IntoIterator<Item = Value>) -> Self {
        self.insert_rows(entity, rows);
        self
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Row>>> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<Row>>> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Text form used for comparisons; null has none.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn same_key(a: &Value, b: &Value) -> bool {
    match (as_text(a), as_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Compile a LIKE pattern (`%`, `_`, `\` escape) into an anchored regex.
fn like_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            '\\' => re.push_str(&regex::escape(&chars.next().unwrap_or('\\').to_string())),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

#[cfg(test)]
fn like(pattern: &str, text: &str) -> bool {
    like_regex(pattern).is_some_and(|re| re.is_match(text))
}

/// `likes` holds the compiled pattern for each `Like` filter, index-aligned with `plan.filters`.
fn matches(row: &Row, plan: &QueryPlan, likes: &[Option<Regex>]) -> bool {
    let filters_ok = plan.filters.iter().zip(likes).all(|(f, re)| {
        let Some(text) = row.get(&f.column).and_then(as_text) else {
            return false;
        };
        match &f.value {
            FilterValue::Exact(v) => &text == v,
            FilterValue::Like(_) => re.as_ref().is_some_and(|re| re.is_match(&text)),
        }
    });
    if !filters_ok {
        return false;
    }
    match &plan.search {
        Some(search) if !search.columns.is_empty() => {
            let needle = search.term.to_lowercase();
            search.columns.iter().any(|c| {
                row.get(c)
                    .and_then(as_text)
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        }
        _ => true,
    }
}

/// Null is greatest, matching PostgreSQL's default NULLS LAST for ascending order.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => as_text(a).cmp(&as_text(b)),
    }
}

fn related_rows<'t>(
    tables: &'t HashMap<String, Vec<Row>>,
    related: &str,
    remote_key: &str,
    local: &Value,
) -> impl Iterator<Item = &'t Row> {
    let local = local.clone();
    let remote_key = remote_key.to_string();
    tables
        .get(related)
        .into_iter()
        .flatten()
        .filter(move |r| r.get(&remote_key).map(|v| same_key(v, &local)).unwrap_or(false))
}

fn sort_key(tables: &HashMap<String, Vec<Row>>, registry: &Registry, entity: &ResolvedEntity, row: &Row, target: &SortTarget) -> Value {
    match target {
        SortTarget::Column(c) => row.get(c).cloned().unwrap_or(Value::Null),
        SortTarget::Related { relation, field } => {
            let Some(rel) = entity.relation(relation) else { return Value::Null };
            let Some(related) = registry.related(rel) else { return Value::Null };
            let local = row.get(&rel.local_key).cloned().unwrap_or(Value::Null);
            let mut found = related_rows(tables, &related.name, &rel.remote_key, &local)
                .map(|r| r.get(field).cloned().unwrap_or(Value::Null));
            match rel.cardinality {
                Cardinality::ToOne => found.next().unwrap_or(Value::Null),
                Cardinality::ToMany => found
                    .filter_map(|v| as_text(&v))
                    .min()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            }
        }
    }
}

/// Project a stored row onto the declared columns, then attach includes recursively.
fn materialize(tables: &HashMap<String, Vec<Row>>, entity: &ResolvedEntity, row: &Row, includes: &[Include<'_>]) -> Value {
    let mut out = Map::new();
    for c in &entity.columns {
        out.insert(c.name.clone(), row.get(&c.name).cloned().unwrap_or(Value::Null));
    }
    for inc in includes {
        let local = row.get(&inc.relation.local_key).cloned().unwrap_or(Value::Null);
        let mut found = related_rows(tables, &inc.related.name, &inc.relation.remote_key, &local)
            .map(|r| materialize(tables, inc.related, r, &inc.children));
        let v = match inc.relation.cardinality {
            Cardinality::ToOne => found.next().unwrap_or(Value::Null),
            Cardinality::ToMany => Value::Array(found.collect()),
        };
        out.insert(inc.relation.name.clone(), v);
    }
    Value::Object(out)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn paginate(
        &self,
        registry: &Registry,
        entity: &ResolvedEntity,
        plan: &QueryPlan,
        page: u64,
        per_page: u64,
    ) -> Result<Page, AppError> {
        let includes = include_tree(registry, entity, &plan.with)?;
        let likes: Vec<Option<Regex>> = plan
            .filters
            .iter()
            .map(|f| match &f.value {
                FilterValue::Like(p) => like_regex(p),
                FilterValue::Exact(_) => None,
            })
            .collect();
        let tables = self.read();
        let mut rows: Vec<&Row> = tables
            .get(&entity.name)
            .into_iter()
            .flatten()
            .filter(|r| matches(r, plan, &likes))
            .collect();
        let total = rows.len() as u64;

        let mut keyed: Vec<(Vec<Value>, &Row)> = rows
            .drain(..)
            .map(|r| {
                let keys = plan.sorts.iter().map(|s| sort_key(&tables, registry, entity, r, &s.target)).collect();
                (keys, r)
            })
            .collect();
        keyed.sort_by(|(ka, ra), (kb, rb)| {
            for (i, s) in plan.sorts.iter().enumerate() {
                let ord = compare(&ka[i], &kb[i]);
                let ord = match s.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            let pk = &entity.primary_key;
            compare(
                ra.get(pk).unwrap_or(&Value::Null),
                rb.get(pk).unwrap_or(&Value::Null),
            )
        });

        let offset = page.saturating_sub(1).saturating_mul(per_page) as usize;
        let rows = keyed
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .map(|(_, r)| materialize(&tables, entity, r, &includes))
            .collect();
        Ok(Page { rows, total })
    }

    async fn find(
        &self,
        registry: &Registry,
        entity: &ResolvedEntity,
        id: &Value,
        with: &[String],
    ) -> Result<Option<Value>, AppError> {
        let includes = include_tree(registry, entity, with)?;
        let tables = self.read();
        let found = tables
            .get(&entity.name)
            .into_iter()
            .flatten()
            .find(|r| r.get(&entity.primary_key).map(|v| same_key(v, id)).unwrap_or(false))
            .map(|r| materialize(&tables, entity, r, &includes));
        Ok(found)
    }

    async fn create(&self, entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Value, AppError> {
        let mut tables = self.write();
        let table = tables.entry(entity.name.clone()).or_default();
        let pk = &entity.primary_key;
        let id = match body.get(pk).filter(|v| !v.is_null()) {
            Some(v) => v.clone(),
            None => match entity.pk_type {
                PkType::Int => {
                    let max = table
                        .iter()
                        .filter_map(|r| r.get(pk).and_then(|v| as_text(v)?.parse::<i64>().ok()))
                        .max()
                        .unwrap_or(0);
                    Value::from(max + 1)
                }
                PkType::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
                PkType::Text => {
                    let mut errors = BTreeMap::new();
                    errors.insert(pk.clone(), vec![format!("The {} field is required.", pk)]);
                    return Err(AppError::Validation(errors));
                }
            },
        };
        if table.iter().any(|r| r.get(pk).map(|v| same_key(v, &id)).unwrap_or(false)) {
            return Err(AppError::Persistence(format!(
                "duplicate key {} on {}",
                id, entity.name
            )));
        }
        let mut row = Map::new();
        for c in &entity.columns {
            let v = if &c.name == pk {
                id.clone()
            } else {
                body.get(&c.name).cloned().unwrap_or(Value::Null)
            };
            row.insert(c.name.clone(), v);
        }
        table.push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let mut tables = self.write();
        let Some(row) = tables
            .get_mut(&entity.name)
            .into_iter()
            .flatten()
            .find(|r| r.get(&entity.primary_key).map(|v| same_key(v, id)).unwrap_or(false))
        else {
            return Ok(None);
        };
        for (k, v) in body {
            if k != &entity.primary_key && entity.has_column(k) {
                row.insert(k.clone(), v.clone());
            }
        }
        Ok(Some(Value::Object(row.clone())))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError> {
        let mut tables = self.write();
        let Some(table) = tables.get_mut(&entity.name) else {
            return Ok(false);
        };
        let before = table.len();
        table.retain(|r| !r.get(&entity.primary_key).map(|v| same_key(v, id)).unwrap_or(false));
        Ok(table.len() != before)
    }

    async fn options(&self, entity: &ResolvedEntity, query: &OptionsQuery) -> Result<Vec<Value>, AppError> {
        let tables = self.read();
        // value text -> (value, min title)
        let mut seen: Vec<(String, Value, Option<String>)> = Vec::new();
        for row in tables.get(&entity.name).into_iter().flatten() {
            let Some(value) = row.get(&query.value_column).filter(|v| !v.is_null()) else {
                continue;
            };
            let key = as_text(value).unwrap_or_default();
            let title = query
                .title_column
                .as_ref()
                .and_then(|t| row.get(t))
                .and_then(as_text);
            match seen.iter_mut().find(|(k, _, _)| k == &key) {
                Some((_, _, existing)) => {
                    if let Some(t) = title {
                        if existing.as_ref().map(|e| &t < e).unwrap_or(true) {
                            *existing = Some(t);
                        }
                    }
                }
                None => seen.push((key, value.clone(), title)),
            }
        }
        let with_title = query.title_column.is_some();
        seen.sort_by(|a, b| {
            let ord = if with_title {
                compare(
                    &a.2.clone().map(Value::String).unwrap_or(Value::Null),
                    &b.2.clone().map(Value::String).unwrap_or(Value::Null),
                )
                .then_with(|| compare(&a.1, &b.1))
            } else {
                compare(&a.1, &b.1)
            };
            match query.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(seen
            .into_iter()
            .take(limit)
            .map(|(_, value, title)| {
                let mut item = Map::new();
                item.insert("value".into(), value);
                if with_title {
                    item.insert("title".into(), title.map(Value::String).unwrap_or(Value::Null));
                }
                Value::Object(item)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterDirective, Search, SortDirective};
    use crate::testing::registry;
    use serde_json::json;

    fn repo() -> MemoryRepository {
        MemoryRepository::new()
            .with_rows(
                "country",
                vec![
                    json!({ "id": 1, "name_eng": "Maldives", "name_div": "Dhivehi Raajje", "code": "MV" }),
                    json!({ "id": 2, "name_eng": "India", "name_div": "Hindhu", "code": "IN" }),
                ],
            )
            .with_rows(
                "person",
                vec![
                    json!({ "id": 1, "name": "Aisha", "status": "active", "country_id": 1 }),
                    json!({ "id": 2, "name": "Bilal", "status": "retired", "country_id": 2 }),
                    json!({ "id": 3, "name": "Chandra", "status": "active", "country_id": 2 }),
                    json!({ "id": 4, "name": "Dawood", "status": "active", "country_id": null }),
                ],
            )
    }

    #[test]
    fn like_patterns() {
        assert!(like("%act%", "inactive"));
        assert!(like("a_c", "abc"));
        assert!(!like("a_c", "abbc"));
        assert!(like("50\\%", "50%"));
        assert!(!like("50\\%", "500"));
        assert!(like("a.c%", "a.cde"));
        assert!(!like("a.c", "abc"));
    }

    #[test]
    fn like_with_many_wildcards_stays_linear() {
        let text = "a".repeat(60);
        let started = std::time::Instant::now();
        assert!(!like("%a%a%a%a%a%a%b", &text));
        assert!(like("%a%a%a%a%a%a%", &text));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn filters_search_and_related_sort() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let r = repo();
        let plan = QueryPlan {
            filters: vec![FilterDirective {
                column: "status".into(),
                value: FilterValue::Exact("active".into()),
            }],
            search: None,
            with: vec!["country".into()],
            sorts: vec![SortDirective {
                target: SortTarget::Related {
                    relation: "country".into(),
                    field: "name_eng".into(),
                },
                direction: Direction::Asc,
            }],
        };
        let page = r.paginate(&reg, person, &plan, 1, 10).await.unwrap();
        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1), json!(4)]);
        assert_eq!(page.rows[0]["country"]["name_eng"], "India");
        assert_eq!(page.rows[2]["country"], Value::Null);

        let plan = QueryPlan {
            search: Some(Search {
                term: "IL".into(),
                columns: vec!["name".into()],
            }),
            ..Default::default()
        };
        let page = r.paginate(&reg, person, &plan, 1, 10).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0]["name"], "Bilal");
    }

    #[tokio::test]
    async fn to_many_include_and_paging() {
        let reg = registry();
        let country = reg.get("country").unwrap();
        let r = repo();
        let plan = QueryPlan {
            with: vec!["people".into()],
            ..Default::default()
        };
        let page = r.paginate(&reg, country, &plan, 2, 1).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["id"], 2);
        assert_eq!(page.rows[0]["people"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_update_delete() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let r = repo();
        let body: Map<String, Value> = serde_json::from_value(json!({ "name": "Eva" })).unwrap();
        let created = r.create(person, &body).await.unwrap();
        assert_eq!(created["id"], 5);
        assert_eq!(created["status"], Value::Null);

        let patch: Map<String, Value> = serde_json::from_value(json!({ "status": "retired" })).unwrap();
        let updated = r.update(person, &json!("5"), &patch).await.unwrap().unwrap();
        assert_eq!(updated["status"], "retired");
        assert_eq!(updated["name"], "Eva");

        assert!(r.delete(person, &json!(5)).await.unwrap());
        assert!(!r.delete(person, &json!(5)).await.unwrap());
        assert!(r.find(&reg, person, &json!(5), &[]).await.unwrap().is_none());

        let dup: Map<String, Value> = serde_json::from_value(json!({ "id": 1, "name": "Dup" })).unwrap();
        assert!(r.create(person, &dup).await.is_err());
    }

    #[tokio::test]
    async fn options_distinct_and_sorted() {
        let reg = registry();
        let person = reg.get("person").unwrap();
        let r = repo();
        let items = r
            .options(
                person,
                &OptionsQuery {
                    value_column: "status".into(),
                    title_column: None,
                    direction: Direction::Desc,
                    limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(items, vec![json!({ "value": "retired" }), json!({ "value": "active" })]);

        let country = reg.get("country").unwrap();
        let items = r
            .options(
                country,
                &OptionsQuery {
                    value_column: "id".into(),
                    title_column: Some("name_eng".into()),
                    direction: Direction::Asc,
                    limit: Some(1),
                },
            )
            .await
            .unwrap();
        assert_eq!(items, vec![json!({ "value": 2, "title": "India" })]);
    }
}
