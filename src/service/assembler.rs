//! Response assembler for the table-view endpoints.
//!
//! A list request walks: resolve entity, resolve component, parse tokens, language gate,
//! build query, paginate, shape records, build metadata, emit. Any failing stage
//! short-circuits with an [`AppError`]; an unsupported language is a soft, empty success.

use crate::config::{load_component, load_layout, ComponentConfig, Registry, ResolvedEntity, Section};
use crate::error::AppError;
use crate::meta::{
    build_filters, build_headers, filter_tokens_by_lang, resolve_per_page, unsupported_lang_message, FilterContext,
    HeaderContext, Pagination,
};
use crate::persistence::Repository;
use crate::query::{
    merge_with, parse_columns, parse_filters, parse_sort, parse_with, ColumnSelection, QueryPlan, Search,
};
use crate::service::crud::parse_id;
use crate::service::params::{parse_flag, parse_u64, present, ListParams, ShowParams};
use crate::service::shape::{shape_record, shape_records};
use crate::settings::ServiceOptions;
use crate::store::DocumentStore;
use serde_json::{Map, Value};

/// Outcome of a read request.
#[derive(Debug)]
pub enum Assembled {
    Body(Value),
    /// The component does not serve this language; rendered as `200 {message, data: []}`.
    LanguageUnsupported { message: String },
}

/// Which metadata sections go to the top level of the envelope.
#[derive(Debug, Clone, Copy)]
struct TopLevel {
    headers: bool,
    filters: bool,
    pagination: bool,
}

impl TopLevel {
    fn resolve(include_meta: Option<bool>, options: &ServiceOptions) -> Self {
        match include_meta {
            Some(on) => TopLevel {
                headers: on,
                filters: on,
                pagination: on,
            },
            None => TopLevel {
                headers: options.top_level_headers,
                filters: options.top_level_filters,
                pagination: options.top_level_pagination,
            },
        }
    }
}

/// Built section content, shared by the layout walk and the top-level envelope.
struct Sections {
    headers: Value,
    filters: Value,
    pagination: Value,
    datalink: Value,
}

impl Sections {
    fn get(&self, section: Section) -> Value {
        match section {
            Section::Headers => self.headers.clone(),
            Section::Filters => self.filters.clone(),
            Section::Pagination => self.pagination.clone(),
            Section::DataLink => self.datalink.clone(),
        }
    }
}

pub struct TableView<'a> {
    pub registry: &'a Registry,
    pub repository: &'a dyn Repository,
    pub documents: &'a dyn DocumentStore,
    pub options: &'a ServiceOptions,
}

impl<'a> TableView<'a> {
    fn entity(&self, model: &str) -> Result<&'a ResolvedEntity, AppError> {
        self.registry
            .get(model)
            .ok_or_else(|| AppError::ModelNotFound(model.to_string()))
    }

    fn lang(&self, requested: &Option<String>) -> String {
        present(requested).unwrap_or(self.options.default_lang.as_str()).to_string()
    }

    fn datalink(&self, entity: &ResolvedEntity, component: &str, lang: &str) -> Value {
        Value::String(format!(
            "{}/{}?component={}&lang={}",
            self.options.api_prefix, entity.name, component, lang
        ))
    }

    fn headers(&self, entity: &ResolvedEntity, component: Option<&ComponentConfig>, selection: &ColumnSelection, lang: &str) -> Value {
        let ctx = HeaderContext {
            registry: self.registry,
            entity,
            lang,
            customizations: component.map(|c| &c.column_customizations),
            include_hidden: self.options.include_hidden_columns_in_headers,
        };
        Value::Array(build_headers(&ctx, &selection.tokens))
    }

    fn filters(&self, entity: &ResolvedEntity, component: Option<&ComponentConfig>, lang: &str) -> Value {
        let ctx = FilterContext {
            registry: self.registry,
            entity,
            lang,
            allowed: component.and_then(|c| c.filters.as_deref()),
            api_prefix: &self.options.api_prefix,
        };
        Value::Array(build_filters(&ctx))
    }

    /// Walk the layout named `layout`; `{}` when no such layout document exists.
    async fn component_settings(&self, layout: &str, sections: &Sections) -> Result<Value, AppError> {
        match load_layout(self.documents, layout).await? {
            Some(node) => Ok(node.render(&mut |s| sections.get(s))),
            None => Ok(Value::Object(Map::new())),
        }
    }

    /// `GET /{model}`: one page of shaped records plus metadata.
    pub async fn list(&self, model: &str, params: &ListParams) -> Result<Assembled, AppError> {
        let entity = self.entity(model)?;

        let component_key = present(&params.component).ok_or(AppError::MissingParameter("component"))?;
        let component = load_component(self.documents, &entity.name, component_key).await?;
        let columns = match present(&params.columns) {
            Some(c) => c.to_string(),
            None => component
                .default_columns()
                .ok_or_else(|| AppError::NoColumns(component_key.to_string()))?,
        };

        let selection = parse_columns(self.registry, entity, Some(&columns))?
            .ok_or_else(|| AppError::NoColumns(component_key.to_string()))?;
        let filters = parse_filters(entity, present(&params.filter), component.filters.as_deref())?;
        let sorts = parse_sort(entity, present(&params.sort), Some(&selection))?;
        let explicit_with = parse_with(entity, present(&params.with))?;
        let page = parse_u64("page", &params.page)?.unwrap_or(1).max(1);
        let requested_per_page = parse_u64("per_page", &params.per_page)?;
        let include_meta = parse_flag("include_meta", &params.include_meta)?;

        let lang = self.lang(&params.lang);
        if !component.allows_lang(&lang) {
            tracing::debug!(model = %entity.name, component = %component_key, lang = %lang, "language not served by component");
            return Ok(Assembled::LanguageUnsupported {
                message: unsupported_lang_message(&lang),
            });
        }
        let tokens = filter_tokens_by_lang(self.registry, entity, &selection.tokens, &lang);

        let search = present(&params.search)
            .filter(|_| !entity.searchable.is_empty())
            .map(|term| Search {
                term: term.to_string(),
                columns: entity.searchable.clone(),
            });
        let plan = QueryPlan {
            filters,
            search,
            with: merge_with(&explicit_with, &selection.relations),
            sorts,
        };
        let per_page = resolve_per_page(
            requested_per_page,
            component.per_page,
            self.options.default_per_page,
            self.options.max_per_page,
        );
        // OFFSET is a bigint in PostgreSQL.
        if (page - 1).checked_mul(per_page).map_or(true, |offset| offset > i64::MAX as u64) {
            return Err(AppError::InvalidParameter {
                name: "page",
                reason: format!("page {} is out of range", page),
            });
        }
        tracing::debug!(model = %entity.name, component = %component_key, ?plan, page, per_page, "list plan");

        let result = self
            .repository
            .paginate(self.registry, entity, &plan, page, per_page)
            .await?;
        let data = shape_records(
            self.registry,
            entity,
            &result.rows,
            &tokens,
            &explicit_with,
            self.options.record_shape,
        );
        let pagination = Pagination::new(result.total, per_page, page, data.len());

        let sections = Sections {
            headers: self.headers(entity, Some(&component), &selection, &lang),
            filters: self.filters(entity, Some(&component), &lang),
            pagination: serde_json::to_value(&pagination).unwrap_or_default(),
            datalink: self.datalink(entity, component_key, &lang),
        };
        let layout = present(&params.component_settings).unwrap_or(component_key);
        let settings = self.component_settings(layout, &sections).await?;

        let top = TopLevel::resolve(include_meta, self.options);
        let mut body = Map::new();
        body.insert("data".into(), Value::Array(data));
        if top.headers {
            body.insert("headers".into(), sections.headers);
        }
        if top.filters {
            body.insert("filters".into(), sections.filters);
        }
        if top.pagination {
            body.insert("pagination".into(), sections.pagination);
        }
        body.insert("component".into(), Value::String(component_key.to_string()));
        body.insert("componentSettings".into(), settings);
        Ok(Assembled::Body(Value::Object(body)))
    }

    /// `GET /{model}/{id}`. The component is optional; when given it supplies default
    /// columns, the language gate and `componentSettings`.
    pub async fn show(&self, model: &str, id: &str, params: &ShowParams) -> Result<Assembled, AppError> {
        let entity = self.entity(model)?;

        let component_key = present(&params.component);
        let component = match component_key {
            Some(key) => Some(load_component(self.documents, &entity.name, key).await?),
            None => None,
        };
        let columns = match (present(&params.columns), &component, component_key) {
            (Some(c), _, _) => Some(c.to_string()),
            (None, Some(comp), Some(key)) => Some(
                comp.default_columns()
                    .ok_or_else(|| AppError::NoColumns(key.to_string()))?,
            ),
            _ => None,
        };
        let selection = parse_columns(self.registry, entity, columns.as_deref())?
            .unwrap_or_else(|| ColumnSelection::all(entity));
        let explicit_with = parse_with(entity, present(&params.with))?;
        let include_meta = parse_flag("include_meta", &params.include_meta)?;

        let lang = self.lang(&params.lang);
        if let Some(comp) = &component {
            if !comp.allows_lang(&lang) {
                return Ok(Assembled::LanguageUnsupported {
                    message: unsupported_lang_message(&lang),
                });
            }
        }
        let tokens = filter_tokens_by_lang(self.registry, entity, &selection.tokens, &lang);

        let id_value = parse_id(entity, id).ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let with = merge_with(&explicit_with, &selection.relations);
        let row = self
            .repository
            .find(self.registry, entity, &id_value, &with)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let data = shape_record(
            self.registry,
            entity,
            &row,
            &tokens,
            &explicit_with,
            self.options.record_shape,
        );

        let headers = self.headers(entity, component.as_ref(), &selection, &lang);
        let top = TopLevel::resolve(include_meta, self.options);
        let mut body = Map::new();
        body.insert("data".into(), data);
        if top.headers {
            body.insert("headers".into(), headers.clone());
        }
        if let Some(key) = component_key {
            let sections = Sections {
                headers,
                filters: self.filters(entity, component.as_ref(), &lang),
                pagination: Value::Null,
                datalink: self.datalink(entity, key, &lang),
            };
            let layout = present(&params.component_settings).unwrap_or(key);
            let settings = self.component_settings(layout, &sections).await?;
            body.insert("component".into(), Value::String(key.to_string()));
            body.insert("componentSettings".into(), settings);
        }
        Ok(Assembled::Body(Value::Object(body)))
    }
}
