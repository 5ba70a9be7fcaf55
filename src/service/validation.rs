//! Request body validation from column rules. Every failing field is reported, not just the first.

use crate::config::{ResolvedEntity, ValidationRule};
use crate::error::AppError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

type FieldErrors = BTreeMap<String, Vec<String>>;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. Required fields must be present and non-null.
    pub fn validate(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        for col in &entity.columns {
            let Some(rule) = &col.rules else { continue };
            let val = body.get(&col.name);
            if rule.required == Some(true) && val.map(Value::is_null).unwrap_or(true) {
                push(&mut errors, &col.name, format!("The {} field is required.", col.name));
                continue;
            }
            if let Some(v) = val {
                validate_field(&mut errors, &col.name, v, rule);
            }
        }
        finish(errors)
    }

    /// Validate only the fields present (update). Required is enforced only against explicit nulls.
    pub fn validate_partial(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        for (name, v) in body {
            let Some(rule) = entity.column(name).and_then(|c| c.rules.as_ref()) else {
                continue;
            };
            if rule.required == Some(true) && v.is_null() {
                push(&mut errors, name, format!("The {} field is required.", name));
                continue;
            }
            validate_field(&mut errors, name, v, rule);
        }
        finish(errors)
    }
}

fn push(errors: &mut FieldErrors, col: &str, msg: String) {
    errors.entry(col.to_string()).or_default().push(msg);
}

fn finish(errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn validate_field(errors: &mut FieldErrors, col: &str, v: &Value, rule: &ValidationRule) {
    if v.is_null() {
        return;
    }
    if let Some(format) = &rule.format {
        validate_format(errors, col, v, format);
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                push(errors, col, format!("The {} may not be greater than {} characters.", col, max));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                push(errors, col, format!("The {} must be at least {} characters.", col, min));
            }
        }
        if let Some(pattern) = &rule.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => push(errors, col, format!("The {} format is invalid.", col)),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(column = %col, pattern = %pattern, error = %e, "invalid validation pattern");
                }
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            push(errors, col, format!("The selected {} is invalid.", col));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                push(errors, col, format!("The {} must be at least {}.", col, min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                push(errors, col, format!("The {} may not be greater than {}.", col, max));
            }
        }
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(errors: &mut FieldErrors, col: &str, v: &Value, format: &str) {
    let Some(s) = v.as_str() else { return };
    match format.to_lowercase().as_str() {
        "email" => {
            if !s.contains('@') || s.len() < 3 {
                push(errors, col, format!("The {} must be a valid email address.", col));
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                push(errors, col, format!("The {} must be a valid UUID.", col));
            }
        }
        "date" => {
            if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                push(errors, col, format!("The {} is not a valid date.", col));
            }
        }
        _ => {}
    }
}
