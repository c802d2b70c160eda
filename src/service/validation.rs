//! Schema-driven payload validation: required-field checks and numeric coercion.

use crate::config::{FieldDescriptor, FieldType, ModelDescriptor};
use crate::registry::ValidationResult;
use crate::store::Record;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

/// Validate `data` against the model's fields.
///
/// Identifier, defaulted and relation fields are skipped entirely: they are never reported
/// missing and never copied. Only the remaining fields present in `data` reach the
/// sanitized map, so unknown keys are dropped. A required field counts as missing when
/// it is absent or `null`.
pub fn validate_fields(model: &ModelDescriptor, data: &Record) -> ValidationResult {
    let mut result = ValidationResult::default();
    for field in &model.fields {
        if field.is_id || field.has_default || field.is_relation() {
            continue;
        }
        match data.get(&field.name) {
            None | Some(Value::Null) if field.required => {
                result.errors.push(format!("{} is required", field.name));
            }
            None => {}
            Some(value) => {
                result.data.insert(field.name.clone(), coerce(field, value));
            }
        }
    }
    result
}

/// Parse integer/float fields; copy everything else unchanged.
/// Unparseable numeric input becomes `null`.
pub fn coerce(field: &FieldDescriptor, value: &Value) -> Value {
    match field.field_type {
        FieldType::Int | FieldType::BigInt => parse_int(value),
        FieldType::Float => parse_float(value),
        _ => value.clone(),
    }
}

fn int_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid regex"))
}

fn float_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid regex")
    })
}

/// Leading-integer parse: `"42abc"` is 42, `12.9` is 12.
fn parse_int(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| Value::from(f.trunc() as i64))
                .unwrap_or(Value::Null),
        },
        Value::String(s) => int_prefix()
            .captures(s)
            .and_then(|c| c[1].parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Leading-float parse: `"12.5kg"` is 12.5.
fn parse_float(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => float_prefix()
            .captures(s)
            .and_then(|c| c[1].parse::<f64>().ok()),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Coerce an identifier taken from a path or body. `None` when an integer id does not parse.
pub fn coerce_id(field: &FieldDescriptor, raw: &Value) -> Option<Value> {
    match field.field_type {
        FieldType::Int | FieldType::BigInt => match raw {
            Value::Number(n) => n.as_i64().map(Value::from),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        _ => match raw {
            Value::Null => None,
            Value::String(_) => Some(raw.clone()),
            other => Some(Value::String(other.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, SchemaConfig};
    use serde_json::json;

    fn widget() -> ModelDescriptor {
        let config: SchemaConfig = serde_json::from_value(json!({
            "models": [{
                "name": "Widget",
                "fields": [
                    { "name": "id", "type": "Int", "is_id": true, "required": true },
                    { "name": "name", "type": "String", "required": true },
                    { "name": "qty", "type": "Int", "required": true },
                    { "name": "price", "type": "Float" },
                    { "name": "created_at", "type": "DateTime", "required": true, "has_default": true },
                    { "name": "owner", "type": "User", "kind": "object", "required": true }
                ]
            }]
        }))
        .unwrap();
        resolve(&config).unwrap().model("Widget").unwrap().clone()
    }

    fn record(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn only_plain_required_fields_are_reported() {
        let result = validate_fields(&widget(), &Record::new());
        assert_eq!(result.errors, vec!["name is required", "qty is required"]);
        assert!(result.data.is_empty());
    }

    #[test]
    fn null_counts_as_missing_for_required_fields() {
        let result = validate_fields(&widget(), &record(json!({ "name": null, "qty": 1 })));
        assert_eq!(result.errors, vec!["name is required"]);
    }

    #[test]
    fn sanitized_map_is_a_whitelist_with_coercion() {
        let result = validate_fields(
            &widget(),
            &record(json!({
                "id": 5,
                "name": "bolt",
                "qty": "7",
                "price": "12.5",
                "created_at": "2020-01-01",
                "owner": { "id": 1 },
                "extra": true
            })),
        );
        assert!(result.is_valid());
        assert_eq!(
            Value::Object(result.data),
            json!({ "name": "bolt", "qty": 7, "price": 12.5 })
        );
    }

    #[test]
    fn non_numeric_input_yields_null() {
        let result = validate_fields(&widget(), &record(json!({ "name": "x", "qty": "many", "price": "n/a" })));
        assert!(result.is_valid());
        assert_eq!(result.data["qty"], Value::Null);
        assert_eq!(result.data["price"], Value::Null);
    }

    #[test]
    fn integer_parse_takes_leading_digits() {
        assert_eq!(parse_int(&json!("42abc")), json!(42));
        assert_eq!(parse_int(&json!(12.9)), json!(12));
        assert_eq!(parse_int(&json!(" -3")), json!(-3));
        assert_eq!(parse_int(&json!(true)), Value::Null);
        assert_eq!(parse_float(&json!(".5e1x")), json!(5.0));
    }

    #[test]
    fn ids_follow_declared_type() {
        let model = widget();
        let id = model.id_field();
        assert_eq!(coerce_id(id, &json!("5")), Some(json!(5)));
        assert_eq!(coerce_id(id, &json!("abc")), None);
        let name = model.field("name").unwrap();
        assert_eq!(coerce_id(name, &json!(5)), Some(json!("5")));
    }
}
