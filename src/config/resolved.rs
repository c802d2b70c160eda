//! Resolved model schema: config validated and flattened for runtime use.

use serde_json::Value;
use std::collections::HashMap;

/// Scalar vs relation fields. Relation fields are never validated or persisted directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Enum,
    Relation,
}

/// Declared field type. Only `Int` and `Float` drive value coercion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Int,
    BigInt,
    Float,
    Decimal,
    String,
    Boolean,
    DateTime,
    Json,
    Other(String),
}

impl FieldType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "int" | "integer" | "int4" | "int2" | "smallint" | "serial" => FieldType::Int,
            "bigint" | "int8" | "bigserial" => FieldType::BigInt,
            "float" | "double" | "float8" | "float4" | "real" | "double precision" => FieldType::Float,
            "decimal" | "numeric" => FieldType::Decimal,
            "string" | "text" | "varchar" | "character varying" | "char" | "character" | "uuid" => {
                FieldType::String
            }
            "boolean" | "bool" => FieldType::Boolean,
            "datetime" | "timestamp" | "timestamptz" | "date" => FieldType::DateTime,
            "json" | "jsonb" => FieldType::Json,
            _ => FieldType::Other(s.to_string()),
        }
    }

    /// PostgreSQL cast applied to bound parameters when the field has no explicit `db_type`.
    pub fn default_db_type(&self) -> Option<&'static str> {
        match self {
            FieldType::Int | FieldType::BigInt => Some("int8"),
            FieldType::Float => Some("float8"),
            FieldType::Decimal => Some("numeric"),
            FieldType::String => Some("text"),
            FieldType::Boolean => Some("bool"),
            FieldType::DateTime => Some("timestamptz"),
            FieldType::Json => Some("jsonb"),
            FieldType::Other(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub field_type: FieldType,
    pub required: bool,
    pub is_id: bool,
    pub unique: bool,
    pub has_default: bool,
    /// Literal default value, when the schema source knows it.
    pub default: Option<Value>,
    pub db_type: Option<String>,
}

impl FieldDescriptor {
    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::Relation
    }

    pub fn cast(&self) -> Option<&str> {
        self.db_type
            .as_deref()
            .or_else(|| self.field_type.default_db_type())
    }
}

#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub name: String,
    pub schema_name: String,
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    /// Path segment under `/api`: the lower-cased model name.
    pub fn route_segment(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The identifier field. Resolution guarantees exactly one.
    pub fn id_field(&self) -> &FieldDescriptor {
        self.fields
            .iter()
            .find(|f| f.is_id)
            .unwrap_or(&self.fields[0])
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_relation())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    models: Vec<ModelDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        let by_name = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Schema { models, by_name }
    }

    pub fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.by_name.get(name).map(|&i| &self.models[i])
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }
}
