//! Load the model schema from a JSON document or by introspecting a PostgreSQL schema.

use crate::config::resolved::{FieldDescriptor, FieldKind, FieldType, ModelDescriptor, Schema};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

pub const DEFAULT_DB_SCHEMA: &str = "public";

/// Build resolved schema from config (validates first).
pub fn resolve(config: &SchemaConfig) -> Result<Schema, ConfigError> {
    validate(config)?;
    let models = config
        .models
        .iter()
        .map(|m| ModelDescriptor {
            name: m.name.clone(),
            schema_name: m.schema.clone().unwrap_or_else(|| DEFAULT_DB_SCHEMA.into()),
            table_name: m.table.clone().unwrap_or_else(|| m.name.clone()),
            fields: m.fields.iter().map(resolve_field).collect(),
        })
        .collect();
    Ok(Schema::new(models))
}

fn resolve_field(f: &FieldConfig) -> FieldDescriptor {
    let kind = match f.kind {
        FieldKindConfig::Scalar => FieldKind::Scalar,
        FieldKindConfig::Enum => FieldKind::Enum,
        FieldKindConfig::Object => FieldKind::Relation,
    };
    FieldDescriptor {
        name: f.name.clone(),
        kind,
        field_type: FieldType::parse(&f.type_),
        required: f.required,
        is_id: f.is_id,
        unique: f.unique || f.is_id,
        has_default: f.has_default || f.default.is_some(),
        default: f.default.clone(),
        db_type: f.db_type.clone(),
    }
}

/// Read and resolve a JSON schema document from disk.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Schema, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: SchemaConfig =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), models = config.models.len(), "schema loaded");
    resolve(&config)
}

type ColumnRow = (String, String, String, String, String, String, Option<String>, String);

/// Introspect every base table in `db_schema` into a schema config.
/// Tables without a single-column primary key are skipped.
pub async fn introspect(pool: &PgPool, db_schema: &str) -> Result<SchemaConfig, ConfigError> {
    let column_sql = r#"
        SELECT c.table_name::text, c.column_name::text, c.data_type::text, c.udt_schema::text,
               c.udt_name::text, c.is_nullable::text, c.column_default::text, c.is_identity::text
        FROM information_schema.columns c
        JOIN information_schema.tables t
          ON t.table_schema = c.table_schema AND t.table_name = c.table_name
        WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE'
        ORDER BY c.table_name, c.ordinal_position
    "#;
    tracing::debug!(sql = %column_sql, schema = %db_schema, "query");
    let columns: Vec<ColumnRow> = sqlx::query_as(column_sql)
        .bind(db_schema)
        .fetch_all(pool)
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let constraint_sql = r#"
        SELECT tc.table_name::text, tc.constraint_name::text, tc.constraint_type::text, kcu.column_name::text
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON kcu.constraint_name = tc.constraint_name
         AND kcu.table_schema = tc.table_schema
         AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = $1 AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')
    "#;
    tracing::debug!(sql = %constraint_sql, schema = %db_schema, "query");
    let constraints: Vec<(String, String, String, String)> = sqlx::query_as(constraint_sql)
        .bind(db_schema)
        .fetch_all(pool)
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    // (table, constraint) -> (type, columns)
    let mut by_constraint: HashMap<(String, String), (String, Vec<String>)> = HashMap::new();
    for (table, name, kind, column) in constraints {
        by_constraint
            .entry((table, name))
            .or_insert_with(|| (kind, Vec::new()))
            .1
            .push(column);
    }
    let mut pk: HashMap<String, Vec<String>> = HashMap::new();
    let mut unique: HashSet<(String, String)> = HashSet::new();
    for ((table, _), (kind, cols)) in by_constraint {
        if kind == "PRIMARY KEY" {
            pk.insert(table, cols);
        } else if cols.len() == 1 {
            unique.insert((table, cols[0].clone()));
        }
    }

    let mut tables: BTreeMap<String, Vec<FieldConfig>> = BTreeMap::new();
    for (table, column, data_type, udt_schema, udt_name, nullable, default, identity) in columns {
        let is_id = pk.get(&table).map(|c| c.len() == 1 && c[0] == column).unwrap_or(false);
        let user_defined = data_type == "USER-DEFINED";
        let field = FieldConfig {
            name: column.clone(),
            type_: udt_name.clone(),
            kind: if user_defined { FieldKindConfig::Enum } else { FieldKindConfig::Scalar },
            required: nullable == "NO",
            is_id,
            unique: unique.contains(&(table.clone(), column)),
            has_default: default.is_some() || identity == "YES",
            default: None,
            db_type: Some(if user_defined {
                format!("{}.{}", udt_schema, udt_name)
            } else {
                udt_name
            }),
        };
        tables.entry(table).or_default().push(field);
    }

    let mut models = Vec::new();
    for (table, fields) in tables {
        if !fields.iter().any(|f| f.is_id) {
            tracing::warn!(table = %table, "skipping table without single-column primary key");
            continue;
        }
        models.push(ModelConfig {
            name: table.clone(),
            table: Some(table),
            schema: Some(db_schema.to_string()),
            fields,
        });
    }
    tracing::info!(schema = %db_schema, models = models.len(), "schema introspected");
    Ok(SchemaConfig { models })
}
