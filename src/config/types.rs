//! Raw schema config types matching the JSON schema document.

use serde::{Deserialize, Serialize};

/// Top-level schema document: `{ "models": [...] }`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Table name in the database. Defaults to the model name.
    #[serde(default)]
    pub table: Option<String>,
    /// Database schema holding the table. Defaults to `public`.
    #[serde(default)]
    pub schema: Option<String>,
    pub fields: Vec<FieldConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Declared type, e.g. `Int`, `Float`, `String`, `Boolean`, `DateTime`, or a related model name.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub kind: FieldKindConfig,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub has_default: bool,
    /// Literal default. Implies `has_default`.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Database type used for parameter casts (e.g. `uuid`, `int4`). Derived from `type` when absent.
    #[serde(default)]
    pub db_type: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKindConfig {
    #[default]
    Scalar,
    Enum,
    Object,
}
