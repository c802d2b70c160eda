//! Data store: one repository per model, bound once at startup.

mod memory;
mod postgres;
mod query;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use query::*;

use crate::config::Schema;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// A persisted row as a JSON object.
pub type Record = Map<String, Value>;

/// Operations the controller issues against one model's storage.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_one(&self, id: &Value) -> Result<Option<Record>, StoreError>;

    async fn find_many(&self, args: &FindMany) -> Result<Vec<Record>, StoreError>;

    async fn create(&self, data: &Record) -> Result<Record, StoreError>;

    async fn update(&self, id: &Value, data: &Record) -> Result<Record, StoreError>;

    async fn delete(&self, id: &Value) -> Result<Record, StoreError>;
}

/// Model name to repository.
#[derive(Clone, Default)]
pub struct DataStore {
    repositories: HashMap<String, Arc<dyn Repository>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// PostgreSQL-backed repositories for every model in the schema.
    pub fn postgres(pool: PgPool, schema: &Schema) -> Self {
        let mut store = DataStore::new();
        for model in schema.models() {
            store.insert(&model.name, Arc::new(PgRepository::new(pool.clone(), model.clone())));
        }
        store
    }

    /// In-memory repositories for every model in the schema.
    pub fn in_memory(schema: &Schema) -> Self {
        let mut store = DataStore::new();
        for model in schema.models() {
            store.insert(&model.name, Arc::new(MemoryRepository::new(model.clone())));
        }
        store
    }

    /// Bind (or rebind) a model's repository.
    pub fn insert(&mut self, model: &str, repository: Arc<dyn Repository>) {
        self.repositories.insert(model.to_string(), repository);
    }

    pub fn repository(&self, model: &str) -> Result<Arc<dyn Repository>, StoreError> {
        self.repositories
            .get(model)
            .cloned()
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))
    }
}
