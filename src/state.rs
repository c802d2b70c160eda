//! Shared application state for all routes. Built once at startup, read-only afterwards.

use crate::config::Schema;
use crate::registry::Registries;
use crate::service::GenericController;
use crate::store::DataStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<Schema>,
    pub store: Arc<DataStore>,
    pub registries: Arc<Registries>,
    /// Fallback processor when no registered processor supports a request.
    pub controller: Arc<GenericController>,
}

impl AppState {
    pub fn new(schema: Schema, store: DataStore, registries: Registries) -> Self {
        let schema = Arc::new(schema);
        let store = Arc::new(store);
        let registries = Arc::new(registries);
        let controller = Arc::new(GenericController::new(
            schema.clone(),
            store.clone(),
            registries.clone(),
        ));
        AppState {
            schema,
            store,
            registries,
            controller,
        }
    }
}
