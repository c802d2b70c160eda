//! Model REST: schema-driven REST endpoints over a relational store.
//!
//! Every model in the [`Schema`] gets list/fetch/create/replace/patch/delete routes served by
//! the [`GenericController`]. Registries let callers swap in processors, filters, DTO mappers,
//! validators and access rules per model.

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod request;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{introspect, load_from_path, resolve, validate, Schema, SchemaConfig, Settings};
pub use error::{AppError, ConfigError, StoreError};
pub use registry::{
    AccessMethod, AccessRule, AccessRuleConfig, ApiKeyHook, DtoMapper, FieldFilter, Filter, FnDto,
    FnValidator, HideFields, Processor, Registries, RequestHook, ValidationResult, Validator,
};
pub use request::{ApiRequest, QueryItems};
pub use response::Reply;
pub use routes::{api_router, common_routes, model_routes};
pub use service::GenericController;
pub use state::AppState;
pub use store::{DataStore, Predicate, Record, Repository};
