//! Generic request-dispatch controller: one code path for every model.

use super::constraint::classify;
use super::listing::{pagination, sorting_options};
use super::validation::{coerce_id, validate_fields};
use crate::config::{ModelDescriptor, Schema};
use crate::error::{AppError, StoreError};
use crate::registry::{Processor, Registries, ValidationResult};
use crate::request::{ApiRequest, QueryItems};
use crate::response::Reply;
use crate::store::{DataStore, FindMany, Predicate, Record, Repository};
use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Maps method + optional id onto list, fetch, create, replace, partial update or delete,
/// consulting the registries for filters, DTOs and validators.
///
/// Every branch writes the reply exactly once. `PATCH` reads, merges and writes without
/// locking, so concurrent writers to the same row can lose updates.
pub struct GenericController {
    schema: Arc<Schema>,
    store: Arc<DataStore>,
    registries: Arc<Registries>,
}

impl GenericController {
    pub fn new(schema: Arc<Schema>, store: Arc<DataStore>, registries: Arc<Registries>) -> Self {
        GenericController {
            schema,
            store,
            registries,
        }
    }

    pub async fn process(&self, model: &str, request: &ApiRequest, reply: &mut Reply) {
        *reply = match self.dispatch(model, request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(model = %model, method = %request.method, error = %e, "request failed");
                e.into_reply()
            }
        };
    }

    async fn dispatch(&self, model_name: &str, request: &ApiRequest) -> Result<Reply, AppError> {
        let model = self.schema.model(model_name).ok_or(AppError::NotFound)?;
        let repo = self.store.repository(model_name)?;
        let method = &request.method;

        if *method == Method::GET && request.id.is_none() {
            tracing::debug!(model = %model_name, "list");
            let data = self.fetch_collection(model, repo.as_ref(), &request.query).await?;
            return Ok(Reply::with(StatusCode::OK, data));
        }
        if *method == Method::POST {
            tracing::debug!(model = %model_name, "create");
            return self.create_item(model, repo.as_ref(), &request.body).await;
        }

        let id = request
            .id
            .as_deref()
            .and_then(|raw| coerce_id(model.id_field(), &Value::String(raw.to_string())))
            .ok_or(AppError::NotFound)?;
        let item = repo.find_one(&id).await?;

        match (method, item) {
            (&Method::GET, Some(item)) => {
                tracing::debug!(model = %model_name, id = %id, "fetch");
                Ok(Reply::with(StatusCode::OK, self.to_dto(model_name, &item).await))
            }
            (&Method::PUT, None) => {
                tracing::debug!(model = %model_name, id = %id, "replace on missing row, creating");
                let mut body = request.body.clone();
                body.insert(model.id_field().name.clone(), id);
                self.create_item(model, repo.as_ref(), &body).await
            }
            (&Method::PUT, Some(_)) => {
                tracing::debug!(model = %model_name, id = %id, "replace");
                let valid = self.checked(self.validate(&request.body, model))?;
                self.persist_update(repo.as_ref(), &id, &valid).await
            }
            (&Method::PATCH, Some(mut item)) => {
                tracing::debug!(model = %model_name, id = %id, "partial update");
                for (key, value) in &request.body {
                    item.insert(key.clone(), value.clone());
                }
                let valid = self.checked(self.validate(&item, model))?;
                self.persist_update(repo.as_ref(), &id, &valid).await
            }
            (&Method::DELETE, Some(_)) => {
                tracing::debug!(model = %model_name, id = %id, "delete");
                repo.delete(&id).await?;
                Ok(Reply::no_content())
            }
            _ => Err(AppError::NotFound),
        }
    }

    /// Custom validator when one is registered for the model, else schema-driven validation.
    pub fn validate(&self, data: &Record, model: &ModelDescriptor) -> ValidationResult {
        match self.registries.validations.validator_for(&model.name) {
            Some(validator) => validator.validate(data),
            None => validate_fields(model, data),
        }
    }

    fn checked(&self, result: ValidationResult) -> Result<Record, AppError> {
        if result.is_valid() {
            Ok(result.data)
        } else {
            Err(AppError::Validation(result.errors))
        }
    }

    /// Predicates from every supporting filter, OR'd; `None` when no filter applies.
    pub fn custom_filters(&self, model: &str, query: &QueryItems) -> Option<Predicate> {
        let predicates: Vec<Predicate> = self
            .registries
            .filters
            .filters_for(model, query)
            .iter()
            .map(|f| f.predicate(model, query))
            .collect();
        (!predicates.is_empty()).then(|| Predicate::Or(predicates))
    }

    pub async fn fetch_collection(
        &self,
        model: &ModelDescriptor,
        repo: &dyn Repository,
        query: &QueryItems,
    ) -> Result<Value, AppError> {
        let page = pagination(query);
        let args = FindMany {
            predicate: self.custom_filters(&model.name, query),
            order_by: sorting_options(model, query),
            skip: page.skip,
            take: page.take,
        };
        let rows = repo.find_many(&args).await?;
        Ok(match self.registries.dtos.dto_for(&model.name) {
            Some(mapper) => mapper.to_dto_list(&rows).await,
            None => Value::Array(rows.into_iter().map(Value::Object).collect()),
        })
    }

    async fn create_item(
        &self,
        model: &ModelDescriptor,
        repo: &dyn Repository,
        body: &Record,
    ) -> Result<Reply, AppError> {
        let mut data = self.checked(self.validate(body, model))?;
        let id_field = model.id_field();
        if let Some(raw) = body.get(&id_field.name).filter(|v| !v.is_null()) {
            let id = coerce_id(id_field, raw)
                .ok_or_else(|| AppError::Validation(vec![format!("{} is invalid", id_field.name)]))?;
            data.insert(id_field.name.clone(), id);
        }
        let created = repo.create(&data).await.map_err(constraint_error)?;
        let body = self.to_dto(&model.name, &created).await;
        Ok(Reply::with(StatusCode::CREATED, body))
    }

    async fn persist_update(&self, repo: &dyn Repository, id: &Value, data: &Record) -> Result<Reply, AppError> {
        repo.update(id, data).await.map_err(constraint_error)?;
        Ok(Reply::no_content())
    }

    async fn to_dto(&self, model: &str, record: &Record) -> Value {
        match self.registries.dtos.dto_for(model) {
            Some(mapper) => mapper.to_dto(record).await,
            None => Value::Object(record.clone()),
        }
    }
}

/// Uniqueness and missing-argument failures become targeted 400s; anything else stays generic.
fn constraint_error(err: StoreError) -> AppError {
    match classify(&err.to_string()) {
        Some(violation) => AppError::Constraint(violation.message()),
        None => AppError::Store(err),
    }
}

#[async_trait]
impl Processor for GenericController {
    fn supports(&self, _model: &str, _request: &ApiRequest) -> bool {
        true
    }

    async fn process(&self, model: &str, request: &ApiRequest, reply: &mut Reply) {
        GenericController::process(self, model, request, reply).await
    }
}
