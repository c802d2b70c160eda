//! DTO mappers: response projections of persisted records.

use crate::store::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

#[async_trait]
pub trait DtoMapper: Send + Sync {
    fn supports(&self, model: &str) -> bool;

    async fn to_dto(&self, record: &Record) -> Value;

    async fn to_dto_list(&self, records: &[Record]) -> Value {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(self.to_dto(record).await);
        }
        Value::Array(out)
    }
}

#[derive(Default)]
pub struct DtoRegistry {
    mappers: Vec<Arc<dyn DtoMapper>>,
}

impl DtoRegistry {
    pub fn register(&mut self, mapper: impl DtoMapper + 'static) {
        self.mappers.push(Arc::new(mapper));
    }

    pub fn dto_for(&self, model: &str) -> Option<Arc<dyn DtoMapper>> {
        self.mappers.iter().find(|m| m.supports(model)).cloned()
    }
}

/// Strips the named fields from every record of one model.
pub struct HideFields {
    model: String,
    fields: HashSet<String>,
}

impl HideFields {
    pub fn new<I, S>(model: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HideFields {
            model: model.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl DtoMapper for HideFields {
    fn supports(&self, model: &str) -> bool {
        model == self.model
    }

    async fn to_dto(&self, record: &Record) -> Value {
        Value::Object(
            record
                .iter()
                .filter(|(k, _)| !self.fields.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

type MapFn = dyn Fn(&Record) -> Value + Send + Sync;

/// Closure-backed mapper for one model.
pub struct FnDto {
    model: String,
    map: Box<MapFn>,
}

impl FnDto {
    pub fn new(model: impl Into<String>, map: impl Fn(&Record) -> Value + Send + Sync + 'static) -> Self {
        FnDto {
            model: model.into(),
            map: Box::new(map),
        }
    }
}

#[async_trait]
impl DtoMapper for FnDto {
    fn supports(&self, model: &str) -> bool {
        model == self.model
    }

    async fn to_dto(&self, record: &Record) -> Value {
        (self.map)(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn hide_fields_projects_lists() {
        let dto = HideFields::new("User", ["password"]);
        let rows = vec![
            record(json!({ "id": 1, "password": "x" })),
            record(json!({ "id": 2, "password": "y" })),
        ];
        assert_eq!(dto.to_dto_list(&rows).await, json!([{ "id": 1 }, { "id": 2 }]));
    }

    #[tokio::test]
    async fn lookup_returns_first_supporting_mapper() {
        let mut registry = DtoRegistry::default();
        registry.register(FnDto::new("User", |r| json!({ "name": r["name"] })));
        registry.register(HideFields::new("User", ["name"]));

        let mapper = registry.dto_for("User").unwrap();
        let out = mapper.to_dto(&record(json!({ "id": 1, "name": "ada" }))).await;
        assert_eq!(out, json!({ "name": "ada" }));
        assert!(registry.dto_for("Widget").is_none());
    }
}
