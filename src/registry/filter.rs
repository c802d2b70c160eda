//! Filters: predicate fragments derived from query items. All matching filters apply, OR'd together.

use crate::request::QueryItems;
use crate::store::Predicate;
use serde_json::Value;
use std::sync::Arc;

pub trait Filter: Send + Sync {
    fn supports(&self, model: &str, query: &QueryItems) -> bool;

    fn predicate(&self, model: &str, query: &QueryItems) -> Predicate;
}

#[derive(Default)]
pub struct FilterRegistry {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn register(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    /// Every registered filter that supports the query, in registration order.
    pub fn filters_for(&self, model: &str, query: &QueryItems) -> Vec<Arc<dyn Filter>> {
        self.filters
            .iter()
            .filter(|f| f.supports(model, query))
            .cloned()
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Match {
    Contains,
    Equals,
}

/// Filter on named query keys of one model: substring match or exact match per field.
#[derive(Clone, Debug)]
pub struct FieldFilter {
    model: String,
    fields: Vec<(String, Match)>,
}

impl FieldFilter {
    pub fn new(model: impl Into<String>) -> Self {
        FieldFilter {
            model: model.into(),
            fields: Vec::new(),
        }
    }

    pub fn contains(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), Match::Contains));
        self
    }

    pub fn equals(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), Match::Equals));
        self
    }
}

impl Filter for FieldFilter {
    fn supports(&self, model: &str, query: &QueryItems) -> bool {
        model == self.model && self.fields.iter().any(|(f, _)| query.contains_key(f))
    }

    fn predicate(&self, _model: &str, query: &QueryItems) -> Predicate {
        let parts = self
            .fields
            .iter()
            .filter_map(|(field, how)| {
                let value = query.get(field)?;
                Some(match how {
                    Match::Contains => Predicate::Contains(field.clone(), value.to_string()),
                    Match::Equals => Predicate::Eq(field.clone(), Value::String(value.to_string())),
                })
            })
            .collect::<Vec<_>>();
        match parts.len() {
            1 => parts.into_iter().next().unwrap_or(Predicate::Or(Vec::new())),
            _ => Predicate::Or(parts),
        }
    }
}
