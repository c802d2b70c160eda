//! Custom validators, looked up by exact model name.

use crate::store::Record;
use std::sync::Arc;

/// Outcome of validating one payload: messages plus the sanitized field map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub data: Record,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub trait Validator: Send + Sync {
    fn model(&self) -> &str;

    fn validate(&self, data: &Record) -> ValidationResult;
}

#[derive(Default)]
pub struct ValidationRegistry {
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidationRegistry {
    pub fn register(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Arc::new(validator));
    }

    pub fn validator_for(&self, model: &str) -> Option<Arc<dyn Validator>> {
        self.validators.iter().find(|v| v.model() == model).cloned()
    }
}

type ValidateFn = dyn Fn(&Record) -> ValidationResult + Send + Sync;

/// Closure-backed validator for one model.
pub struct FnValidator {
    model: String,
    validate: Box<ValidateFn>,
}

impl FnValidator {
    pub fn new(
        model: impl Into<String>,
        validate: impl Fn(&Record) -> ValidationResult + Send + Sync + 'static,
    ) -> Self {
        FnValidator {
            model: model.into(),
            validate: Box::new(validate),
        }
    }
}

impl Validator for FnValidator {
    fn model(&self) -> &str {
        &self.model
    }

    fn validate(&self, data: &Record) -> ValidationResult {
        (self.validate)(data)
    }
}
