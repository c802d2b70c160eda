//! Schema validation: unique model routes, exactly one identifier per model.

use crate::config::SchemaConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(config: &SchemaConfig) -> Result<(), ConfigError> {
    let mut segments = HashSet::new();
    for model in &config.models {
        if model.name.is_empty() {
            return Err(ConfigError::Validation("model name must not be empty".into()));
        }
        if !segments.insert(model.name.to_lowercase()) {
            return Err(ConfigError::DuplicateModel(model.name.clone()));
        }

        let mut names = HashSet::new();
        for field in &model.fields {
            if !names.insert(field.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate field '{}' on model '{}'",
                    field.name, model.name
                )));
            }
        }

        let ids = model.fields.iter().filter(|f| f.is_id).count();
        if ids != 1 {
            return Err(ConfigError::InvalidIdentifier {
                model: model.name.clone(),
                count: ids,
            });
        }
    }
    Ok(())
}
