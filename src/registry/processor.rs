//! Processors: full replacements for the generic controller on a model/request shape.

use crate::request::ApiRequest;
use crate::response::Reply;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Processor: Send + Sync {
    fn supports(&self, model: &str, request: &ApiRequest) -> bool;

    async fn process(&self, model: &str, request: &ApiRequest, reply: &mut Reply);
}

#[derive(Default)]
pub struct ProcessorRegistry {
    processors: Vec<Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn register(&mut self, processor: impl Processor + 'static) {
        self.processors.push(Arc::new(processor));
    }

    /// First registered processor that supports the request.
    pub fn processor_for(&self, model: &str, request: &ApiRequest) -> Option<Arc<dyn Processor>> {
        self.processors
            .iter()
            .find(|p| p.supports(model, request))
            .cloned()
    }
}
