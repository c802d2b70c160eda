//! Override registries consulted by the router and the generic controller.
//! Populated during startup, then shared read-only behind `Arc`.

mod access;
mod dto;
mod filter;
mod processor;
mod validation;

pub use access::*;
pub use dto::*;
pub use filter::*;
pub use processor::*;
pub use validation::*;

#[derive(Default)]
pub struct Registries {
    pub processors: ProcessorRegistry,
    pub filters: FilterRegistry,
    pub dtos: DtoRegistry,
    pub access: AccessControlRegistry,
    pub validations: ValidationRegistry,
}
