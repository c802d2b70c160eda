//! Generic controller and the request-shaping helpers it is built from.

mod constraint;
mod controller;
mod listing;
mod validation;

pub use constraint::{classify, Violation};
pub use controller::GenericController;
pub use listing::{pagination, sorting_options, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use validation::{coerce, coerce_id, validate_fields};
