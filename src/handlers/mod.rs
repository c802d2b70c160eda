//! HTTP handlers for model routes.

pub mod model;
pub use model::*;
