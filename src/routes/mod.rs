//! Route assembly: common routes at the root, model routes under `/api`.

mod common;
mod model;

pub use common::common_routes;
pub use model::model_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

pub const API_PREFIX: &str = "/api";

/// Full application router with a request body size cap.
pub fn api_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes())
        .nest(API_PREFIX, model_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
}
