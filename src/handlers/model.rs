//! Model route handlers: pick a processor for the request and run it.

use crate::request::ApiRequest;
use crate::response::Reply;
use crate::state::AppState;
use axum::extract::{Path, State};

/// First registered processor that supports the request, else the generic controller.
pub async fn dispatch(state: &AppState, model: &str, request: ApiRequest) -> Reply {
    let mut reply = Reply::new();
    match state.registries.processors.processor_for(model, &request) {
        Some(processor) => {
            tracing::debug!(model = %model, method = %request.method, "custom processor");
            processor.process(model, &request, &mut reply).await;
        }
        None => state.controller.process(model, &request, &mut reply).await,
    }
    reply
}

pub async fn collection(State(state): State<AppState>, model: String, request: ApiRequest) -> Reply {
    dispatch(&state, &model, request).await
}

pub async fn item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    model: String,
    request: ApiRequest,
) -> Reply {
    dispatch(&state, &model, request.with_id(id)).await
}
