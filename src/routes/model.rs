//! Model routes derived from the schema and gated by access rules.
//!
//! Each model gets `/{segment}` (POST, GET) and `/{segment}/:id` (GET, PUT, PATCH, DELETE),
//! minus whatever its rules leave unbound. Hooks run as per-route middleware ahead of the handler.

use crate::handlers::model::{collection, item};
use crate::registry::{plan_route, RequestHook, RouteShape};
use crate::request::ApiRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    handler::Handler,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
struct HookChain {
    model: String,
    hooks: Arc<Vec<Arc<dyn RequestHook>>>,
}

async fn run_hooks(State(chain): State<HookChain>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    for hook in chain.hooks.iter() {
        if let Err(reply) = hook.on_request(&chain.model, &parts).await {
            return reply.into_response();
        }
    }
    next.run(Request::from_parts(parts, body)).await
}

fn method_filter(shape: RouteShape) -> MethodFilter {
    match shape {
        RouteShape::Post => MethodFilter::POST,
        RouteShape::GetCollection | RouteShape::GetItem => MethodFilter::GET,
        RouteShape::Put => MethodFilter::PUT,
        RouteShape::Patch => MethodFilter::PATCH,
        RouteShape::Delete => MethodFilter::DELETE,
    }
}

/// One method route. Hooks wrap only this method's handler, so unbound methods on the same
/// path still fall through to the 405 fallback.
fn shape_route(model: &str, shape: RouteShape, hooks: Vec<Arc<dyn RequestHook>>) -> MethodRouter<AppState> {
    let filter = method_filter(shape);
    let hook_layer = (!hooks.is_empty()).then(|| {
        let chain = HookChain {
            model: model.to_string(),
            hooks: Arc::new(hooks),
        };
        middleware::from_fn_with_state(chain, run_hooks)
    });
    let model = model.to_string();
    if shape.is_item() {
        let handler = move |state: State<AppState>, id: Path<String>, request: ApiRequest| {
            let model = model.clone();
            async move { item(state, id, model, request).await }
        };
        match hook_layer {
            Some(layer) => on(filter, handler.layer(layer)),
            None => on(filter, handler),
        }
    } else {
        let handler = move |state: State<AppState>, request: ApiRequest| {
            let model = model.clone();
            async move { collection(state, model, request).await }
        };
        match hook_layer {
            Some(layer) => on(filter, handler.layer(layer)),
            None => on(filter, handler),
        }
    }
}

/// Router with every bound model route; nest it under the API prefix.
pub fn model_routes(state: AppState) -> Router {
    let mut router = Router::new();
    for model in state.schema.models() {
        let rules = state.registries.access.rules_for(&model.name);
        if rules.iter().any(|r| r.denies_all()) {
            tracing::info!(model = %model.name, "routes disabled by access rule");
            continue;
        }
        let mut collection_route: Option<MethodRouter<AppState>> = None;
        let mut item_route: Option<MethodRouter<AppState>> = None;
        for shape in RouteShape::ALL {
            let Some(hooks) = plan_route(&rules, shape) else {
                continue;
            };
            let route = shape_route(&model.name, shape, hooks);
            let slot = if shape.is_item() { &mut item_route } else { &mut collection_route };
            *slot = Some(match slot.take() {
                Some(existing) => existing.merge(route),
                None => route,
            });
            tracing::debug!(model = %model.name, shape = ?shape, "route bound");
        }
        let segment = model.route_segment();
        if let Some(route) = collection_route {
            router = router.route(&format!("/{}", segment), route);
        }
        if let Some(route) = item_route {
            router = router.route(&format!("/{}/:id", segment), route);
        }
    }
    router.with_state(state)
}
