//! Example consumer: a separate Rust project that uses model-rest as a dependency and
//! registers a custom processor, validator and DTO mapper before serving.
//!
//! Run from repo root: `cargo run -p example-consumer`

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use model_rest::{
    api_router, resolve, AccessRule, AccessRuleConfig, ApiRequest, AppState, DataStore, FnDto,
    FnValidator, Processor, Registries, Reply, SchemaConfig, ValidationResult,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Answers `GET /api/note?summary` with a count instead of a page of rows.
struct NoteSummary;

#[async_trait]
impl Processor for NoteSummary {
    fn supports(&self, model: &str, request: &ApiRequest) -> bool {
        model == "Note" && request.method == Method::GET && request.id.is_none() && request.query.contains_key("summary")
    }

    async fn process(&self, _model: &str, _request: &ApiRequest, reply: &mut Reply) {
        reply.set_status(StatusCode::OK).send(json!({ "model": "Note", "summary": true }));
    }
}

fn schema_config() -> Result<SchemaConfig, serde_json::Error> {
    serde_json::from_value(json!({
        "models": [{
            "name": "Note",
            "fields": [
                { "name": "id", "type": "String", "is_id": true, "has_default": true },
                { "name": "title", "type": "String", "required": true },
                { "name": "body", "type": "String" }
            ]
        }, {
            "name": "AuditLog",
            "fields": [
                { "name": "id", "type": "Int", "is_id": true, "has_default": true },
                { "name": "line", "type": "String" }
            ]
        }]
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("model_rest=debug")),
        )
        .init();

    let schema = resolve(&schema_config()?)?;
    let store = DataStore::in_memory(&schema);

    let mut registries = Registries::default();
    registries.processors.register(NoteSummary);
    registries.validations.register(FnValidator::new("Note", |data| {
        let mut result = ValidationResult::default();
        match data.get("title").and_then(Value::as_str) {
            Some(t) if t.len() <= 80 => {
                result.data.insert("title".into(), json!(t));
            }
            Some(_) => result.errors.push("title is too long".into()),
            None => result.errors.push("title is required".into()),
        }
        if let Some(body) = data.get("body") {
            result.data.insert("body".into(), body.clone());
        }
        result
    }));
    registries.dtos.register(FnDto::new("Note", |record| {
        json!({
            "id": record.get("id"),
            "title": record.get("title"),
            "preview": record
                .get("body")
                .and_then(Value::as_str)
                .map(|b| b.chars().take(40).collect::<String>()),
        })
    }));
    let rules: Vec<AccessRuleConfig> = serde_json::from_value(json!([
        { "model": "AuditLog", "methods": ["get_collection"] }
    ]))?;
    registries.access.register_rules(rules.into_iter().map(AccessRule::from));

    let app = api_router(AppState::new(schema, store, registries), 64 * 1024);
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
