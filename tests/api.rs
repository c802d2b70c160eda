//! End-to-end HTTP tests over the in-memory store.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderName, Method, Request, StatusCode},
    Router,
};
use model_rest::{
    api_router, resolve, AccessMethod, AccessRule, ApiKeyHook, ApiRequest, AppState, DataStore,
    FieldFilter, FnValidator, HideFields, Processor, Registries, Reply, SchemaConfig, ValidationResult,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn schema_config() -> SchemaConfig {
    serde_json::from_value(json!({
        "models": [
            {
                "name": "Product",
                "fields": [
                    { "name": "id", "type": "Int", "is_id": true, "has_default": true },
                    { "name": "name", "type": "String", "required": true, "unique": true },
                    { "name": "price", "type": "Float" },
                    { "name": "stock", "type": "Int" },
                    { "name": "note", "type": "String" }
                ]
            },
            {
                "name": "Tag",
                "fields": [
                    { "name": "id", "type": "String", "is_id": true, "has_default": true },
                    { "name": "label", "type": "String", "required": true }
                ]
            }
        ]
    }))
    .unwrap()
}

fn app(registries: Registries) -> Router {
    let schema = resolve(&schema_config()).unwrap();
    let store = DataStore::in_memory(&schema);
    api_router(AppState::new(schema, store, registries), 1024 * 1024)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_with(app, Request::builder().method(method).uri(uri), body).await
}

async fn call_with(
    app: &Router,
    builder: axum::http::request::Builder,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = match body {
        Some(b) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn crud_lifecycle() {
    let app = app(Registries::default());

    let (status, body) = call(&app, Method::POST, "/api/product", Some(json!({ "name": "bolt", "price": "1.5", "extra": 1 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1, "name": "bolt", "price": 1.5, "stock": null, "note": null }));

    let (status, body) = call(&app, Method::GET, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("bolt"));

    let (status, body) = call(&app, Method::PATCH, "/api/product/1", Some(json!({ "price": "12.5", "stock": "7 units" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (_, body) = call(&app, Method::GET, "/api/product/1", None).await;
    assert_eq!(body["price"], json!(12.5));
    assert_eq!(body["stock"], json!(7));

    let (status, _) = call(&app, Method::DELETE, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = call(&app, Method::GET, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not found" }));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app(Registries::default());
    for method in [Method::GET, Method::PATCH, Method::DELETE] {
        let (status, body) = call(&app, method, "/api/product/999", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Not found" }));
    }
    let (status, _) = call(&app, Method::GET, "/api/product/not-a-number", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_validates_then_creates_missing_row() {
    let app = app(Registries::default());
    let (status, body) = call(&app, Method::PUT, "/api/product/5", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": ["name is required"] }));

    let (status, body) = call(&app, Method::PUT, "/api/product/5", Some(json!({ "name": "five" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(5));

    let (status, _) = call(&app, Method::PUT, "/api/product/5", Some(json!({ "name": "FIVE", "price": 2 }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&app, Method::GET, "/api/product/5", None).await;
    assert_eq!(body["name"], json!("FIVE"));
}

#[tokio::test]
async fn duplicate_unique_value_is_reported() {
    let app = app(Registries::default());
    call(&app, Method::POST, "/api/product", Some(json!({ "name": "bolt" }))).await;
    let (status, body) = call(&app, Method::POST, "/api/product", Some(json!({ "name": "bolt" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": ["name already taken"] }));

    call(&app, Method::POST, "/api/product", Some(json!({ "name": "nut" }))).await;
    let (status, body) = call(&app, Method::PATCH, "/api/product/2", Some(json!({ "name": "bolt" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": ["name already taken"] }));
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let app = app(Registries::default());
    let (status, _) = call(&app, Method::POST, "/api/product", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_sorts_and_pages() {
    let app = app(Registries::default());
    for (name, price) in [("a", 3), ("b", 1), ("c", 2), ("d", 5)] {
        call(&app, Method::POST, "/api/product", Some(json!({ "name": name, "price": price }))).await;
    }

    let (status, body) = call(&app, Method::GET, "/api/product?price=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    assert_eq!(names, vec![json!("b"), json!("c"), json!("a"), json!("d")]);

    let (_, body) = call(&app, Method::GET, "/api/product?price=desc&limit=3&page=2", None).await;
    assert_eq!(body, json!([{ "id": 2, "name": "b", "price": 1.0, "stock": null, "note": null }]));

    let (_, body) = call(&app, Method::GET, "/api/product?limit=100&page=2", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn string_ids_are_generated() {
    let app = app(Registries::default());
    let (status, body) = call(&app, Method::POST, "/api/tag", Some(json!({ "label": "red" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();
    let (status, body) = call(&app, Method::GET, &format!("/api/tag/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], json!("red"));
}

#[tokio::test]
async fn none_rule_removes_model_routes() {
    let mut registries = Registries::default();
    registries.access.register(AccessRule::new("Tag", [AccessMethod::None]));
    let app = app(registries);
    let (status, _) = call(&app, Method::GET, "/api/tag", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::GET, "/api/product", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn get_rule_binds_only_reads() {
    let mut registries = Registries::default();
    registries.access.register(AccessRule::new("Product", [AccessMethod::Get]));
    let app = app(registries);
    let (status, _) = call(&app, Method::GET, "/api/product", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::POST, "/api/product", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = call(&app, Method::DELETE, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn api_key_hook_guards_writes_only() {
    let mut registries = Registries::default();
    let header = HeaderName::from_static("x-api-key");
    registries.access.register(
        AccessRule::new("Product", [AccessMethod::Post, AccessMethod::Delete])
            .with_hook(ApiKeyHook::new(header.clone(), "secret")),
    );
    registries.access.register(AccessRule::new("Product", [AccessMethod::Get]));
    let app = app(registries);

    let (status, body) = call(&app, Method::POST, "/api/product", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Unauthorized" }));

    let builder = Request::builder()
        .method(Method::POST)
        .uri("/api/product")
        .header(header, "secret");
    let (status, _) = call_with(&app, builder, Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(&app, Method::GET, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::OK);
}

struct ReadOnlyTags;

#[async_trait]
impl Processor for ReadOnlyTags {
    fn supports(&self, model: &str, request: &ApiRequest) -> bool {
        model == "Tag" && request.method != Method::GET
    }

    async fn process(&self, _model: &str, _request: &ApiRequest, reply: &mut Reply) {
        reply
            .set_status(StatusCode::FORBIDDEN)
            .send(json!({ "message": "tags are read-only" }));
    }
}

#[tokio::test]
async fn registered_processor_overrides_controller() {
    let mut registries = Registries::default();
    registries.processors.register(ReadOnlyTags);
    let app = app(registries);
    let (status, body) = call(&app, Method::POST, "/api/tag", Some(json!({ "label": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "tags are read-only" }));
    let (status, _) = call(&app, Method::GET, "/api/tag", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn filters_dtos_and_validators_apply() {
    let mut registries = Registries::default();
    registries.filters.register(FieldFilter::new("Product").contains("name"));
    registries.dtos.register(HideFields::new("Product", ["note"]));
    registries.validations.register(FnValidator::new("Tag", |data| {
        let mut result = ValidationResult::default();
        match data.get("label").and_then(Value::as_str) {
            Some(label) if !label.trim().is_empty() => {
                result.data.insert("label".into(), json!(label.trim()));
            }
            _ => result.errors.push("label must not be blank".into()),
        }
        result
    }));
    let app = app(registries);

    for name in ["Hex Bolt", "nut", "bolt"] {
        let (_, body) = call(&app, Method::POST, "/api/product", Some(json!({ "name": name, "note": "internal" }))).await;
        assert!(body.get("note").is_none());
    }
    let (_, body) = call(&app, Method::GET, "/api/product?name=BOLT", None).await;
    let names: Vec<_> = body.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    // `name=BOLT` also sorts by name, descending.
    assert_eq!(names, vec![json!("bolt"), json!("Hex Bolt")]);

    let (status, body) = call(&app, Method::POST, "/api/tag", Some(json!({ "label": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": ["label must not be blank"] }));
    let (status, body) = call(&app, Method::POST, "/api/tag", Some(json!({ "label": " red " }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["label"], json!("red"));
}

#[tokio::test]
async fn health_and_version() {
    let app = app(Registries::default());
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    let (_, body) = call(&app, Method::GET, "/version", None).await;
    assert_eq!(body["name"], json!("model-rest"));
}

#[tokio::test]
async fn unbound_method_is_405_even_when_sibling_has_hook() {
    let mut registries = Registries::default();
    registries.access.register(AccessRule::new("Product", [AccessMethod::Get]));
    registries.access.register(
        AccessRule::new("Product", [AccessMethod::Delete])
            .with_hook(ApiKeyHook::new(HeaderName::from_static("x-api-key"), "secret")),
    );
    let app = app(registries);

    let (status, _) = call(&app, Method::PATCH, "/api/product/1", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = call(&app, Method::PUT, "/api/product/1", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = call(&app, Method::DELETE, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, Method::GET, "/api/product/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn max_integer_id_is_accepted() {
    let app = app(Registries::default());
    let (status, body) = call(&app, Method::POST, "/api/product", Some(json!({ "id": i64::MAX, "name": "max" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(i64::MAX));

    let uri = format!("/api/product/{}", i64::MAX);
    let (status, _) = call(&app, Method::PUT, &uri, Some(json!({ "name": "renamed" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = call(&app, Method::POST, "/api/product", Some(json!({ "name": "next" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(1));
}
