//! Demo server: schema from SCHEMA_PATH (or introspected from DATABASE_URL), PostgreSQL store
//! when a database is configured, in-memory store otherwise.
//!
//! `SCHEMA_PATH=demos/schema.json cargo run --example server`

use model_rest::{
    api_router, introspect, load_from_path, resolve, AccessMethod, AccessRule, ApiKeyHook, AppState,
    DataStore, FieldFilter, HideFields, Registries, Settings,
};
use axum::http::HeaderName;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("model_rest=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let (schema, store) = match &settings.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(url)
                .await?;
            let schema = match &settings.schema_path {
                Some(path) => load_from_path(path).await?,
                None => resolve(&introspect(&pool, &settings.db_schema).await?)?,
            };
            let store = DataStore::postgres(pool, &schema);
            (schema, store)
        }
        None => {
            let path = settings.schema_path.as_ref().ok_or("SCHEMA_PATH is required without DATABASE_URL")?;
            let schema = load_from_path(path).await?;
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            let store = DataStore::in_memory(&schema);
            (schema, store)
        }
    };

    let mut registries = Registries::default();
    if schema.model("Product").is_some() {
        registries.filters.register(FieldFilter::new("Product").contains("name"));
        registries.dtos.register(HideFields::new("Product", ["cost"]));
        if let Ok(key) = std::env::var("API_KEY") {
            let header = HeaderName::from_static("x-api-key");
            registries.access.register(AccessRule::new("Product", [AccessMethod::Get]));
            registries.access.register(
                AccessRule::new(
                    "Product",
                    [AccessMethod::Post, AccessMethod::Put, AccessMethod::Patch, AccessMethod::Delete],
                )
                .with_hook(ApiKeyHook::new(header, key)),
            );
        }
    }

    let app = api_router(AppState::new(schema, store, registries), settings.body_limit);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
