//! Typed errors and HTTP mapping.

use crate::response::Reply;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const GENERIC_FAILURE: &str = "Something went wrong.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate model: {0}")]
    DuplicateModel(String),
    #[error("model {model} must have exactly one identifier field, found {count}")]
    InvalidIdentifier { model: String, count: usize },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Store failure. `Display` is the textual error the controller classifies.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint failed on the fields: ({})", quote_fields(.0))]
    UniqueViolation(Vec<String>),
    #[error("Argument `{0}` is missing.")]
    MissingArgument(String),
    #[error("Record to {0} not found.")]
    RecordNotFound(&'static str),
    #[error("no repository registered for model '{0}'")]
    UnknownModel(String),
    #[error("{0}")]
    Database(String),
}

fn quote_fields(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("`{}`", f))
        .collect::<Vec<_>>()
        .join(",")
}

fn pg_key_detail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Key \(([^)]*)\)=").expect("valid regex"))
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(pg) = db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
                match pg.code() {
                    "23505" => {
                        let fields = pg
                            .detail()
                            .and_then(|d| pg_key_detail().captures(d))
                            .map(|c| c[1].split(',').map(|s| s.trim().trim_matches('"').to_string()).collect())
                            .unwrap_or_else(|| pg.constraint().map(|c| vec![c.to_string()]).unwrap_or_default());
                        return StoreError::UniqueViolation(fields);
                    }
                    "23502" => {
                        if let Some(column) = pg.column() {
                            return StoreError::MissingArgument(column.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        StoreError::Database(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found")]
    NotFound,
    #[error("validation: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("constraint: {0}")]
    Constraint(String),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_)
            | AppError::Constraint(_)
            | AppError::Store(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn into_reply(self) -> Reply {
        let status = self.status();
        let body = match self {
            AppError::Config(e) => json!({ "message": e.to_string() }),
            AppError::NotFound => json!({ "message": NOT_FOUND_MESSAGE }),
            AppError::Unauthorized => json!({ "message": "Unauthorized" }),
            AppError::Validation(errors) => json!({ "errors": errors }),
            AppError::Constraint(msg) | AppError::BadRequest(msg) => json!({ "errors": [msg] }),
            AppError::Store(e) => {
                tracing::warn!(error = %e, "store failure");
                json!({ "errors": [GENERIC_FAILURE] })
            }
        };
        let mut reply = Reply::new();
        reply.set_status(status).send(body);
        reply
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_reply().into_response()
    }
}
