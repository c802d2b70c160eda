//! Inbound request as seen by processors: method, optional id, JSON body, ordered query items.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Query, Request},
    http::{HeaderMap, Method},
};
use serde_json::{Map, Value};

/// Query-string items in request order. Repeated keys are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryItems(Vec<(String, String)>);

impl QueryItems {
    pub fn new(items: Vec<(String, String)>) -> Self {
        QueryItems(items)
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryItems {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryItems(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    /// `:id` path parameter; set by the item routes.
    pub id: Option<String>,
    pub body: Map<String, Value>,
    pub query: QueryItems,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method) -> Self {
        ApiRequest {
            method,
            id: None,
            body: Map::new(),
            query: QueryItems::default(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Non-object values leave the body empty.
    pub fn with_body(mut self, body: Value) -> Self {
        if let Value::Object(map) = body {
            self.body = map;
        }
        self
    }

    pub fn with_query(mut self, query: QueryItems) -> Self {
        self.query = query;
        self
    }
}

fn body_to_map(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
    match value {
        Value::Object(m) => Ok(m),
        Value::Null => Ok(Map::new()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

#[async_trait]
impl<S> FromRequest<S> for ApiRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let Query(items) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(format!("invalid query string: {}", e)))?;
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| AppError::BadRequest(format!("unreadable body: {}", e)))?;
        Ok(ApiRequest {
            method: parts.method,
            id: None,
            body: body_to_map(&bytes)?,
            query: QueryItems::new(items),
            headers: parts.headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn extracts_query_in_order_and_empty_body() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/widget?name=asc&page=2&name=desc")
            .body(Body::empty())
            .unwrap();
        let api = ApiRequest::from_request(req, &()).await.unwrap();
        assert_eq!(api.method, Method::GET);
        assert!(api.body.is_empty());
        let keys: Vec<_> = api.query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "page", "name"]);
        assert_eq!(api.query.get("name"), Some("asc"));
    }

    #[tokio::test]
    async fn rejects_non_object_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/widget")
            .body(Body::from("[1, 2]"))
            .unwrap();
        let err = ApiRequest::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn null_body_is_empty_map() {
        assert!(body_to_map(b"null").unwrap().is_empty());
        assert!(body_to_map(b"  \n").unwrap().is_empty());
    }
}
