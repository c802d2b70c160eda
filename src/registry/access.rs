//! Access rules: which route shapes a model exposes, and the pre-request hooks guarding them.
//!
//! A model with no rules exposes everything. Any rule listing `none` hides the model entirely.
//! Otherwise a route is bound when some rule lists its shape, `get` (for the two GET shapes), or `all`.

use crate::error::AppError;
use crate::response::Reply;
use async_trait::async_trait;
use axum::http::{request::Parts, HeaderName, Method};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    Get,
    GetItem,
    GetCollection,
    Post,
    Put,
    Patch,
    Delete,
    All,
    None,
}

/// The six canonical routes derived per model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteShape {
    Post,
    GetCollection,
    GetItem,
    Put,
    Patch,
    Delete,
}

impl RouteShape {
    pub const ALL: [RouteShape; 6] = [
        RouteShape::Post,
        RouteShape::GetCollection,
        RouteShape::GetItem,
        RouteShape::Put,
        RouteShape::Patch,
        RouteShape::Delete,
    ];

    pub fn access_method(self) -> AccessMethod {
        match self {
            RouteShape::Post => AccessMethod::Post,
            RouteShape::GetCollection => AccessMethod::GetCollection,
            RouteShape::GetItem => AccessMethod::GetItem,
            RouteShape::Put => AccessMethod::Put,
            RouteShape::Patch => AccessMethod::Patch,
            RouteShape::Delete => AccessMethod::Delete,
        }
    }

    pub fn http_method(self) -> Method {
        match self {
            RouteShape::Post => Method::POST,
            RouteShape::GetCollection | RouteShape::GetItem => Method::GET,
            RouteShape::Put => Method::PUT,
            RouteShape::Patch => Method::PATCH,
            RouteShape::Delete => Method::DELETE,
        }
    }

    pub fn is_get(self) -> bool {
        matches!(self, RouteShape::GetCollection | RouteShape::GetItem)
    }

    /// Item routes carry `/:id`.
    pub fn is_item(self) -> bool {
        !matches!(self, RouteShape::Post | RouteShape::GetCollection)
    }
}

/// Action run before the handler. `Err` short-circuits the request with that reply.
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn on_request(&self, model: &str, parts: &Parts) -> Result<(), Reply>;
}

#[derive(Clone)]
pub struct AccessRule {
    pub model: String,
    pub methods: Vec<AccessMethod>,
    pub hooks: Vec<Arc<dyn RequestHook>>,
}

impl AccessRule {
    pub fn new(model: impl Into<String>, methods: impl IntoIterator<Item = AccessMethod>) -> Self {
        AccessRule {
            model: model.into(),
            methods: methods.into_iter().collect(),
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn denies_all(&self) -> bool {
        self.methods.contains(&AccessMethod::None)
    }

    pub fn allows(&self, shape: RouteShape) -> bool {
        self.methods.contains(&shape.access_method())
            || (shape.is_get() && self.methods.contains(&AccessMethod::Get))
            || self.methods.contains(&AccessMethod::All)
    }
}

impl std::fmt::Debug for AccessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessRule")
            .field("model", &self.model)
            .field("methods", &self.methods)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Rule declared as data; hooks are attached in code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessRuleConfig {
    pub model: String,
    pub methods: Vec<AccessMethod>,
}

impl From<AccessRuleConfig> for AccessRule {
    fn from(c: AccessRuleConfig) -> Self {
        AccessRule::new(c.model, c.methods)
    }
}

#[derive(Default, Debug)]
pub struct AccessControlRegistry {
    rules: Vec<AccessRule>,
}

impl AccessControlRegistry {
    pub fn register(&mut self, rule: AccessRule) {
        self.rules.push(rule);
    }

    pub fn register_rules(&mut self, rules: impl IntoIterator<Item = AccessRule>) {
        self.rules.extend(rules);
    }

    pub fn rules_for(&self, model: &str) -> Vec<&AccessRule> {
        self.rules.iter().filter(|r| r.model == model).collect()
    }
}

/// Decide whether `shape` is bound for a model with `rules`; if so, the hooks to attach, in rule order.
pub fn plan_route(rules: &[&AccessRule], shape: RouteShape) -> Option<Vec<Arc<dyn RequestHook>>> {
    if rules.is_empty() {
        return Some(Vec::new());
    }
    if rules.iter().any(|r| r.denies_all()) {
        return None;
    }
    let matching: Vec<&&AccessRule> = rules.iter().filter(|r| r.allows(shape)).collect();
    if matching.is_empty() {
        return None;
    }
    Some(matching.iter().flat_map(|r| r.hooks.iter().cloned()).collect())
}

/// Requires a header to carry a fixed value; 401 otherwise.
pub struct ApiKeyHook {
    header: HeaderName,
    expected: String,
}

impl ApiKeyHook {
    pub fn new(header: HeaderName, expected: impl Into<String>) -> Self {
        ApiKeyHook {
            header,
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl RequestHook for ApiKeyHook {
    async fn on_request(&self, model: &str, parts: &Parts) -> Result<(), Reply> {
        let presented = parts.headers.get(&self.header).and_then(|v| v.to_str().ok());
        if presented == Some(self.expected.as_str()) {
            return Ok(());
        }
        tracing::debug!(model = %model, header = %self.header, "api key rejected");
        Err(AppError::Unauthorized.into_reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use std::sync::Mutex;

    struct Noop;

    #[async_trait]
    impl RequestHook for Noop {
        async fn on_request(&self, _model: &str, _parts: &Parts) -> Result<(), Reply> {
            Ok(())
        }
    }

    fn plan(rules: &[AccessRule], shape: RouteShape) -> Option<usize> {
        let refs: Vec<&AccessRule> = rules.iter().collect();
        plan_route(&refs, shape).map(|hooks| hooks.len())
    }

    #[test]
    fn no_rules_opens_every_shape() {
        for shape in RouteShape::ALL {
            assert_eq!(plan(&[], shape), Some(0));
        }
    }

    #[test]
    fn none_suppresses_everything() {
        let rules = vec![
            AccessRule::new("Widget", [AccessMethod::All]),
            AccessRule::new("Widget", [AccessMethod::None]),
        ];
        for shape in RouteShape::ALL {
            assert_eq!(plan(&rules, shape), None);
        }
    }

    #[test]
    fn get_covers_both_get_shapes_only() {
        let rules = vec![AccessRule::new("Widget", [AccessMethod::Get]).with_hook(Noop)];
        assert_eq!(plan(&rules, RouteShape::GetItem), Some(1));
        assert_eq!(plan(&rules, RouteShape::GetCollection), Some(1));
        assert_eq!(plan(&rules, RouteShape::Post), None);
        assert_eq!(plan(&rules, RouteShape::Delete), None);
    }

    struct Tag(&'static str, Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl RequestHook for Tag {
        async fn on_request(&self, _model: &str, _parts: &Parts) -> Result<(), Reply> {
            self.1.lock().unwrap().push(self.0);
            Ok(())
        }
    }

    #[tokio::test]
    async fn hooks_flatten_in_rule_then_hook_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tag = |name| Tag(name, seen.clone());
        let rules = vec![
            AccessRule::new("Widget", [AccessMethod::Post]).with_hook(tag("a1")).with_hook(tag("a2")),
            AccessRule::new("Widget", [AccessMethod::GetItem]).with_hook(tag("skipped")),
            AccessRule::new("Widget", [AccessMethod::All]).with_hook(tag("b1")),
        ];
        let refs: Vec<&AccessRule> = rules.iter().collect();
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        for hook in plan_route(&refs, RouteShape::Post).unwrap() {
            hook.on_request("Widget", &parts).await.unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "a2", "b1"]);

        assert_eq!(plan(&rules, RouteShape::GetItem), Some(2));
        assert_eq!(plan(&rules, RouteShape::Patch), Some(1));
    }

    #[test]
    fn rules_deserialize_from_snake_case() {
        let config: AccessRuleConfig = serde_json::from_value(serde_json::json!({
            "model": "Widget",
            "methods": ["get_item", "post"]
        }))
        .unwrap();
        let rule = AccessRule::from(config);
        assert!(rule.allows(RouteShape::GetItem));
        assert!(!rule.allows(RouteShape::GetCollection));

        let mut registry = AccessControlRegistry::default();
        registry.register_rules([rule, AccessRule::new("Gadget", [AccessMethod::All])]);
        assert_eq!(registry.rules_for("Widget").len(), 1);
        assert!(registry.rules_for("Thing").is_empty());
    }

    #[tokio::test]
    async fn api_key_hook_checks_header() {
        let hook = ApiKeyHook::new(HeaderName::from_static("x-api-key"), "secret");
        let (ok, _) = Request::builder()
            .header("x-api-key", "secret")
            .body(())
            .unwrap()
            .into_parts();
        assert!(hook.on_request("Widget", &ok).await.is_ok());

        let (missing, _) = Request::builder().body(()).unwrap().into_parts();
        let reply = hook.on_request("Widget", &missing).await.unwrap_err();
        assert_eq!(reply.status(), StatusCode::UNAUTHORIZED);
    }
}
