//! Uniform CRUD access to one backend collection.
//!
//! A `Resource` is a base path plus an update verb bound to an `ApiClient`.
//! Each operation is exactly one client call; nothing is cached or
//! validated.

use std::fmt::{self, Display};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::error::ApiError;

/// How `update` reaches the backend. `Put` is sent as
/// `POST <path>/<id>?_method=PUT` for deployments that drop native PUT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateMethod {
    Put,
    #[default]
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    pub base_path: String,
    pub update_method: UpdateMethod,
}

impl ResourceConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            update_method: UpdateMethod::default(),
        }
    }

    pub fn with_update_method(mut self, update_method: UpdateMethod) -> Self {
        self.update_method = update_method;
        self
    }
}

/// Flat query parameters for `list_with`, kept in insertion order.
/// Entries without a value are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pairs: Vec<(String, Option<String>)>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), Some(value.to_string())));
        self
    }

    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.pairs.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// CRUD operations over `config.base_path`, typed by the listed item, the
/// create payload and the update payload.
pub struct Resource<TItem, TCreate = TItem, TUpdate = TCreate> {
    client: ApiClient,
    config: ResourceConfig,
    _types: PhantomData<fn() -> (TItem, TCreate, TUpdate)>,
}

impl<TItem, TCreate, TUpdate> Clone for Resource<TItem, TCreate, TUpdate> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            _types: PhantomData,
        }
    }
}

impl<TItem, TCreate, TUpdate> fmt::Debug for Resource<TItem, TCreate, TUpdate> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("config", &self.config).finish()
    }
}

impl<TItem, TCreate, TUpdate> Resource<TItem, TCreate, TUpdate> {
    pub fn new(client: ApiClient, config: ResourceConfig) -> Self {
        Self {
            client,
            config,
            _types: PhantomData,
        }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{id}", self.config.base_path)
    }
}

impl<TItem, TCreate, TUpdate> Resource<TItem, TCreate, TUpdate>
where
    TItem: DeserializeOwned,
    TCreate: Serialize,
    TUpdate: Serialize,
{
    pub fn list(&self) -> Result<Envelope<Vec<TItem>>, ApiError> {
        self.client.get(&self.config.base_path)
    }

    pub fn list_with(&self, params: &ListParams) -> Result<Envelope<Vec<TItem>>, ApiError> {
        let query = params.to_query_string();
        if query.is_empty() {
            return self.list();
        }
        self.client.get(&format!("{}?{query}", self.config.base_path))
    }

    pub fn get(&self, id: impl Display) -> Result<Envelope<TItem>, ApiError> {
        self.client.get(&self.item_path(id))
    }

    pub fn create(&self, payload: &TCreate) -> Result<Envelope<TItem>, ApiError> {
        self.client.post(&self.config.base_path, payload)
    }

    pub fn update(&self, id: impl Display, payload: &TUpdate) -> Result<Envelope<TItem>, ApiError> {
        let path = self.item_path(id);
        match self.config.update_method {
            UpdateMethod::Put => self.client.post(&format!("{path}?_method=PUT"), payload),
            UpdateMethod::Patch => self.client.patch(&path, payload),
        }
    }

    pub fn delete(&self, id: impl Display) -> Result<Envelope<Value>, ApiError> {
        self.client.delete(&self.item_path(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::http::{HttpMethod, RequestBody};
    use crate::token::NoToken;
    use crate::transport::testing::{RecordingTransport, BASE_URL};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        id: String,
        name: String,
    }

    fn widgets(method: UpdateMethod) -> (Resource<Widget, Value>, Arc<RecordingTransport>) {
        let transport = RecordingTransport::new();
        let client = ApiClient::new(BASE_URL, NoToken, transport.clone());
        let resource = client.resource(ResourceConfig::new("/widgets").with_update_method(method));
        (resource, transport)
    }

    fn json_body(body: &Option<RequestBody>) -> Value {
        match body {
            Some(RequestBody::Json(text)) => serde_json::from_str(text).unwrap(),
            other => panic!("expected json body, got {other:?}"),
        }
    }

    #[test]
    fn patch_is_the_default_update() {
        assert_eq!(ResourceConfig::new("/x").update_method, UpdateMethod::Patch);

        let (resource, transport) = widgets(UpdateMethod::Patch);
        resource.update("1", &json!({"name": "B"})).unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://api.test/widgets/1");
        assert!(!req.url.contains("_method"));
        assert_eq!(json_body(&req.body), json!({"name": "B"}));
    }

    #[test]
    fn put_update_uses_method_override() {
        let (resource, transport) = widgets(UpdateMethod::Put);
        resource.update("1", &json!({"name": "B"})).unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://api.test/widgets/1?_method=PUT");
        assert_eq!(json_body(&req.body), json!({"name": "B"}));
    }

    #[test]
    fn list_without_params_has_no_query() {
        let (resource, transport) = widgets(UpdateMethod::Patch);
        resource.list().unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://api.test/widgets");
        assert!(req.body.is_none());
    }

    #[test]
    fn list_omits_undefined_params() {
        let (resource, transport) = widgets(UpdateMethod::Patch);
        let params = ListParams::new().with("a", 1).with_opt("b", None::<i32>);
        resource.list_with(&params).unwrap();
        assert_eq!(transport.last().url, "http://api.test/widgets?a=1");
    }

    #[test]
    fn list_params_keep_order_and_encode() {
        let params = ListParams::new()
            .with("q", "red shoes")
            .with("active", true)
            .with_opt("page", Some(2));
        assert_eq!(params.to_query_string(), "q=red+shoes&active=true&page=2");
    }

    #[test]
    fn list_with_only_missing_values_has_no_query() {
        let (resource, transport) = widgets(UpdateMethod::Patch);
        resource.list_with(&ListParams::new().with_opt("b", None::<&str>)).unwrap();
        assert_eq!(transport.last().url, "http://api.test/widgets");
    }

    #[test]
    fn list_without_data_is_empty() {
        let (resource, transport) = widgets(UpdateMethod::Patch);
        transport.respond(200, r#"{"message":"ok"}"#);
        assert!(resource.list().unwrap().into_items().is_empty());
    }

    #[test]
    fn get_create_delete_paths() {
        let (resource, transport) = widgets(UpdateMethod::Patch);
        transport.respond(200, r#"{"data":{"id":"1","name":"A"}}"#);
        let fetched = resource.get("1").unwrap().into_data();
        assert_eq!(fetched, Some(Widget { id: "1".into(), name: "A".into() }));

        resource.create(&json!({"name": "A"})).unwrap();
        resource.delete(uuid::Uuid::nil()).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://api.test/widgets/1");
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].url, "http://api.test/widgets");
        assert_eq!(json_body(&requests[1].body), json!({"name": "A"}));
        assert_eq!(requests[2].method, HttpMethod::Delete);
        assert_eq!(
            requests[2].url,
            "http://api.test/widgets/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn create_then_delete_round() {
        let (resource, transport) = widgets(UpdateMethod::Patch);
        transport.respond(201, r#"{"data":{"id":"1","name":"A"}}"#);
        transport.respond(200, "{}");

        let created = resource.create(&json!({"name": "A"})).unwrap();
        assert_eq!(created, Envelope::new(Widget { id: "1".into(), name: "A".into() }));

        let deleted = resource.delete("1").unwrap();
        assert_eq!(deleted, Envelope::default());
    }
}
