//! Authenticated HTTP client for the admin API.
//!
//! # Design
//! `ApiClient` holds only a base URL, a token provider and a transport. Each
//! call builds one `HttpRequest`, executes it once and interprets the
//! response; there is no retry, no timeout and no cached token. Every failure
//! collapses into an `ApiError` whose text is what an operator should see.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::envelope::UploadedImage;
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, RequestBody, Upload};
use crate::resource::{Resource, ResourceConfig};
use crate::token::{TokenProvider, TokenStore};
use crate::transport::{ReqwestTransport, Transport};

pub const UPLOAD_IMAGES_PATH: &str = "/uploads/images";

/// Verb for combined image + record writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultipartMethod {
    #[default]
    Post,
    Patch,
}

impl From<MultipartMethod> for HttpMethod {
    fn from(method: MultipartMethod) -> Self {
        match method {
            MultipartMethod::Post => HttpMethod::Post,
            MultipartMethod::Patch => HttpMethod::Patch,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Arc<dyn TokenProvider>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        token: impl TokenProvider + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(token),
            transport: Arc::new(transport),
        }
    }

    /// Client over `reqwest` that reads its token from the configured store.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(
            &config.base_url,
            TokenStore::new(&config.token_path),
            ReqwestTransport::new()?,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind a CRUD resource to this client.
    pub fn resource<TItem, TCreate, TUpdate>(&self, config: ResourceConfig) -> Resource<TItem, TCreate, TUpdate> {
        Resource::new(self.clone(), config)
    }

    pub fn build_json_request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        self.push_authorization(&mut headers);
        HttpRequest {
            method,
            url: self.url(path),
            headers,
            body: body.map(RequestBody::Json),
        }
    }

    /// Multipart request. No `Content-Type` is set here; the transport
    /// writes it together with the boundary.
    pub fn build_multipart_request(&self, method: HttpMethod, path: &str, parts: Vec<FormPart>) -> HttpRequest {
        let mut headers = Vec::new();
        self.push_authorization(&mut headers);
        HttpRequest {
            method,
            url: self.url(path),
            headers,
            body: Some(RequestBody::Multipart(parts)),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.build_json_request(HttpMethod::Get, path, None);
        self.send(request, path)
    }

    pub fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.build_json_request(HttpMethod::Post, path, Some(to_json(body)?));
        self.send(request, path)
    }

    pub fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.build_json_request(HttpMethod::Patch, path, Some(to_json(body)?));
        self.send(request, path)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.build_json_request(HttpMethod::Delete, path, None);
        self.send(request, path)
    }

    /// Store an image under `folder` (e.g. `products`, `users/avatars`).
    pub fn upload_image(&self, file: &Upload, folder: &str) -> Result<UploadedImage, ApiError> {
        let parts = vec![FormPart::file("file", file.clone()), FormPart::text("folder", folder)];
        let request = self.build_multipart_request(HttpMethod::Post, UPLOAD_IMAGES_PATH, parts);
        self.send(request, UPLOAD_IMAGES_PATH)
    }

    /// Create or update a record together with an optional image. The record
    /// travels JSON-encoded in the `payload` field, the file in `image`.
    pub fn post_with_image<T: DeserializeOwned, D: Serialize + ?Sized>(
        &self,
        path: &str,
        image: Option<&Upload>,
        data: &D,
        method: MultipartMethod,
    ) -> Result<T, ApiError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(FormPart::file("image", image.clone()));
        }
        parts.push(FormPart::text("payload", to_json(data)?));
        let request = self.build_multipart_request(method.into(), path, parts);
        self.send(request, path)
    }

    /// JSON POST without credentials, for the login endpoints. A failure
    /// without a readable message reports `fallback`.
    pub fn post_public<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(to_json(body)?)),
        };
        let response = self.execute(request, path)?;
        if !response.is_success() {
            let message = failure_message(&response.body).unwrap_or_else(|| fallback.to_string());
            warn!(path, status = response.status, %message, "admin api request rejected");
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }
        decode(&response.body)
    }

    fn send<T: DeserializeOwned>(&self, request: HttpRequest, path: &str) -> Result<T, ApiError> {
        let method = request.method;
        let response = self.execute(request, path)?;
        if !response.is_success() {
            let err = status_error(method, path, &response);
            warn!(method = method.as_str(), path, status = response.status, error = %err, "admin api request rejected");
            return Err(err);
        }
        decode(&response.body)
    }

    fn execute(&self, request: HttpRequest, path: &str) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        debug!(method = method.as_str(), path, "admin api request");
        self.transport.execute(request).map_err(|e| {
            let err = ApiError::Transport(format!("{} {path} failed: {e}", method.as_str()));
            warn!(error = %err, "admin api transport failure");
            err
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn push_authorization(&self, headers: &mut Vec<(String, String)>) {
        if let Some(token) = self.token.token().filter(|t| !t.is_empty()) {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Decode a 2xx body. An empty body reads as `{}`.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// The backend's own explanation: `message`, then `error`.
fn failure_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"].into_iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

fn status_error(method: HttpMethod, path: &str, response: &HttpResponse) -> ApiError {
    let message = failure_message(&response.body)
        .unwrap_or_else(|| format!("{} {path} failed: {}", method.as_str(), response.status));
    ApiError::Status {
        status: response.status,
        message,
    }
}
