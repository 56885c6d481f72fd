use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where uploaded images claim to live. Nothing is actually stored.
pub const STORAGE_URL: &str = "http://localhost:9000/admin-uploads";

pub type Record = Map<String, Value>;

#[derive(Clone, Debug)]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Default)]
pub struct Store {
    collections: HashMap<String, Vec<Record>>,
    admins: Vec<Admin>,
    /// Issued access token -> admin id.
    sessions: HashMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "message": message })))
}

fn not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, "not found")
}

fn bad_multipart(e: MultipartError) -> Failure {
    failure(StatusCode::BAD_REQUEST, &e.body_text())
}

pub fn app() -> Router {
    router(Db::default())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/auth/init-admin", post(init_admin))
        .route("/auth/login", post(login))
        .route("/whoami", get(whoami))
        .route("/uploads/images", post(upload_image))
        .route("/{collection}", get(list_records).post(create_record))
        .route(
            "/{collection}/{id}",
            get(get_record)
                .patch(patch_record)
                .post(override_record)
                .delete(delete_record),
        )
        .with_state(db)
}

/// Serve the API under `/api`, matching the client's default base URL.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, Router::new().nest("/api", app())).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Collections are open until the first login; after that a live token is
/// required.
fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), Failure> {
    if store.sessions.is_empty() {
        return Ok(());
    }
    match bearer(headers) {
        Some(token) if store.sessions.contains_key(token) => Ok(()),
        _ => {
            warn!("rejected request without a valid token");
            Err(failure(StatusCode::UNAUTHORIZED, "unauthorized"))
        }
    }
}

fn matches_filters(record: &Record, filters: &HashMap<String, String>) -> bool {
    filters
        .iter()
        .filter(|(key, _)| key.as_str() != "_method")
        .all(|(key, expected)| match record.get(key) {
            Some(Value::String(actual)) => actual == expected,
            Some(other) => other.to_string() == *expected,
            None => false,
        })
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn find_mut<'a>(store: &'a mut Store, collection: &str, id: &str) -> Result<&'a mut Record, Failure> {
    store
        .collections
        .get_mut(collection)
        .and_then(|records| records.iter_mut().find(|r| record_id(r) == Some(id)))
        .ok_or_else(not_found)
}

fn into_record(value: Value) -> Result<Record, Failure> {
    match value {
        Value::Object(record) => Ok(record),
        _ => Err(failure(StatusCode::BAD_REQUEST, "payload must be a JSON object")),
    }
}

/// Record body from either a JSON request or a multipart form carrying a
/// JSON `payload` field and an optional `image` file.
async fn read_payload(collection: &str, request: Request) -> Result<Record, Failure> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(value) = Json::<Value>::from_request(request, &())
            .await
            .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.body_text()))?;
        return into_record(value);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.body_text()))?;
    let mut record = None;
    let mut image_url = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "payload" => {
                let text = field.text().await.map_err(bad_multipart)?;
                let value = serde_json::from_str(&text)
                    .map_err(|e| failure(StatusCode::BAD_REQUEST, &format!("invalid payload: {e}")))?;
                record = Some(into_record(value)?);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                field.bytes().await.map_err(bad_multipart)?;
                image_url = Some(format!("{STORAGE_URL}/{collection}/{}-{file_name}", Uuid::new_v4().simple()));
            }
            _ => {}
        }
    }

    let mut record = record.ok_or_else(|| failure(StatusCode::BAD_REQUEST, "payload is required"))?;
    if let Some(url) = image_url {
        record.insert("image_url".to_string(), Value::String(url));
    }
    Ok(record)
}

// --- auth ---

#[derive(Deserialize)]
struct NewAdmin {
    email: String,
    password: String,
    name: String,
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn init_admin(
    State(db): State<Db>,
    Json(input): Json<NewAdmin>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    if input.email.is_empty() || input.password.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "email and password are required"));
    }
    let mut store = db.write().await;
    if !store.admins.is_empty() {
        return Err(failure(StatusCode::CONFLICT, "admin already initialized"));
    }
    let admin = Admin {
        id: Uuid::new_v4().to_string(),
        email: input.email,
        password: input.password,
        name: input.name,
    };
    info!(email = %admin.email, "admin initialized");
    let body = json!({
        "data": { "user": { "id": admin.id, "email": admin.email } },
        "message": "admin created",
    });
    store.admins.push(admin);
    Ok((StatusCode::CREATED, Json(body)))
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let admin = store
        .admins
        .iter()
        .find(|a| a.email == input.email && a.password == input.password)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "invalid credentials"))?;
    let token = Uuid::new_v4().simple().to_string();
    store.sessions.insert(token.clone(), admin.id.clone());
    info!(email = %admin.email, "admin logged in");
    Ok(Json(json!({
        "data": {
            "accessToken": token,
            "user": { "id": admin.id, "email": admin.email, "name": admin.name, "role": "admin" },
        },
        "message": "login successful",
    })))
}

async fn whoami(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    let admin = bearer(&headers)
        .and_then(|token| store.sessions.get(token))
        .and_then(|id| store.admins.iter().find(|a| &a.id == id))
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "unauthorized"))?;
    Ok(Json(json!({ "data": { "id": admin.id, "email": admin.email } })))
}

// --- uploads ---

async fn upload_image(
    State(db): State<Db>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, Failure> {
    authorize(&*db.read().await, &headers)?;

    let mut file_name = None;
    let mut folder = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    file_name = Some(original);
                }
            }
            "folder" => folder = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }

    let Some(file_name) = file_name else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "file is required", "error": "missing file field" })),
        ));
    };
    let folder = folder
        .as_deref()
        .map(|f| f.trim_matches('/'))
        .filter(|f| !f.is_empty())
        .unwrap_or("images")
        .to_string();
    let object_name = format!("{folder}/{}-{file_name}", Uuid::new_v4().simple());
    info!(%object_name, "image uploaded");
    Ok(Json(json!({
        "message": "Image uploaded successfully",
        "object_name": object_name,
        "url": format!("{STORAGE_URL}/{object_name}"),
    })))
}

// --- collections ---

async fn list_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let records: Vec<&Record> = store
        .collections
        .get(&collection)
        .map(|records| records.iter().filter(|r| matches_filters(r, &filters)).collect())
        .unwrap_or_default();
    debug!(%collection, count = records.len(), "listed records");
    Ok(Json(json!({ "data": records })))
}

async fn create_record(
    State(db): State<Db>,
    Path(collection): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<Value>), Failure> {
    authorize(&*db.read().await, request.headers())?;
    let mut record = read_payload(&collection, request).await?;
    let id = match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => Uuid::new_v4().to_string(),
    };
    record.insert("id".to_string(), Value::String(id.clone()));

    let mut store = db.write().await;
    let records = store.collections.entry(collection.clone()).or_default();
    if records.iter().any(|r| record_id(r) == Some(id.as_str())) {
        return Err(failure(StatusCode::CONFLICT, "already exists"));
    }
    records.push(record.clone());
    info!(%collection, %id, "created record");
    Ok((StatusCode::CREATED, Json(json!({ "data": record, "message": "created" }))))
}

async fn get_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let record = store
        .collections
        .get(&collection)
        .and_then(|records| records.iter().find(|r| record_id(r) == Some(id.as_str())))
        .ok_or_else(not_found)?;
    Ok(Json(json!({ "data": record })))
}

/// Partial update: supplied fields overwrite, the id never changes.
async fn patch_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    request: Request,
) -> Result<Json<Value>, Failure> {
    authorize(&*db.read().await, request.headers())?;
    let changes = read_payload(&collection, request).await?;
    let mut store = db.write().await;
    let record = find_mut(&mut store, &collection, &id)?;
    for (key, value) in changes {
        if key != "id" {
            record.insert(key, value);
        }
    }
    info!(%collection, %id, "patched record");
    Ok(Json(json!({ "data": record, "message": "updated" })))
}

/// `POST /{collection}/{id}?_method=PUT`: full replacement.
async fn override_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Result<Json<Value>, Failure> {
    if !params.get("_method").is_some_and(|m| m.eq_ignore_ascii_case("PUT")) {
        return Err(failure(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"));
    }
    authorize(&*db.read().await, request.headers())?;
    let mut replacement = read_payload(&collection, request).await?;
    replacement.insert("id".to_string(), Value::String(id.clone()));

    let mut store = db.write().await;
    let record = find_mut(&mut store, &collection, &id)?;
    *record = replacement;
    info!(%collection, %id, "replaced record");
    Ok(Json(json!({ "data": record, "message": "updated" })))
}

async fn delete_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let records = store.collections.get_mut(&collection).ok_or_else(not_found)?;
    let index = records
        .iter()
        .position(|r| record_id(r) == Some(id.as_str()))
        .ok_or_else(not_found)?;
    records.remove(index);
    info!(%collection, %id, "deleted record");
    Ok(Json(json!({})))
}
