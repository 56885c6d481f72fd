//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in its own thread and
//! runtime, then drives the blocking client over real HTTP through
//! `ReqwestTransport`. This checks request building, the transport and
//! envelope parsing together.

use admin_core::catalog::{CategoryPayload, ProductPayload, UserPayload};
use admin_core::{
    AdminApi, ApiClient, ApiError, AuthSession, ListParams, MultipartMethod, NoToken, Record,
    ReqwestTransport, ResourceConfig, TokenStore, Upload,
};
use serde_json::{json, Value};

/// Start the mock server and return the client base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/api")
}

fn anonymous_client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, NoToken, ReqwestTransport::new().unwrap())
}

fn png() -> Upload {
    Upload::new("tea.png", "image/png", vec![0x89, b'P', b'N', b'G'])
}

#[test]
fn widgets_create_then_delete() {
    let base_url = spawn_server();
    let widgets = anonymous_client(&base_url).resource::<Value, Value, Value>(ResourceConfig::new("/widgets"));

    let created = widgets.create(&json!({"id": "1", "name": "A"})).unwrap();
    assert_eq!(created.data, Some(json!({"id": "1", "name": "A"})));

    let deleted = widgets.delete("1").unwrap();
    assert_eq!(deleted.data, None);
    assert_eq!(deleted.message, None);
}

#[test]
fn crud_lifecycle() {
    let base_url = spawn_server();
    let api = AdminApi::new(anonymous_client(&base_url));
    let categories = api.categories();

    // empty collection
    assert!(categories.list().unwrap().into_items().is_empty());

    // create
    let created = categories
        .create(&CategoryPayload {
            name: "Fruit".to_string(),
            slug: "fruit".to_string(),
            description: None,
        })
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(created.name, "Fruit");
    assert!(!created.id.is_empty());
    let id = created.id;

    categories
        .create(&CategoryPayload {
            name: "Dairy".to_string(),
            slug: "dairy".to_string(),
            description: Some("milk and cheese".to_string()),
        })
        .unwrap();

    // get
    let fetched = categories.get(&id).unwrap().into_data().unwrap();
    assert_eq!(fetched.slug, "fruit");

    // filtered list
    let dairy = categories
        .list_with(&ListParams::new().with("slug", "dairy").with_opt("name", None::<String>))
        .unwrap()
        .into_items();
    assert_eq!(dairy.len(), 1);
    assert_eq!(dairy[0].name, "Dairy");

    // PATCH update
    let updated = categories
        .update(
            &id,
            &CategoryPayload {
                name: "Fresh fruit".to_string(),
                slug: "fruit".to_string(),
                description: None,
            },
        )
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(updated.name, "Fresh fruit");
    assert_eq!(updated.id, id);

    // delete
    categories.delete(&id).unwrap();
    assert_eq!(categories.list().unwrap().into_items().len(), 1);

    // get after delete carries the backend message
    let err = categories.get(&id).unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "not found");
}

#[test]
fn users_update_through_method_override() {
    let base_url = spawn_server();
    let api = AdminApi::new(anonymous_client(&base_url));
    let users = api.users();

    let user = users
        .create(&UserPayload {
            email: Some("ann@shop.test".to_string()),
            name: Some("Ann".to_string()),
            phone: Some("555".to_string()),
            ..Default::default()
        })
        .unwrap()
        .into_data()
        .unwrap();

    // the override replaces the whole record, so the phone is gone
    let replaced = users
        .update(
            &user.id,
            &UserPayload {
                name: Some("Anna".to_string()),
                status: Some("active".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(replaced.id, user.id);
    assert_eq!(replaced.name.as_deref(), Some("Anna"));
    assert_eq!(replaced.phone, None);
    assert_eq!(replaced.email, None);
}

#[test]
fn untyped_catalog_resource() {
    let base_url = spawn_server();
    let api = AdminApi::new(anonymous_client(&base_url));
    let vendors = api.resource("vendors").unwrap();

    let mut record = Record::new();
    record.insert("name".to_string(), json!("Farm Co"));
    let created = vendors.create(&record).unwrap().into_data().unwrap();
    assert_eq!(created["name"], "Farm Co");

    let items = vendors.list().unwrap().into_items();
    assert_eq!(items.len(), 1);
    assert!(api.resource("spaceships").is_none());
}

#[test]
fn image_upload_and_record_with_image() {
    let base_url = spawn_server();
    let api = AdminApi::new(anonymous_client(&base_url));

    let uploaded = api.client().upload_image(&png(), "products").unwrap();
    assert_eq!(uploaded.message, "Image uploaded successfully");
    assert!(uploaded.object_name.starts_with("products/"));
    assert!(uploaded.url.ends_with(&uploaded.object_name));

    let payload = ProductPayload {
        name: Some("Green tea".to_string()),
        price: Some(4.5),
        ..Default::default()
    };
    let created: admin_core::Envelope<admin_core::catalog::Product> = api
        .client()
        .post_with_image("/products", Some(&png()), &payload, MultipartMethod::Post)
        .unwrap();
    let product = created.into_data().unwrap();
    assert_eq!(product.name, "Green tea");
    assert!(product.image_url.as_deref().is_some_and(|url| url.ends_with("-tea.png")));

    // a multipart PATCH without an image only changes the payload fields
    let changes = ProductPayload {
        price: Some(5.0),
        ..Default::default()
    };
    let patched: admin_core::Envelope<admin_core::catalog::Product> = api
        .client()
        .post_with_image(&format!("/products/{}", product.id), None, &changes, MultipartMethod::Patch)
        .unwrap();
    let patched = patched.into_data().unwrap();
    assert_eq!(patched.price, Some(5.0));
    assert_eq!(patched.image_url, product.image_url);
}

#[test]
fn session_lifecycle() {
    let base_url = spawn_server();
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("storage.json"));
    let client = ApiClient::new(&base_url, store.clone(), ReqwestTransport::new().unwrap());
    let session = AuthSession::new(client.clone(), store.clone());

    assert!(!session.is_authenticated());
    assert_eq!(session.refresh_user().unwrap(), None);

    let init = session.init_admin("root@shop.test", "secret", "Root").unwrap();
    assert_eq!(init.data.user.email, "root@shop.test");

    // a second init is refused with the backend's message
    let err = session.init_admin("x@shop.test", "pw", "X").unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "admin already initialized");

    let err = session.login_with_password("root@shop.test", "wrong").unwrap_err();
    assert_eq!(err.to_string(), "invalid credentials");
    assert!(!session.is_authenticated());

    let auth = session.login_with_password("root@shop.test", "secret").unwrap();
    assert!(session.is_authenticated());
    assert_eq!(store.get().unwrap().as_deref(), Some(auth.data.access_token.as_str()));

    let me = session.refresh_user().unwrap().unwrap();
    assert_eq!(me.email, "root@shop.test");
    assert_eq!(me.id, init.data.user.id);

    // the stored token now authorizes collection calls
    let api = AdminApi::new(client.clone());
    assert!(api.products().list().unwrap().into_items().is_empty());

    // a client without the token is turned away
    let err = AdminApi::new(anonymous_client(&base_url)).products().list().unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 401, .. }));
    assert_eq!(err.to_string(), "unauthorized");

    session.logout().unwrap();
    assert!(!session.is_authenticated());
    let err = api.products().list().unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[test]
fn stale_token_is_dropped() {
    let base_url = spawn_server();
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("storage.json"));
    let client = ApiClient::new(&base_url, store.clone(), ReqwestTransport::new().unwrap());
    let session = AuthSession::new(client, store.clone());

    assert_eq!(session.login("not-a-real-token").unwrap(), None);
    assert!(!session.is_authenticated());
    assert_eq!(store.get().unwrap(), None);
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    // bind and drop to get a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let client = anonymous_client(&format!("http://{addr}/api"));

    let err = client.get::<Value>("/products").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.to_string().starts_with("GET /products failed: "));
}
