//! Client core for the commerce admin API.
//!
//! # Overview
//! Every admin screen follows the same shape: list a collection, create or
//! edit one record, delete, reload. This crate provides the two pieces that
//! shape rests on, plus the few helpers that join collections client-side.
//!
//! # Design
//! - `ApiClient` builds each request as plain data (`http`), injects the
//!   bearer token from a `TokenProvider`, runs it once through a `Transport`
//!   and turns any non-2xx answer into an `ApiError` carrying the backend's
//!   message.
//! - `Resource` maps a collection path to `list/get/create/update/delete`,
//!   with the update verb (`PATCH`, or `PUT` via `?_method=PUT`) chosen per
//!   collection.
//! - `TokenStore` persists the admin token on disk and is re-read on every
//!   request; `AuthSession` drives login, logout and session checks on top
//!   of it.
//! - `catalog`, `grouping` and `dashboard` cover the typed collections and
//!   the in-memory joins the console performs.

pub mod catalog;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod grouping;
pub mod http;
pub mod resource;
pub mod session;
pub mod token;
pub mod transport;

pub use catalog::{AdminApi, Record, ResourceDef, RESOURCES};
pub use client::{ApiClient, MultipartMethod};
pub use config::ClientConfig;
pub use envelope::{Envelope, UploadedImage};
pub use error::ApiError;
pub use http::{FormPart, HttpMethod, HttpRequest, HttpResponse, PartValue, RequestBody, Upload};
pub use resource::{ListParams, Resource, ResourceConfig, UpdateMethod};
pub use session::{AuthSession, CurrentUser, OAuthProvider};
pub use token::{NoToken, TokenProvider, TokenStore, ADMIN_TOKEN_KEY};
pub use transport::{ReqwestTransport, Transport};
