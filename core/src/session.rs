//! Login, logout and session checks for the admin console.
//!
//! The session owns the `TokenStore` the client reads from. A failed
//! `/whoami` lookup is taken as an expired or revoked token and the stored
//! token is removed, which is what sends the operator back to the login
//! screen.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::token::{TokenProvider, TokenStore};
use crate::transport::ReqwestTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Line,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Line => "line",
        }
    }
}

/// The signed-in operator as reported by `/whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthData {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub data: AuthData,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitAdminData {
    pub user: CurrentUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitAdminResponse {
    pub data: InitAdminData,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct NewAdmin<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct OAuthExchange<'a> {
    code: &'a str,
    state: &'a str,
}

#[derive(Deserialize)]
struct WhoAmI {
    data: CurrentUser,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    client: ApiClient,
    store: TokenStore,
}

impl AuthSession {
    /// `client` should read its token from `store`.
    pub fn new(client: ApiClient, store: TokenStore) -> Self {
        Self { client, store }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let store = TokenStore::new(&config.token_path);
        let client = ApiClient::new(&config.base_url, store.clone(), ReqwestTransport::new()?);
        Ok(Self::new(client, store))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.token().is_some()
    }

    /// Password login. The returned access token is persisted.
    pub fn login_with_password(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse =
            self.client
                .post_public("/auth/login", &Credentials { email, password }, "Login failed")?;
        self.store.set(&response.data.access_token)?;
        info!(email, "admin logged in");
        Ok(response)
    }

    /// Create the first administrator on a fresh backend.
    pub fn init_admin(&self, email: &str, password: &str, name: &str) -> Result<InitAdminResponse, ApiError> {
        self.client.post_public(
            "/auth/init-admin",
            &NewAdmin { email, password, name },
            "Failed to initialize admin",
        )
    }

    /// Where to send the operator to begin an OAuth login.
    pub fn oauth_start_url(&self, provider: OAuthProvider) -> String {
        format!("{}/auth/{}/start", self.client.base_url(), provider.as_str())
    }

    /// Trade the provider callback's `code` and `state` for an access token,
    /// which is persisted.
    pub fn exchange_oauth_code(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> Result<AuthResponse, ApiError> {
        let path = format!("/auth/{}/exchange", provider.as_str());
        let response: AuthResponse =
            self.client
                .post_public(&path, &OAuthExchange { code, state }, "Authentication failed")?;
        self.store.set(&response.data.access_token)?;
        Ok(response)
    }

    /// Adopt `token` and look up who it belongs to.
    pub fn login(&self, token: &str) -> Result<Option<CurrentUser>, ApiError> {
        self.store.set(token)?;
        self.refresh_user()
    }

    /// `None` when logged out. Any failure of the lookup drops the token.
    pub fn refresh_user(&self) -> Result<Option<CurrentUser>, ApiError> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        match self.client.get::<WhoAmI>("/whoami") {
            Ok(whoami) => Ok(Some(whoami.data)),
            Err(e) => {
                warn!(error = %e, "session check failed, clearing admin token");
                self.store.remove()?;
                Ok(None)
            }
        }
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.remove()
    }
}
