//! Environment-driven client settings.

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TOKEN_PATH: &str = ".admin/storage.json";

pub const BASE_URL_VAR: &str = "ADMIN_API_BASE_URL";
pub const TOKEN_PATH_VAR: &str = "ADMIN_TOKEN_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`; unset or blank values fall back
    /// to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let base_url = get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token_path = get(TOKEN_PATH_VAR).unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_path: PathBuf::from(token_path),
        }
    }
}
