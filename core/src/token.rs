//! Bearer token sources.
//!
//! The client never caches a token: it asks its `TokenProvider` on every
//! request, so a login or logout elsewhere is visible on the next call.
//! `TokenStore` is the persistent provider, a small JSON key/value file that
//! plays the part browser local storage plays for the web console.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// Key the admin token is stored under.
pub const ADMIN_TOKEN_KEY: &str = "admin_token";

/// Supplies the current bearer token, if any.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Provider for unauthenticated clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// File-backed key/value storage holding the admin token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Option<String>, ApiError> {
        let entries = self.load()?;
        Ok(entries
            .get(ADMIN_TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .cloned())
    }

    pub fn set(&self, token: &str) -> Result<(), ApiError> {
        let mut entries = self.load()?;
        entries.insert(ADMIN_TOKEN_KEY.to_string(), token.to_string());
        self.save(&entries)
    }

    pub fn remove(&self) -> Result<(), ApiError> {
        let mut entries = self.load()?;
        if entries.remove(ADMIN_TOKEN_KEY).is_some() {
            debug!(path = %self.path.display(), "admin token removed");
            self.save(&entries)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, String>, ApiError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| ApiError::Storage(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ApiError::Storage(e.to_string())),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| ApiError::Storage(e.to_string()))?;

        // Readers must only ever see a complete file: write aside, then rename.
        let temp_path = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, raw).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            ApiError::Storage(e.to_string())
        })
    }
}

impl TokenProvider for TokenStore {
    /// Unreadable storage counts as logged out.
    fn token(&self) -> Option<String> {
        self.get().unwrap_or_else(|e| {
            debug!(error = %e, "token store unreadable");
            None
        })
    }
}
