//! The `{ data, message }` wrapper every admin endpoint answers with.

use serde::{Deserialize, Serialize};

/// Response wrapper. Both fields are optional on the wire; a missing
/// `data` is an empty result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            data: None,
            message: None,
        }
    }
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl<T> Envelope<Vec<T>> {
    /// The listed items, or nothing when the server left `data` out.
    pub fn into_items(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

/// Body returned by `POST /uploads/images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub object_name: String,
    pub url: String,
    #[serde(default)]
    pub message: String,
}
