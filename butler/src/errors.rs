//! Error types for the butler

use serde::Serialize;
use thiserror::Error;

/// Main error type for the butler
#[derive(Error, Debug)]
pub enum ButlerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Invalid transition: {0}")]
    TransitionError(String),
}

/// Longest backend message kept in reports
const MAX_MESSAGE_CHARS: usize = 200;

/// Collapse whitespace runs, newlines included, and cap the length
pub fn single_line(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => format!("{}...", &collapsed[..idx]),
        None => collapsed,
    }
}

/// Failure reported by a device backend call
///
/// Messages are always a single line; they end up as report items.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("{message}")]
    Transport { message: String },

    /// The backend answered with a non-success status
    #[error("{code}: {message}")]
    Status { code: u16, message: String },

    /// The response body could not be understood
    #[error("{message}")]
    Decode { message: String },
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        let message: String = message.into();
        BackendError::Transport {
            message: single_line(&message),
        }
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        BackendError::Status {
            code,
            message: single_line(&message),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        let message: String = message.into();
        BackendError::Decode {
            message: single_line(&message),
        }
    }

    /// HTTP status code, when the backend answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => BackendError::status(status.as_u16(), err.to_string()),
            None if err.is_decode() => BackendError::decode(err.to_string()),
            None => BackendError::transport(err.to_string()),
        }
    }
}

/// A dependency status check that did not yield a usable reading
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ProbeError {
    pub device_id: String,
    pub status_code: Option<u16>,
    pub message: String,
}

impl ProbeError {
    pub fn from_backend(device_id: &str, err: &BackendError) -> Self {
        Self {
            device_id: device_id.to_string(),
            status_code: err.status_code(),
            message: err.to_string(),
        }
    }
}

/// The requested device name matched nothing in the catalog
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("錯誤：找不到設備 '{query}'。可用的設備包括: {}", .available_names.join(", "))]
pub struct DeviceNotFound {
    pub query: String,
    pub available_names: Vec<String>,
}

/// Why a device command produced no report
#[derive(Error, Debug)]
pub enum ManageError {
    /// Target name unresolvable; carries the catalog listing
    #[error(transparent)]
    NotFound(#[from] DeviceNotFound),

    /// Catalog unavailable or internal fault
    #[error(transparent)]
    Failed(#[from] ButlerError),
}
