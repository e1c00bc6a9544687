//! Device backend capability

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::BackendError;

/// Status body returned by the device API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeviceState {
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub attributes: DeviceAttributes,

    /// ISO-8601 timestamp of the last state change
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Free-form device attributes; only the friendly name is read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    #[serde(default)]
    pub friendly_name: Option<String>,
}

/// Read and activate devices on the home automation backend
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Read-only status request
    async fn get_state(&self, device_id: &str) -> Result<RawDeviceState, BackendError>;

    /// Issue the activation command for a device
    async fn activate(&self, device_id: &str, control_path: &str) -> Result<(), BackendError>;
}
