//! Live status probing and normalization

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{DeviceBackend, RawDeviceState};
use crate::errors::ProbeError;

/// A reading older than this many seconds is stale
pub const STALENESS_THRESHOLD_SECS: i64 = 300;

/// Normalized device power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

impl PowerState {
    /// Case-insensitive; anything but on/off is unknown
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "on" => PowerState::On,
            "off" => PowerState::Off,
            _ => PowerState::Unknown,
        }
    }
}

/// One normalized status reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub raw_state: PowerState,
    pub friendly_name: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub probed_at: DateTime<Utc>,
}

impl DeviceStatus {
    pub fn is_online(&self) -> bool {
        matches!(self.raw_state, PowerState::On | PowerState::Off)
    }

    /// A device that never reports a timestamp counts as recent.
    pub fn is_recent(&self) -> bool {
        match self.last_updated {
            Some(updated) => {
                (self.probed_at - updated).num_milliseconds() < STALENESS_THRESHOLD_SECS * 1000
            }
            None => true,
        }
    }
}

/// Parse an ISO-8601 timestamp; values without an offset are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Turn a backend status body into a [`DeviceStatus`]
pub fn normalize(
    device_id: &str,
    raw: RawDeviceState,
    probed_at: DateTime<Utc>,
) -> Result<DeviceStatus, ProbeError> {
    let last_updated = match raw.last_updated.as_deref() {
        Some(text) => Some(parse_timestamp(text).ok_or_else(|| ProbeError {
            device_id: device_id.to_string(),
            status_code: None,
            message: format!("invalid last_updated timestamp '{}'", text),
        })?),
        None => None,
    };

    Ok(DeviceStatus {
        device_id: device_id.to_string(),
        raw_state: raw
            .state
            .as_deref()
            .map(PowerState::parse)
            .unwrap_or(PowerState::Unknown),
        friendly_name: raw
            .attributes
            .friendly_name
            .unwrap_or_else(|| device_id.to_string()),
        last_updated,
        probed_at,
    })
}

/// Read one device's live state through the backend
pub async fn probe(backend: &dyn DeviceBackend, device_id: &str) -> Result<DeviceStatus, ProbeError> {
    match backend.get_state(device_id).await {
        Ok(raw) => {
            debug!("Status response for '{}': {:?}", device_id, raw);
            normalize(device_id, raw, Utc::now())
        }
        Err(err) => {
            warn!("Status check for '{}' failed: {}", device_id, err);
            Err(ProbeError::from_backend(device_id, &err))
        }
    }
}
