//! Scripted in-memory backend for demo mode and tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::backend::{DeviceAttributes, DeviceBackend, RawDeviceState};
use crate::errors::BackendError;

/// When a scripted device last reported
#[derive(Debug, Clone)]
pub enum Updated {
    /// Relative to the moment the status is read
    Ago(Duration),
    /// Literal timestamp text
    At(String),
    /// No timestamp field at all
    Never,
}

/// Scripted status reply
#[derive(Debug, Clone)]
pub struct MockStatus {
    pub state: Option<String>,
    pub friendly_name: Option<String>,
    pub updated: Updated,
}

impl MockStatus {
    pub fn with_state(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            friendly_name: None,
            updated: Updated::Ago(Duration::zero()),
        }
    }

    pub fn on() -> Self {
        Self::with_state("on")
    }

    pub fn off() -> Self {
        Self::with_state("off")
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    pub fn updated_secs_ago(mut self, secs: i64) -> Self {
        self.updated = Updated::Ago(Duration::seconds(secs));
        self
    }

    pub fn updated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.updated = Updated::At(timestamp.into());
        self
    }

    pub fn never_updated(mut self) -> Self {
        self.updated = Updated::Never;
        self
    }

    fn render(&self) -> RawDeviceState {
        let last_updated = match &self.updated {
            Updated::Ago(age) => Some((Utc::now() - *age).to_rfc3339()),
            Updated::At(text) => Some(text.clone()),
            Updated::Never => None,
        };
        RawDeviceState {
            state: self.state.clone(),
            attributes: DeviceAttributes {
                friendly_name: self.friendly_name.clone(),
            },
            last_updated,
        }
    }
}

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    GetState { device_id: String },
    Activate { device_id: String, control_path: String },
}

/// In-memory device backend
#[derive(Default)]
pub struct MockBackend {
    states: HashMap<String, Result<MockStatus, BackendError>>,
    activations: HashMap<String, BackendError>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend matching the demo catalog: one fan on, one light off
    pub fn demo() -> Self {
        Self::new()
            .with_status("mock-device-456", MockStatus::on().named("設備 mock-device-456"))
            .with_status("mock-device-789", MockStatus::off().named("設備 mock-device-789"))
    }

    pub fn with_status(mut self, device_id: impl Into<String>, status: MockStatus) -> Self {
        self.states.insert(device_id.into(), Ok(status));
        self
    }

    pub fn with_status_error(mut self, device_id: impl Into<String>, err: BackendError) -> Self {
        self.states.insert(device_id.into(), Err(err));
        self
    }

    /// Make activation of `device_id` fail
    pub fn with_activation_error(mut self, device_id: impl Into<String>, err: BackendError) -> Self {
        self.activations.insert(device_id.into(), err);
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of activation calls received
    pub fn activation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::Activate { .. }))
            .count()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[async_trait]
impl DeviceBackend for MockBackend {
    async fn get_state(&self, device_id: &str) -> Result<RawDeviceState, BackendError> {
        self.record(MockCall::GetState {
            device_id: device_id.to_string(),
        });
        match self.states.get(device_id) {
            Some(Ok(status)) => Ok(status.render()),
            Some(Err(err)) => Err(err.clone()),
            None => Err(BackendError::status(404, format!("Entity not found: {}", device_id))),
        }
    }

    async fn activate(&self, device_id: &str, control_path: &str) -> Result<(), BackendError> {
        self.record(MockCall::Activate {
            device_id: device_id.to_string(),
            control_path: control_path.to_string(),
        });
        match self.activations.get(device_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
