//! Device catalog: human-readable names mapped to device records

pub mod cache;
pub mod loader;
pub mod resolver;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::DeviceNotFound;

/// A controllable device and the devices it depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Catalog key, unique
    pub name: String,

    /// Backend device ID
    pub device_id: String,

    /// Backend path used to activate the device
    pub control_path: String,

    /// Dependency device IDs, in evaluation order
    #[serde(default)]
    pub dependency_ids: Vec<String>,
}

impl DeviceRecord {
    pub fn new(
        name: impl Into<String>,
        device_id: impl Into<String>,
        control_path: impl Into<String>,
        dependency_ids: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            device_id: device_id.into(),
            control_path: control_path.into(),
            dependency_ids,
        }
    }
}

/// Read-only name directory searched by the resolver
pub trait DeviceCatalog: Send + Sync {
    /// Look up a record by its exact catalog key
    fn get(&self, name: &str) -> Option<&DeviceRecord>;

    /// All catalog keys in catalog order
    fn names(&self) -> Vec<&str>;

    /// Resolve free-form command text to a record
    fn resolve(&self, query: &str) -> Result<DeviceRecord, DeviceNotFound> {
        resolver::resolve(self, query).map(|resolution| resolution.record)
    }
}

/// Catalog held in memory, preserving load order
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<DeviceRecord>,
    index: HashMap<String, usize>,
}

impl InMemoryCatalog {
    /// Build a catalog; on duplicate names the first record wins
    pub fn new(records: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            if catalog.index.contains_key(&record.name) {
                warn!("Duplicate catalog entry '{}' ignored", record.name);
                continue;
            }
            catalog.index.insert(record.name.clone(), catalog.records.len());
            catalog.records.push(record);
        }
        catalog
    }

    /// The three-device catalog used by demo mode
    pub fn demo() -> Self {
        Self::new([
            DeviceRecord::new(
                "開啟會議室冷氣",
                "mock-device-123",
                "control/ac",
                vec!["mock-device-456".to_string(), "mock-device-789".to_string()],
            ),
            DeviceRecord::new("mock-device-456", "mock-device-456", "control/fan", vec![]),
            DeviceRecord::new("mock-device-789", "mock-device-789", "control/lights", vec![]),
        ])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }
}

impl DeviceCatalog for InMemoryCatalog {
    fn get(&self, name: &str) -> Option<&DeviceRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }
}
