//! Catalog loading from exported sheet rows

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::{DeviceRecord, InMemoryCatalog};
use crate::errors::ButlerError;
use crate::filesys::file::File;

/// One row of the device sheet
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "設備", alias = "name")]
    pub name: String,

    #[serde(rename = "deviceID", alias = "device_id")]
    pub device_id: String,

    #[serde(alias = "control_path")]
    pub path: String,

    /// `;`-separated dependency device IDs
    #[serde(default)]
    pub related_devices: String,
}

impl CatalogRow {
    pub fn into_record(self) -> DeviceRecord {
        let dependency_ids = split_related_devices(&self.related_devices);
        DeviceRecord {
            name: self.name,
            device_id: self.device_id,
            control_path: self.path,
            dependency_ids,
        }
    }
}

/// Split a `;`-separated dependency list, dropping blank segments
pub fn split_related_devices(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse catalog rows from a JSON array
pub fn parse_catalog(contents: &str) -> Result<InMemoryCatalog, ButlerError> {
    let rows: Vec<CatalogRow> = serde_json::from_str(contents)
        .map_err(|e| ButlerError::CatalogError(format!("Invalid catalog: {}", e)))?;
    Ok(InMemoryCatalog::new(rows.into_iter().map(CatalogRow::into_record)))
}

/// Source of catalog snapshots
#[async_trait]
pub trait CatalogLoader: Send + Sync {
    async fn load(&self) -> Result<InMemoryCatalog, ButlerError>;
}

/// Loads the catalog from a JSON file on every call
pub struct FileCatalogLoader {
    file: File,
}

impl FileCatalogLoader {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

#[async_trait]
impl CatalogLoader for FileCatalogLoader {
    async fn load(&self) -> Result<InMemoryCatalog, ButlerError> {
        debug!("Loading catalog from {}", self.file.path().display());
        if !self.file.exists().await {
            return Err(ButlerError::CatalogError(format!(
                "Catalog file not found: {}",
                self.file.path().display()
            )));
        }
        let contents = self.file.read_string().await?;
        let catalog = parse_catalog(&contents)?;
        info!("Loaded {} catalog entries", catalog.len());
        Ok(catalog)
    }
}

/// Hands out copies of a fixed catalog
pub struct StaticCatalogLoader {
    catalog: InMemoryCatalog,
}

impl StaticCatalogLoader {
    pub fn new(catalog: InMemoryCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogLoader for StaticCatalogLoader {
    async fn load(&self) -> Result<InMemoryCatalog, ButlerError> {
        Ok(self.catalog.clone())
    }
}
