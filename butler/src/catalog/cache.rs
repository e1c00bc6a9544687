//! Catalog snapshot cache

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::catalog::loader::CatalogLoader;
use crate::catalog::InMemoryCatalog;
use crate::errors::ButlerError;

/// Cached catalog snapshot
#[derive(Debug, Clone)]
pub struct CatalogCacheEntry {
    pub catalog: Arc<InMemoryCatalog>,
    pub loaded_at: DateTime<Utc>,
}

/// Holds the current catalog snapshot and reloads it on request
pub struct CatalogCache {
    loader: Arc<dyn CatalogLoader>,
    entry: RwLock<Option<CatalogCacheEntry>>,
    reload_per_call: bool,
}

impl CatalogCache {
    /// Create an empty cache; nothing is loaded until first use
    pub fn new(loader: Arc<dyn CatalogLoader>, reload_per_call: bool) -> Self {
        Self {
            loader,
            entry: RwLock::new(None),
            reload_per_call,
        }
    }

    /// Reload the catalog from its source, replacing the cached snapshot
    pub async fn refresh(&self) -> Result<Arc<InMemoryCatalog>, ButlerError> {
        let catalog = Arc::new(self.loader.load().await?);
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some(CatalogCacheEntry {
            catalog: catalog.clone(),
            loaded_at: Utc::now(),
        });
        debug!("Catalog refreshed with {} entries", catalog.len());
        Ok(catalog)
    }

    /// Catalog to use for the next command
    pub async fn snapshot(&self) -> Result<Arc<InMemoryCatalog>, ButlerError> {
        if !self.reload_per_call {
            if let Some(entry) = self.cached() {
                return Ok(entry.catalog);
            }
        }
        self.refresh().await
    }

    /// Currently cached snapshot, if any
    pub fn cached(&self) -> Option<CatalogCacheEntry> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry.clone()
    }

    /// Drop the cached snapshot
    pub fn clear(&self) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = None;
    }
}
