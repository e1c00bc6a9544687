//! Dependency evaluation
//!
//! Every dependency is probed and reported, even after one has already
//! failed, so the report always shows the full picture.

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::DeviceBackend;
use crate::engine::probe::{probe, DeviceStatus, PowerState};
use crate::errors::ProbeError;

/// Why a dependency blocked activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyFault {
    /// The status check itself failed
    ProbeFailed,
    /// The device reported neither on nor off
    Offline,
    /// The last report is too old
    Stale,
}

/// Health verdict for one dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyVerdict {
    pub device_id: String,
    pub is_online: bool,
    pub is_recent: bool,
    pub is_healthy: bool,
    pub message: String,
    pub fault: Option<DependencyFault>,
}

impl DependencyVerdict {
    pub fn from_status(status: &DeviceStatus) -> Self {
        let is_online = status.is_online();
        let is_recent = status.is_recent();
        let fault = if !is_online {
            Some(DependencyFault::Offline)
        } else if !is_recent {
            Some(DependencyFault::Stale)
        } else {
            None
        };

        let message = format!(
            "設備 '{}' (ID: {}) 狀態: {}, {}, 最後更新: {}",
            status.friendly_name,
            status.device_id,
            if status.raw_state == PowerState::On { "開啟" } else { "關閉" },
            if is_online { "在線" } else { "離線" },
            if is_recent { "最近" } else { "不是最近" },
        );

        Self {
            device_id: status.device_id.clone(),
            is_online,
            is_recent,
            is_healthy: is_online && is_recent,
            message,
            fault,
        }
    }

    pub fn from_probe_error(err: &ProbeError) -> Self {
        Self {
            device_id: err.device_id.clone(),
            is_online: false,
            is_recent: false,
            is_healthy: false,
            message: format!("錯誤: 無法獲取設備 '{}' 的狀態: {}", err.device_id, err.message),
            fault: Some(DependencyFault::ProbeFailed),
        }
    }
}

/// Verdicts in dependency order plus the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub verdicts: Vec<DependencyVerdict>,
    pub all_healthy: bool,
}

impl Evaluation {
    pub fn new(verdicts: Vec<DependencyVerdict>) -> Self {
        let all_healthy = verdicts.iter().all(|v| v.is_healthy);
        Self {
            verdicts,
            all_healthy,
        }
    }
}

/// How dependencies are probed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeMode {
    #[default]
    Sequential,
    Concurrent,
}

/// Probes dependencies and aggregates their health
pub struct DependencyEvaluator<'a> {
    backend: &'a dyn DeviceBackend,
    mode: ProbeMode,
}

impl<'a> DependencyEvaluator<'a> {
    pub fn new(backend: &'a dyn DeviceBackend, mode: ProbeMode) -> Self {
        Self { backend, mode }
    }

    /// Evaluate the given dependencies; an empty list is always healthy
    pub async fn evaluate(&self, dependency_ids: &[String]) -> Evaluation {
        let verdicts = match self.mode {
            ProbeMode::Sequential => {
                let mut verdicts = Vec::with_capacity(dependency_ids.len());
                for device_id in dependency_ids {
                    verdicts.push(self.check(device_id).await);
                }
                verdicts
            }
            // join_all yields results in input order
            ProbeMode::Concurrent => join_all(dependency_ids.iter().map(|id| self.check(id))).await,
        };
        Evaluation::new(verdicts)
    }

    async fn check(&self, device_id: &str) -> DependencyVerdict {
        let verdict = match probe(self.backend, device_id).await {
            Ok(status) => DependencyVerdict::from_status(&status),
            Err(err) => DependencyVerdict::from_probe_error(&err),
        };
        if verdict.is_healthy {
            info!("{}", verdict.message);
        } else {
            warn!("{}", verdict.message);
        }
        verdict
    }
}
