//! Activate-or-abstain decision

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::DeviceBackend;
use crate::catalog::resolver::{self, MatchKind};
use crate::catalog::{DeviceCatalog, DeviceRecord};
use crate::engine::evaluator::{DependencyEvaluator, DependencyFault, Evaluation, ProbeMode};
use crate::engine::fsm::{ActivationEvent, ActivationFsm, ActivationState};
use crate::errors::{BackendError, ManageError};

/// Result of the activation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationOutcome {
    pub can_activate: bool,
    pub attempted: bool,
    pub succeeded: Option<bool>,
    pub message: String,
    pub state: ActivationState,
    /// Fault classes that kept the target from activating, first seen first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<DependencyFault>,
}

impl ActivationOutcome {
    /// Ineligible outcome.
    ///
    /// The message keeps the fixed wording chat consumers match on; the
    /// blocking classes travel in `blocked_by` instead of the text.
    fn skipped(target: &str, evaluation: &Evaluation) -> Self {
        let mut blocked_by = Vec::new();
        for fault in evaluation.verdicts.iter().filter_map(|v| v.fault) {
            if !blocked_by.contains(&fault) {
                blocked_by.push(fault);
            }
        }
        Self {
            can_activate: false,
            attempted: false,
            succeeded: None,
            message: format!("由於部分相關設備狀態異常，未執行 {} 的操作", target),
            state: ActivationState::Ineligible,
            blocked_by,
        }
    }

    fn activated(target: &str) -> Self {
        Self {
            can_activate: true,
            attempted: true,
            succeeded: Some(true),
            message: format!("成功執行操作: {}", target),
            state: ActivationState::Activated,
            blocked_by: Vec::new(),
        }
    }

    fn failed(target: &str, err: &BackendError) -> Self {
        let message = if err.is_transport() {
            format!("執行操作 {} 時發生異常: {}", target, err)
        } else {
            format!("執行操作 {} 時發生錯誤: {}", target, err)
        };
        Self {
            can_activate: true,
            attempted: true,
            succeeded: Some(false),
            message,
            state: ActivationState::ActivationFailed,
            blocked_by: Vec::new(),
        }
    }
}

/// Everything decided for one command
#[derive(Debug, Clone)]
pub struct Decision {
    pub record: DeviceRecord,
    pub match_kind: MatchKind,
    pub evaluation: Evaluation,
    pub outcome: ActivationOutcome,
}

/// Resolves the target, gates on dependency health and activates at most once
pub struct ActivationDecider<'a> {
    backend: &'a dyn DeviceBackend,
    mode: ProbeMode,
}

impl<'a> ActivationDecider<'a> {
    pub fn new(backend: &'a dyn DeviceBackend, mode: ProbeMode) -> Self {
        Self { backend, mode }
    }

    pub async fn decide<C>(&self, catalog: &C, query: &str) -> Result<Decision, ManageError>
    where
        C: DeviceCatalog + ?Sized,
    {
        let mut fsm = ActivationFsm::new();

        let resolution = match resolver::resolve(catalog, query) {
            Ok(resolution) => {
                fsm.process(ActivationEvent::Resolved)?;
                resolution
            }
            Err(not_found) => {
                fsm.process(ActivationEvent::NotFound)?;
                warn!("No catalog device matches '{}'", not_found.query);
                return Err(not_found.into());
            }
        };
        let record = resolution.record;

        let evaluation = DependencyEvaluator::new(self.backend, self.mode)
            .evaluate(&record.dependency_ids)
            .await;
        fsm.process(ActivationEvent::Evaluated {
            all_healthy: evaluation.all_healthy,
        })?;

        let outcome = if fsm.state() == ActivationState::Eligible {
            fsm.process(ActivationEvent::Activate)?;
            match self.backend.activate(&record.device_id, &record.control_path).await {
                Ok(()) => {
                    fsm.process(ActivationEvent::Succeeded)?;
                    info!("Activated '{}' ({})", record.name, record.device_id);
                    ActivationOutcome::activated(&record.name)
                }
                Err(err) => {
                    fsm.process(ActivationEvent::Failed(err.to_string()))?;
                    warn!("Activation of '{}' failed: {}", record.name, err);
                    ActivationOutcome::failed(&record.name, &err)
                }
            }
        } else {
            info!("Skipping activation of '{}': dependencies unhealthy", record.name);
            ActivationOutcome::skipped(&record.name, &evaluation)
        };

        Ok(Decision {
            record,
            match_kind: resolution.kind,
            evaluation,
            outcome,
        })
    }
}
