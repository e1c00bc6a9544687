//! Device command entry point

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::backend::DeviceBackend;
use crate::catalog::cache::CatalogCache;
use crate::engine::decider::ActivationDecider;
use crate::engine::evaluator::ProbeMode;
use crate::errors::ManageError;
use crate::report::{self, Report};
use crate::utils::invocation_id;

/// Handles device commands against a catalog and a backend
pub struct DeviceManager {
    catalog: Arc<CatalogCache>,
    backend: Arc<dyn DeviceBackend>,
    mode: ProbeMode,
}

impl DeviceManager {
    pub fn new(catalog: Arc<CatalogCache>, backend: Arc<dyn DeviceBackend>, mode: ProbeMode) -> Self {
        Self {
            catalog,
            backend,
            mode,
        }
    }

    /// Resolve, check dependencies, activate if eligible and report
    pub async fn manage_device(&self, command: &str) -> Result<Report, ManageError> {
        let span = info_span!("manage_device", invocation = %invocation_id());
        self.manage_device_impl(command).instrument(span).await
    }

    async fn manage_device_impl(&self, command: &str) -> Result<Report, ManageError> {
        info!("Received command: {}", command);
        let catalog = self.catalog.snapshot().await?;

        let decision = ActivationDecider::new(self.backend.as_ref(), self.mode)
            .decide(catalog.as_ref(), command)
            .await?;

        let report = report::build(&decision.record.name, &decision.evaluation.verdicts, &decision.outcome);
        info!(
            "{}",
            report::summary_message(&report.target_device_name, report.can_activate)
        );
        Ok(report)
    }
}
