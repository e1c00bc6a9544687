//! Finite State Machine for one activation request

use serde::{Deserialize, Serialize};

use crate::errors::ButlerError;

/// Activation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// Looking up the target device
    Resolving,

    /// Checking dependencies
    Evaluating,

    /// All dependencies healthy
    Eligible,

    /// At least one dependency unhealthy
    Ineligible,

    /// Activation call in flight
    Activating,

    /// Activation call succeeded
    Activated,

    /// Activation call failed
    ActivationFailed,

    /// Target device not found
    Aborted,
}

impl ActivationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActivationState::Ineligible
                | ActivationState::Activated
                | ActivationState::ActivationFailed
                | ActivationState::Aborted
        )
    }
}

/// Activation event
#[derive(Debug, Clone)]
pub enum ActivationEvent {
    /// Target device resolved
    Resolved,

    /// Target device not in the catalog
    NotFound,

    /// Dependency evaluation finished
    Evaluated { all_healthy: bool },

    /// Activation call issued
    Activate,

    /// Activation call succeeded
    Succeeded,

    /// Activation call failed
    Failed(String),
}

/// Activation FSM
#[derive(Debug, Clone)]
pub struct ActivationFsm {
    state: ActivationState,
    error: Option<String>,
}

impl ActivationFsm {
    /// Create a new FSM in resolving state
    pub fn new() -> Self {
        Self {
            state: ActivationState::Resolving,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ActivationEvent) -> Result<ActivationState, ButlerError> {
        let new_state = match (self.state, &event) {
            (ActivationState::Resolving, ActivationEvent::Resolved) => ActivationState::Evaluating,
            (ActivationState::Resolving, ActivationEvent::NotFound) => ActivationState::Aborted,

            (ActivationState::Evaluating, ActivationEvent::Evaluated { all_healthy: true }) => {
                ActivationState::Eligible
            }
            (ActivationState::Evaluating, ActivationEvent::Evaluated { all_healthy: false }) => {
                ActivationState::Ineligible
            }

            (ActivationState::Eligible, ActivationEvent::Activate) => ActivationState::Activating,

            (ActivationState::Activating, ActivationEvent::Succeeded) => ActivationState::Activated,
            (ActivationState::Activating, ActivationEvent::Failed(err)) => {
                self.error = Some(err.clone());
                ActivationState::ActivationFailed
            }

            (state, event) => {
                return Err(ButlerError::TransitionError(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for ActivationFsm {
    fn default() -> Self {
        Self::new()
    }
}
