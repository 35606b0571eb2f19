use crate::domain::models::ScanState;
use thiserror::Error;

/// Failures surfaced by the scan controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The radio failed to start or to produce a sample.
    #[error("radio hardware fault: {0}")]
    HardwareFault(String),

    /// An operation was attempted in a state that does not allow it.
    #[error("{operation} is not valid while {state:?}")]
    InvalidTransition {
        operation: &'static str,
        state: ScanState,
    },
}

impl ScanError {
    pub fn hardware(message: impl Into<String>) -> Self {
        Self::HardwareFault(message.into())
    }
}
