//! Engine error types.
//!
//! Every operation inside the engine is local and deterministic, so none of
//! these are retried. Configuration errors are fatal to a test run; state
//! errors are rejected locally and leave the engine untouched.

use thiserror::Error;

use crate::flow::FlowStatus;

/// Errors produced by the cipher, the answer flow and the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestError {
    /// The payload or configuration cannot drive a test.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An event arrived that the current state has no transition for.
    #[error("invalid state: {action} rejected while {status} (active cell {active_cell})")]
    InvalidState {
        action: &'static str,
        status: FlowStatus,
        active_cell: u32,
    },

    /// Timer expiry delivered after the flow had already completed.
    #[error("timer expired after the test had already completed")]
    TimerRace,
}

impl TestError {
    /// Returns `true` if the error means the test cannot be run at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TestError::InvalidConfiguration(_))
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        TestError::InvalidConfiguration(message.into())
    }
}
