//! Upload session lifecycle.

use serde::{Deserialize, Serialize};

/// Upload session state.
///
/// `Idle -> InProgress -> {Completed, Failed}`. The two end states are
/// terminal and accept no further transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session created, nothing submitted yet.
    #[default]
    Idle,
    /// Chunks are being transferred.
    InProgress,
    /// Terminal success event received.
    Completed,
    /// The transfer failed.
    Failed,
}

impl SessionState {
    /// Check if the session is accepting chunk events.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Check if the session reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: SessionState) -> crate::Result<()> {
        let allowed = matches!(
            (*self, next),
            (Self::Idle, Self::InProgress)
                | (Self::Idle, Self::Failed)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Failed)
        );
        if !allowed {
            return Err(crate::Error::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}
