//! Finite State Machine for in-flight backend operations

use serde::{Deserialize, Serialize};

/// Observed operation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    /// Backend accepted the mutating request, nothing polled yet
    Created,

    /// At least one poll reported the operation as not done
    InProgress,

    /// A poll reported the operation as done
    Succeeded,

    /// The backend reported a definitive failure
    Failed,
}

/// Outcome of one status poll
#[derive(Debug, Clone)]
pub enum OperationEvent {
    /// Poll returned a status that is not done yet
    Pending(String),

    /// Poll returned a done status
    Completed,

    /// Poll surfaced a terminal backend failure
    Failed(String),
}

/// Operation FSM
#[derive(Debug, Clone)]
pub struct OperationFsm {
    state: OperationState,
    message: Option<String>,
    error: Option<String>,
    polls: u32,
}

impl OperationFsm {
    /// Create a new FSM in created state
    pub fn new() -> Self {
        Self {
            state: OperationState::Created,
            message: None,
            error: None,
            polls: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> &OperationState {
        &self.state
    }

    /// Last progress message seen while in progress
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of poll outcomes recorded
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Succeeded and Failed are final
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            OperationState::Succeeded | OperationState::Failed
        )
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: OperationEvent) -> Result<(), String> {
        let new_state = match (&self.state, event) {
            (OperationState::Created | OperationState::InProgress, OperationEvent::Pending(msg)) => {
                self.message = Some(msg);
                OperationState::InProgress
            }
            (OperationState::Created | OperationState::InProgress, OperationEvent::Completed) => {
                OperationState::Succeeded
            }
            (OperationState::Created | OperationState::InProgress, OperationEvent::Failed(err)) => {
                self.error = Some(err);
                OperationState::Failed
            }

            // Terminal states do not move
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.polls += 1;
        self.state = new_state;
        Ok(())
    }
}

impl Default for OperationFsm {
    fn default() -> Self {
        Self::new()
    }
}
