//! Operation status snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of an in-flight operation, produced fresh by every poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    /// Local wall clock when the poll completed
    pub client_time: DateTime<Utc>,

    /// Latest backend-side transition, if the backend reports one
    pub last_transition_time: Option<DateTime<Utc>>,

    /// Latest backend-side update, if the backend reports one
    pub last_update_time: Option<DateTime<Utc>>,

    /// Human readable progress message
    pub message: String,

    /// Whether the operation has settled
    pub done: bool,
}

impl OperationStatus {
    /// A status whose backend times are the poll time itself
    pub fn at_client_time(message: impl Into<String>, done: bool) -> Self {
        let now = Utc::now();
        Self {
            client_time: now,
            last_transition_time: Some(now),
            last_update_time: Some(now),
            message: message.into(),
            done,
        }
    }
}
