//! Handles on in-flight backend work
//!
//! Every mutating [`Manager`](crate::manager::Manager) call returns an
//! [`Operation`]. The operation carries just enough backend context to ask
//! the backend "are you there yet?" again, and normalises the answer into an
//! [`OperationStatus`].

pub mod fsm;
pub mod wait;

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::backends::{kubernetes, marathon};
use crate::errors::SchedError;
use crate::manager::BackendKind;
use crate::models::OperationStatus;

pub use fsm::{OperationEvent, OperationFsm, OperationState};
pub use wait::WaitOptions;

/// Backend metadata captured when the operation was created
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Backend-specific context needed to re-query progress
pub(crate) enum Tracker {
    KubernetesRollout(kubernetes::RolloutTracker),
    KubernetesRemoval(kubernetes::RemovalTracker),
    MarathonApp(marathon::AppTracker),
    MarathonDeployments(marathon::DeploymentsTracker),

    /// The backend accepted the request but offers no progress API
    Untracked,
}

impl Tracker {
    async fn poll(&self, backend: BackendKind) -> Result<OperationStatus, SchedError> {
        match self {
            Tracker::KubernetesRollout(t) => t.poll().await,
            Tracker::KubernetesRemoval(t) => t.poll().await,
            Tracker::MarathonApp(t) => t.poll().await,
            Tracker::MarathonDeployments(t) => t.poll().await,
            Tracker::Untracked => Err(SchedError::NotImplemented {
                backend: backend.as_str(),
                call: "operation.status",
            }),
        }
    }
}

/// An in-flight deploy or destroy
pub struct Operation {
    backend: BackendKind,
    tracker: Tracker,
    properties: Properties,
    timeout: Duration,
    poll_interval: Duration,
    fsm: Mutex<OperationFsm>,
}

impl Operation {
    pub(crate) fn new(
        backend: BackendKind,
        tracker: Tracker,
        properties: Properties,
        options: &WaitOptions,
        deploy_timeout: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            tracker,
            properties,
            timeout: deploy_timeout.unwrap_or(options.default_timeout),
            poll_interval: options.poll_interval,
            fsm: Mutex::new(OperationFsm::new()),
        }
    }

    /// Override the effective wait timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the delay between polls inside [`Operation::wait`]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Backend that accepted the operation
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Effective wait timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether the backend can report progress for this operation at all
    pub fn is_tracked(&self) -> bool {
        !matches!(self.tracker, Tracker::Untracked)
    }

    /// Labels, annotations and identifiers known at creation time
    ///
    /// Never contacts the backend.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// State observed by the polls issued so far
    pub fn state(&self) -> OperationState {
        self.fsm
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .state()
            .clone()
    }

    /// Ask the backend once for the current progress
    pub async fn status(&self) -> Result<OperationStatus, SchedError> {
        let result = self.tracker.poll(self.backend).await;
        self.record(&result);
        result
    }

    fn record(&self, result: &Result<OperationStatus, SchedError>) {
        let event = match result {
            Ok(status) if status.done => OperationEvent::Completed,
            Ok(status) => OperationEvent::Pending(status.message.clone()),
            Err(e) if e.is_terminal() => OperationEvent::Failed(e.to_string()),
            // Transport errors say nothing about the operation itself
            Err(_) => return,
        };

        let mut fsm = self.fsm.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = fsm.process(event) {
            debug!("Ignoring poll outcome: {}", e);
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("backend", &self.backend)
            .field("tracked", &self.is_tracked())
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("state", &self.state())
            .finish()
    }
}
