//! Unified manager interface

use std::fmt;

use async_trait::async_trait;

use crate::errors::SchedError;
use crate::models::{ServiceSpec, Svc, Task};
use crate::operation::Operation;

/// Scheduler families anysched knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Kubernetes,
    Marathon,
    DockerSwarm,
    Nomad,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Kubernetes,
        BackendKind::Marathon,
        BackendKind::DockerSwarm,
        BackendKind::Nomad,
    ];

    /// Name used in configuration and in the registry
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Kubernetes => "kubernetes",
            BackendKind::Marathon => "marathon",
            BackendKind::DockerSwarm => "dockerswarm",
            BackendKind::Nomad => "nomad",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduler connection
///
/// Implementations hold no mutable state besides the wrapped client, so
/// read-style calls may be issued concurrently.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Backend family behind this manager
    fn backend(&self) -> BackendKind;

    /// Submit `spec` and return a handle on the resulting rollout
    async fn deploy_service(&self, spec: &ServiceSpec) -> Result<Operation, SchedError>;

    /// Remove service `id` and return a handle on the teardown
    async fn destroy_service(&self, id: &str) -> Result<Operation, SchedError>;

    /// Services currently known to the backend
    async fn list_services(&self) -> Result<Vec<Svc>, SchedError>;

    /// Running tasks of the service described by `spec`
    async fn list_service_tasks(&self, spec: &ServiceSpec) -> Result<Vec<Task>, SchedError>;

    /// Running tasks across all services
    async fn list_all_tasks(&self) -> Result<Vec<Task>, SchedError>;
}
