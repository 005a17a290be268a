//! Kubernetes backend (apps/v1 deployments)

mod manager;
mod rollout;

pub use manager::{KubernetesManager, DEFAULT_ADDRESS};
pub use rollout::{deployment_properties, rollout_status};

pub(crate) use rollout::{RemovalTracker, RolloutTracker};
