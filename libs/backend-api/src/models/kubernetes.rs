//! Kubernetes apps/v1 and core/v1 models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Condition type reporting rollout progress
pub const CONDITION_PROGRESSING: &str = "Progressing";

/// Reason set on the progressing condition once `progressDeadlineSeconds` passed
pub const REASON_PROGRESS_DEADLINE_EXCEEDED: &str = "ProgressDeadlineExceeded";

/// Pod condition type set once every container passes its readiness probe
pub const CONDITION_POD_READY: &str = "Ready";

/// Object metadata shared by every resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    pub namespace: Option<String>,
    pub uid: Option<String>,
    pub generate_name: Option<String>,
    pub resource_version: Option<String>,
    pub self_link: Option<String>,
    pub generation: Option<i64>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// apps/v1 Deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DeploymentSpec,
    pub status: Option<DeploymentStatus>,
}

/// Desired state of a deployment (only the fields anysched reads)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub replicas: Option<i32>,
    pub strategy: Option<serde_json::Value>,
}

/// Observed state of a deployment
///
/// The API server omits zero-valued counters, so an absent count means 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub observed_generation: Option<i64>,
    pub replicas: Option<i32>,
    pub updated_replicas: Option<i32>,
    pub available_replicas: Option<i32>,
    pub unavailable_replicas: Option<i32>,
    #[serde(default)]
    pub conditions: Vec<DeploymentCondition>,
}

/// One entry of `status.conditions` on a deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub status: String,
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// core/v1 Pod
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub status: Option<PodStatus>,
}

/// Observed state of a pod
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    pub phase: Option<String>,
    #[serde(rename = "hostIP")]
    pub host_ip: Option<String>,
    #[serde(rename = "podIP")]
    pub pod_ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Vec<PodCondition>,
}

/// One entry of `status.conditions` on a pod
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_time")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Response of a list call, items left undecoded so each can be decoded on its own
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectList {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl DeploymentStatus {
    /// Find the condition with the given type
    pub fn condition(&self, condition_type: &str) -> Option<&DeploymentCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

impl PodStatus {
    /// Find the condition with the given type
    pub fn condition(&self, condition_type: &str) -> Option<&PodCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// RFC 3339 timestamp; null, empty and malformed values decode as `None`
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}
