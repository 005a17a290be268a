//! Kubernetes deployments and pods

use backend_api::kubernetes::{Deployment, DeploymentStatus, Pod, CONDITION_POD_READY};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::mapper::sort_tasks_by_ready_time;
use crate::models::{Svc, Task};

/// Map a deployment onto a service record
///
/// Counters absent from a reported status are zero (the API server omits
/// them); without any status the counts are unknown.
pub fn svc_from_deployment(deployment: &Deployment) -> Svc {
    let status = deployment.status.as_ref();
    let count = |field: fn(&DeploymentStatus) -> Option<i32>| {
        status.map(|s| u32::try_from(field(s).unwrap_or(0)).unwrap_or(0))
    };

    Svc {
        id: deployment.metadata.name.clone(),
        tasks_running: count(|s| s.replicas),
        tasks_healthy: count(|s| s.available_replicas),
        tasks_unhealthy: count(|s| s.unavailable_replicas),
        creation_time: deployment.metadata.creation_timestamp,
    }
}

/// Decode list items one by one, dropping those that do not decode
pub fn decode_items<T: DeserializeOwned>(kind: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| {
            let name = item["metadata"]["name"].as_str().unwrap_or("<unnamed>").to_string();
            match serde_json::from_value(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!("Ignoring malformed {} {:?}: {}", kind, name, e);
                    None
                }
            }
        })
        .collect()
}

/// Map a pod onto a task
///
/// Pods without a ready condition, or whose ready condition lacks a status,
/// yield `None`.
pub fn task_from_pod(pod: &Pod) -> Option<Task> {
    let status = pod.status.as_ref()?;
    let ready = status
        .condition(CONDITION_POD_READY)
        .filter(|c| !c.status.is_empty())?;

    Some(Task {
        name: pod.metadata.name.clone(),
        app_id: pod.metadata.labels.get("appID").cloned(),
        host_ip: status.host_ip.clone(),
        task_ip: status.pod_ip.clone(),
        ip_addresses: status.pod_ip.iter().cloned().collect(),
        start_time: status.start_time,
        ready_time: ready.last_transition_time,
        state: status.phase.clone(),
        ..Task::new(pod.metadata.name.clone())
    })
}

/// Map a pod list, dropping pods that are not mappable and sorting by ready time
pub fn tasks_from_pods(pods: &[Pod]) -> Vec<Task> {
    let mut tasks: Vec<Task> = pods.iter().filter_map(task_from_pod).collect();
    if tasks.len() < pods.len() {
        debug!(
            "Skipped {} pod(s) without a usable ready condition",
            pods.len() - tasks.len()
        );
    }
    sort_tasks_by_ready_time(&mut tasks);
    tasks
}
