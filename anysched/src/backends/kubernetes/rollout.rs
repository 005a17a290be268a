//! Kubernetes rollout and removal tracking

use std::sync::Arc;

use backend_api::kubernetes::{
    Deployment, DeploymentStatus, CONDITION_PROGRESSING, REASON_PROGRESS_DEADLINE_EXCEEDED,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::errors::SchedError;
use crate::http::HttpClient;
use crate::models::OperationStatus;
use crate::operation::Properties;

/// Re-reads a deployment and derives rollout progress from it
pub(crate) struct RolloutTracker {
    client: Arc<HttpClient>,
    path: String,
}

impl RolloutTracker {
    pub(crate) fn new(client: Arc<HttpClient>, path: String) -> Self {
        Self { client, path }
    }

    pub(crate) async fn poll(&self) -> Result<OperationStatus, SchedError> {
        let deployment: Deployment = self
            .client
            .get(&self.path)
            .await
            .map_err(SchedError::backend("kubernetes.operation.status: get deployment"))?;
        rollout_status(&deployment)
    }
}

/// Re-reads a deleted deployment until the API server stops returning it
pub(crate) struct RemovalTracker {
    client: Arc<HttpClient>,
    path: String,
    name: String,
}

impl RemovalTracker {
    pub(crate) fn new(client: Arc<HttpClient>, path: String, name: String) -> Self {
        Self { client, path, name }
    }

    pub(crate) async fn poll(&self) -> Result<OperationStatus, SchedError> {
        match self.client.get::<Deployment>(&self.path).await {
            Ok(deployment) => {
                let replicas = deployment
                    .status
                    .as_ref()
                    .and_then(|s| s.replicas)
                    .unwrap_or(0);
                Ok(OperationStatus::at_client_time(
                    format!(
                        "Waiting for deployment {:?} to be deleted: {} replicas remaining...",
                        self.name, replicas
                    ),
                    false,
                ))
            }
            Err(e) if e.is_not_found() => Ok(OperationStatus::at_client_time(
                format!("Deployment {:?} deleted.", self.name),
                true,
            )),
            Err(e) => Err(SchedError::backend("kubernetes.operation.status: get deployment")(e)),
        }
    }
}

/// Derive rollout progress from a deployment snapshot
///
/// A deployment whose progressing condition reports the progress deadline as
/// exceeded is a terminal failure and comes back as an error.
pub fn rollout_status(deployment: &Deployment) -> Result<OperationStatus, SchedError> {
    let empty = DeploymentStatus::default();
    let status = deployment.status.as_ref().unwrap_or(&empty);
    let name = &deployment.metadata.name;

    let generation = deployment.metadata.generation.unwrap_or(0);
    if generation > status.observed_generation.unwrap_or(0) {
        return Ok(not_done(
            name,
            status,
            "Waiting for deployment spec update to be observed...".to_string(),
        ));
    }

    if exceeded_progress_deadline(status) {
        return Err(SchedError::ProgressDeadlineExceeded { name: name.clone() });
    }

    let replicas = status.replicas.unwrap_or(0);
    let updated = status.updated_replicas.unwrap_or(0);
    let available = status.available_replicas.unwrap_or(0);

    if let Some(desired) = deployment.spec.replicas {
        if updated < desired {
            return Ok(not_done(
                name,
                status,
                format!("{} out of {} new replicas have been updated...", updated, desired),
            ));
        }
    }

    if replicas > updated {
        return Ok(not_done(
            name,
            status,
            format!("{} old replicas are pending termination...", replicas - updated),
        ));
    }

    if available < updated {
        return Ok(not_done(
            name,
            status,
            format!("{} of {} updated replicas are available...", available, updated),
        ));
    }

    Ok(snapshot(
        status,
        format!(
            "Deployment {:?} successfully rolled out. {} of {} updated replicas are available.",
            name, available, updated
        ),
        true,
    ))
}

fn exceeded_progress_deadline(status: &DeploymentStatus) -> bool {
    status
        .condition(CONDITION_PROGRESSING)
        .and_then(|c| c.reason.as_deref())
        == Some(REASON_PROGRESS_DEADLINE_EXCEEDED)
}

fn not_done(name: &str, status: &DeploymentStatus, msg: String) -> OperationStatus {
    snapshot(
        status,
        format!("Waiting for deployment {:?} to finish: {}", name, msg),
        false,
    )
}

fn snapshot(status: &DeploymentStatus, message: String, done: bool) -> OperationStatus {
    let (last_transition_time, last_update_time) = most_recent_condition_times(status);
    OperationStatus {
        client_time: Utc::now(),
        last_transition_time,
        last_update_time,
        message,
        done,
    }
}

/// Latest transition and update times across all conditions
fn most_recent_condition_times(
    status: &DeploymentStatus,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let transition = status
        .conditions
        .iter()
        .filter_map(|c| c.last_transition_time)
        .max();
    let update = status
        .conditions
        .iter()
        .filter_map(|c| c.last_update_time)
        .max();
    (transition, update)
}

/// Labels, annotations and identifiers of a freshly created deployment
pub fn deployment_properties(deployment: &Deployment) -> Properties {
    let meta = &deployment.metadata;
    let mut props = Properties::new();

    for (key, val) in &meta.labels {
        props.insert(format!("labels.{key}"), json!(val));
    }
    for (key, val) in &meta.annotations {
        props.insert(format!("annotations.{key}"), json!(val));
    }

    props.insert("name".to_string(), json!(meta.name));
    let optional = [
        ("uid", meta.uid.as_ref().map(|v| json!(v))),
        ("namespace", meta.namespace.as_ref().map(|v| json!(v))),
        ("generation", meta.generation.map(|v| json!(v))),
        ("generateName", meta.generate_name.as_ref().map(|v| json!(v))),
        ("resourceVersion", meta.resource_version.as_ref().map(|v| json!(v))),
        ("selfLink", meta.self_link.as_ref().map(|v| json!(v))),
        (
            "creationTimestamp",
            meta.creation_timestamp
                .map(|t| json!(t.to_rfc3339_opts(SecondsFormat::Secs, true))),
        ),
        ("spec.strategy", deployment.spec.strategy.clone()),
    ];
    for (key, val) in optional {
        if let Some(val) = val {
            props.insert(key.to_string(), val);
        }
    }

    props
}
