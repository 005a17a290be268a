//! Kubernetes manager implementation

use std::sync::Arc;

use async_trait::async_trait;
use backend_api::kubernetes::{Deployment, ObjectList, Pod};
use serde_json::{json, Value};
use tracing::info;

use super::rollout::{deployment_properties, RemovalTracker, RolloutTracker};
use crate::errors::SchedError;
use crate::http::HttpClient;
use crate::manager::{BackendKind, Manager};
use crate::mapper::kubernetes::{decode_items, svc_from_deployment, tasks_from_pods};
use crate::models::{ServiceSpec, Svc, Task};
use crate::operation::{Operation, Properties, Tracker, WaitOptions};

/// Address used when none is configured: a local `kubectl proxy`
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8001";

const DEFAULT_NAMESPACE: &str = "default";

/// Label tying pods to the deployment that owns them
const APP_LABEL: &str = "appID";

/// Manager for a Kubernetes cluster reached through its REST API
pub struct KubernetesManager {
    client: Arc<HttpClient>,
    namespace: String,
    wait: WaitOptions,
}

impl KubernetesManager {
    /// Connect to `address`; empty or `"kubeconfig"` means [`DEFAULT_ADDRESS`]
    pub fn new(address: &str) -> Result<Self, SchedError> {
        let address = match address {
            "" | "kubeconfig" => DEFAULT_ADDRESS,
            other => other,
        };
        Ok(Self {
            client: Arc::new(HttpClient::new(address)?),
            namespace: DEFAULT_NAMESPACE.to_string(),
            wait: WaitOptions::default(),
        })
    }

    /// Registry constructor
    pub fn boxed(address: &str) -> Result<Box<dyn Manager>, SchedError> {
        Ok(Box::new(Self::new(address)?))
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn deployments_path(&self) -> String {
        format!("/apis/apps/v1/namespaces/{}/deployments", self.namespace)
    }

    fn deployment_path(&self, name: &str) -> String {
        format!("{}/{}", self.deployments_path(), name)
    }

    fn pods_path(&self) -> String {
        format!("/api/v1/namespaces/{}/pods", self.namespace)
    }

    fn operation(&self, tracker: Tracker, properties: Properties, spec: Option<&ServiceSpec>) -> Operation {
        Operation::new(
            BackendKind::Kubernetes,
            tracker,
            properties,
            &self.wait,
            spec.and_then(|s| s.deploy_timeout),
        )
    }
}

/// Deployment manifest for `spec`: one container, pods labelled with the service ID
fn deployment_manifest(spec: &ServiceSpec) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": spec.id,
            "labels": { APP_LABEL: spec.id }
        },
        "spec": {
            "replicas": spec.count,
            "selector": {
                "matchLabels": { APP_LABEL: spec.id }
            },
            "template": {
                "metadata": {
                    "labels": { APP_LABEL: spec.id }
                },
                "spec": {
                    "containers": [{
                        "name": spec.id,
                        "image": spec.image
                    }]
                }
            }
        }
    })
}

#[async_trait]
impl Manager for KubernetesManager {
    fn backend(&self) -> BackendKind {
        BackendKind::Kubernetes
    }

    async fn deploy_service(&self, spec: &ServiceSpec) -> Result<Operation, SchedError> {
        info!(
            "Creating deployment {} ({} x {}) in namespace {}",
            spec.id, spec.count, spec.image, self.namespace
        );
        let created: Deployment = self
            .client
            .post(&self.deployments_path(), &deployment_manifest(spec))
            .await
            .map_err(SchedError::backend("kubernetes.deploy_service: create deployment"))?;

        let name = if created.metadata.name.is_empty() {
            spec.id.clone()
        } else {
            created.metadata.name.clone()
        };
        let tracker = RolloutTracker::new(self.client.clone(), self.deployment_path(&name));
        Ok(self.operation(
            Tracker::KubernetesRollout(tracker),
            deployment_properties(&created),
            Some(spec),
        ))
    }

    async fn destroy_service(&self, id: &str) -> Result<Operation, SchedError> {
        info!("Deleting deployment {} in namespace {}", id, self.namespace);
        let options = json!({
            "kind": "DeleteOptions",
            "apiVersion": "v1",
            "propagationPolicy": "Foreground"
        });
        let path = self.deployment_path(id);
        self.client
            .delete_with_body(&path, &options)
            .await
            .map_err(SchedError::backend("kubernetes.destroy_service: delete deployment"))?;

        let mut properties = Properties::new();
        properties.insert("name".to_string(), json!(id));
        properties.insert("namespace".to_string(), json!(self.namespace));

        let tracker = RemovalTracker::new(self.client.clone(), path, id.to_string());
        Ok(self.operation(Tracker::KubernetesRemoval(tracker), properties, None))
    }

    async fn list_services(&self) -> Result<Vec<Svc>, SchedError> {
        let list: ObjectList = self
            .client
            .get(&self.deployments_path())
            .await
            .map_err(SchedError::backend("kubernetes.list_services: list deployments"))?;
        let deployments: Vec<Deployment> = decode_items("deployment", list.items);
        Ok(deployments.iter().map(svc_from_deployment).collect())
    }

    async fn list_service_tasks(&self, spec: &ServiceSpec) -> Result<Vec<Task>, SchedError> {
        let selector = format!("{}={}", APP_LABEL, spec.id);
        let list: ObjectList = self
            .client
            .get_with_query(&self.pods_path(), &[("labelSelector", selector.as_str())])
            .await
            .map_err(SchedError::backend("kubernetes.list_service_tasks: list pods"))?;
        let pods: Vec<Pod> = decode_items("pod", list.items);
        Ok(tasks_from_pods(&pods))
    }

    async fn list_all_tasks(&self) -> Result<Vec<Task>, SchedError> {
        let list: ObjectList = self
            .client
            .get(&self.pods_path())
            .await
            .map_err(SchedError::backend("kubernetes.list_all_tasks: list pods"))?;
        let pods: Vec<Pod> = decode_items("pod", list.items);
        Ok(tasks_from_pods(&pods))
    }
}
