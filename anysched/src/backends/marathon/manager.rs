//! Marathon manager implementation

use std::sync::Arc;

use async_trait::async_trait;
use backend_api::marathon::{App, AppList, DeploymentResult, TaskList};
use serde_json::{json, Value};
use tracing::info;

use super::tracker::{app_path, AppTracker, DeploymentsTracker};
use crate::errors::SchedError;
use crate::http::HttpClient;
use crate::manager::{BackendKind, Manager};
use crate::mapper::marathon::{svc_from_marathon_app, task_from_marathon_task};
use crate::mapper::sort_tasks_by_ready_time;
use crate::models::{ServiceSpec, Svc, Task};
use crate::operation::{Operation, Properties, Tracker, WaitOptions};

/// Manager for a Marathon instance
pub struct MarathonManager {
    client: Arc<HttpClient>,
    wait: WaitOptions,
}

impl MarathonManager {
    pub fn new(address: &str) -> Result<Self, SchedError> {
        Ok(Self {
            client: Arc::new(HttpClient::new(address)?),
            wait: WaitOptions::default(),
        })
    }

    /// Registry constructor
    pub fn boxed(address: &str) -> Result<Box<dyn Manager>, SchedError> {
        Ok(Box::new(Self::new(address)?))
    }

    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }
}

/// Docker app definition for `spec` on a bridged network
fn app_definition(spec: &ServiceSpec) -> Value {
    json!({
        "id": spec.id,
        "instances": spec.count,
        "container": {
            "type": "DOCKER",
            "docker": {
                "image": spec.image,
                "network": "BRIDGE"
            }
        }
    })
}

fn app_properties(app: &App, deployment_ids: &[String]) -> Properties {
    let mut props = Properties::new();
    props.insert("id".to_string(), json!(app.id));
    if let Some(version) = &app.version {
        props.insert("version".to_string(), json!(version));
    }
    if let Some(instances) = app.instances {
        props.insert("instances".to_string(), json!(instances));
    }
    props.insert("deploymentIds".to_string(), json!(deployment_ids));
    props
}

fn map_tasks(list: &TaskList) -> Vec<Task> {
    let mut tasks: Vec<Task> = list.tasks.iter().map(task_from_marathon_task).collect();
    sort_tasks_by_ready_time(&mut tasks);
    tasks
}

#[async_trait]
impl Manager for MarathonManager {
    fn backend(&self) -> BackendKind {
        BackendKind::Marathon
    }

    async fn deploy_service(&self, spec: &ServiceSpec) -> Result<Operation, SchedError> {
        info!("Creating app {} ({} x {})", spec.id, spec.count, spec.image);
        let app: App = self
            .client
            .post("/v2/apps", &app_definition(spec))
            .await
            .map_err(SchedError::backend("marathon.deploy_service: create app"))?;

        let deployment_ids: Vec<String> = app.deployments.iter().map(|d| d.id.clone()).collect();
        let properties = app_properties(&app, &deployment_ids);
        let app_id = if app.id.is_empty() {
            spec.id.clone()
        } else {
            app.id.clone()
        };

        let tracker = AppTracker::new(self.client.clone(), app_id, deployment_ids, spec.count);
        Ok(Operation::new(
            BackendKind::Marathon,
            Tracker::MarathonApp(tracker),
            properties,
            &self.wait,
            spec.deploy_timeout,
        ))
    }

    async fn destroy_service(&self, id: &str) -> Result<Operation, SchedError> {
        info!("Deleting app {}", id);
        let result: DeploymentResult = self
            .client
            .delete(&app_path(id), &[("force", "false")])
            .await
            .map_err(SchedError::backend("marathon.destroy_service: delete app"))?;

        let mut properties = Properties::new();
        properties.insert("id".to_string(), json!(id));
        if let Some(version) = &result.version {
            properties.insert("version".to_string(), json!(version));
        }
        properties.insert("deploymentIds".to_string(), json!([result.deployment_id]));

        let tracker = DeploymentsTracker::new(self.client.clone(), vec![result.deployment_id]);
        Ok(Operation::new(
            BackendKind::Marathon,
            Tracker::MarathonDeployments(tracker),
            properties,
            &self.wait,
            None,
        ))
    }

    async fn list_services(&self) -> Result<Vec<Svc>, SchedError> {
        let list: AppList = self
            .client
            .get_with_query("/v2/apps", &[("embed", "apps.tasks")])
            .await
            .map_err(SchedError::backend("marathon.list_services: list apps"))?;
        Ok(list.apps.iter().map(svc_from_marathon_app).collect())
    }

    async fn list_service_tasks(&self, spec: &ServiceSpec) -> Result<Vec<Task>, SchedError> {
        let list: TaskList = self
            .client
            .get(&format!("{}/tasks", app_path(&spec.id)))
            .await
            .map_err(SchedError::backend("marathon.list_service_tasks: list app tasks"))?;
        Ok(map_tasks(&list))
    }

    async fn list_all_tasks(&self) -> Result<Vec<Task>, SchedError> {
        let list: TaskList = self
            .client
            .get("/v2/tasks")
            .await
            .map_err(SchedError::backend("marathon.list_all_tasks: list tasks"))?;
        Ok(map_tasks(&list))
    }
}
