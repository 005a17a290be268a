//! Marathon deployment tracking

use std::sync::Arc;

use backend_api::marathon::{App, AppResponse, Deployment};
use tracing::debug;

use crate::errors::SchedError;
use crate::http::HttpClient;
use crate::models::OperationStatus;

/// Watches an app until its deployments finish and its tasks are running
pub(crate) struct AppTracker {
    client: Arc<HttpClient>,
    app_id: String,
    deployment_ids: Vec<String>,
    expected_instances: u32,
}

impl AppTracker {
    pub(crate) fn new(
        client: Arc<HttpClient>,
        app_id: String,
        deployment_ids: Vec<String>,
        expected_instances: u32,
    ) -> Self {
        Self {
            client,
            app_id,
            deployment_ids,
            expected_instances,
        }
    }

    pub(crate) async fn poll(&self) -> Result<OperationStatus, SchedError> {
        let response: AppResponse = self
            .client
            .get(&app_path(&self.app_id))
            .await
            .map_err(SchedError::backend("marathon.operation.status: get app"))?;
        Ok(self.status_of(&response.app))
    }

    fn status_of(&self, app: &App) -> OperationStatus {
        let pending: Vec<&str> = app
            .deployments
            .iter()
            .map(|d| d.id.as_str())
            .filter(|id| self.deployment_ids.iter().any(|tracked| tracked == id))
            .collect();
        let instances = app.instances.unwrap_or(self.expected_instances);
        let running = app.tasks_running.unwrap_or(0);

        if !pending.is_empty() {
            debug!("App {} still has deployments in flight: {:?}", self.app_id, pending);
            return OperationStatus::at_client_time(
                format!(
                    "Waiting for app {:?}: {} of {} tasks running, {} deployment(s) in progress...",
                    self.app_id,
                    running,
                    instances,
                    pending.len()
                ),
                false,
            );
        }

        if running < instances {
            return OperationStatus::at_client_time(
                format!(
                    "Waiting for app {:?}: {} of {} tasks running...",
                    self.app_id, running, instances
                ),
                false,
            );
        }

        OperationStatus::at_client_time(
            format!(
                "App {:?} deployed. {} of {} tasks running.",
                self.app_id, running, instances
            ),
            true,
        )
    }
}

/// Watches the deployment queue until the tracked IDs leave it
pub(crate) struct DeploymentsTracker {
    client: Arc<HttpClient>,
    deployment_ids: Vec<String>,
}

impl DeploymentsTracker {
    pub(crate) fn new(client: Arc<HttpClient>, deployment_ids: Vec<String>) -> Self {
        Self {
            client,
            deployment_ids,
        }
    }

    pub(crate) async fn poll(&self) -> Result<OperationStatus, SchedError> {
        let queue: Vec<Deployment> = self
            .client
            .get("/v2/deployments")
            .await
            .map_err(SchedError::backend("marathon.operation.status: list deployments"))?;
        Ok(self.status_of(&queue))
    }

    fn status_of(&self, queue: &[Deployment]) -> OperationStatus {
        let pending = queue
            .iter()
            .filter(|d| self.deployment_ids.contains(&d.id))
            .count();

        if pending > 0 {
            OperationStatus::at_client_time(
                format!("Waiting for {} deployment(s) to finish...", pending),
                false,
            )
        } else {
            OperationStatus::at_client_time(
                format!("Deployment(s) {} finished.", self.deployment_ids.join(", ")),
                true,
            )
        }
    }
}

/// Path of a single app; Marathon IDs carry a leading slash
pub(super) fn app_path(app_id: &str) -> String {
    format!("/v2/apps/{}", app_id.trim_start_matches('/'))
}
