//! Marathon v2 models

use serde::{Deserialize, Serialize};

/// A Marathon application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub instances: Option<u32>,
    pub tasks_running: Option<u32>,
    pub tasks_healthy: Option<u32>,
    pub tasks_unhealthy: Option<u32>,
    pub version: Option<String>,
    /// Deployments currently touching this app
    #[serde(default)]
    pub deployments: Vec<DeploymentRef>,
}

/// Reference to a running deployment embedded in an app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentRef {
    pub id: String,
}

/// Response of `GET /v2/apps/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppResponse {
    pub app: App,
}

/// Response of `GET /v2/apps`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppList {
    #[serde(default)]
    pub apps: Vec<App>,
}

/// A running Marathon task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub app_id: Option<String>,
    pub host: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub service_ports: Vec<u16>,
    pub slave_id: Option<String>,
    /// RFC 3339, kept raw so one bad record cannot fail a whole listing
    pub staged_at: Option<String>,
    pub started_at: Option<String>,
    pub state: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub health_check_results: Vec<HealthCheckResult>,
}

/// IP address assigned to a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddress {
    pub ip_address: String,
}

/// Result of the latest health check on a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub last_success: Option<String>,
    pub last_failure: Option<String>,
}

/// Response of `GET /v2/tasks` and `GET /v2/apps/{id}/tasks`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Response of mutating calls that start a deployment (e.g. app delete)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub deployment_id: String,
    pub version: Option<String>,
}

/// Entry of `GET /v2/deployments`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
}
