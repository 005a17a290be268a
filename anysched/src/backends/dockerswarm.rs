//! Docker Swarm backend (Docker Engine services API)
//!
//! The engine acknowledges service creation and removal but exposes no
//! rollout progress, so operations from this backend are untracked.

use async_trait::async_trait;
use backend_api::swarm::ServiceCreateResponse;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::SchedError;
use crate::http::HttpClient;
use crate::manager::{BackendKind, Manager};
use crate::models::{ServiceSpec, Svc, Task};
use crate::operation::{Operation, Properties, Tracker, WaitOptions};

/// Engine address used when neither the config nor `DOCKER_HOST` name one
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:2375";

const BACKEND: &str = "dockerswarm";

/// Manager for a Docker Engine in swarm mode reached over TCP
pub struct DockerSwarmManager {
    client: HttpClient,
    wait: WaitOptions,
}

impl DockerSwarmManager {
    /// Connect to `address`, falling back to `DOCKER_HOST` when it is empty
    pub fn new(address: &str) -> Result<Self, SchedError> {
        let docker_host = std::env::var("DOCKER_HOST").ok();
        let address = resolve_address(address, docker_host.as_deref())?;
        Ok(Self {
            client: HttpClient::new(&address)?,
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

    fn untracked(&self, properties: Properties, spec: Option<&ServiceSpec>) -> Operation {
        Operation::new(
            BackendKind::DockerSwarm,
            Tracker::Untracked,
            properties,
            &self.wait,
            spec.and_then(|s| s.deploy_timeout),
        )
    }
}

/// Pick the engine URL from the configured address or `DOCKER_HOST`
///
/// `tcp://` is rewritten to `http://`; unix sockets are not supported.
pub fn resolve_address(address: &str, docker_host: Option<&str>) -> Result<String, SchedError> {
    let address = match (address, docker_host) {
        ("", Some(host)) if !host.is_empty() => host,
        ("", _) => DEFAULT_ADDRESS,
        (configured, _) => configured,
    };

    if address.starts_with("unix://") {
        return Err(SchedError::InvalidAddress {
            address: address.to_string(),
            reason: "unix sockets are not supported, expose the engine over TCP".to_string(),
        });
    }

    Ok(match address.strip_prefix("tcp://") {
        Some(rest) => format!("http://{rest}"),
        None => address.to_string(),
    })
}

fn service_spec(spec: &ServiceSpec) -> Value {
    json!({
        "Name": spec.id,
        "TaskTemplate": {
            "ContainerSpec": {
                "Image": spec.image
            }
        },
        "Mode": {
            "Replicated": {
                "Replicas": spec.count
            }
        }
    })
}

#[async_trait]
impl Manager for DockerSwarmManager {
    fn backend(&self) -> BackendKind {
        BackendKind::DockerSwarm
    }

    async fn deploy_service(&self, spec: &ServiceSpec) -> Result<Operation, SchedError> {
        info!("Creating swarm service {} ({} x {})", spec.id, spec.count, spec.image);
        let response: ServiceCreateResponse = self
            .client
            .post("/services/create", &service_spec(spec))
            .await
            .map_err(SchedError::backend("dockerswarm.deploy_service: create service"))?;

        let mut properties = Properties::new();
        properties.insert("id".to_string(), json!(response.id));
        properties.insert("name".to_string(), json!(spec.id));
        if let Some(warnings) = response.warnings.filter(|w| !w.is_empty()) {
            warn!("Docker reported warnings creating {}: {:?}", spec.id, warnings);
            properties.insert("warnings".to_string(), json!(warnings));
        }
        Ok(self.untracked(properties, Some(spec)))
    }

    async fn destroy_service(&self, id: &str) -> Result<Operation, SchedError> {
        info!("Removing swarm service {}", id);
        self.client
            .delete_empty(&format!("/services/{id}"))
            .await
            .map_err(SchedError::backend("dockerswarm.destroy_service: remove service"))?;

        let mut properties = Properties::new();
        properties.insert("id".to_string(), json!(id));
        Ok(self.untracked(properties, None))
    }

    async fn list_services(&self) -> Result<Vec<Svc>, SchedError> {
        Err(SchedError::NotImplemented {
            backend: BACKEND,
            call: "list_services",
        })
    }

    async fn list_service_tasks(&self, _spec: &ServiceSpec) -> Result<Vec<Task>, SchedError> {
        Err(SchedError::NotImplemented {
            backend: BACKEND,
            call: "list_service_tasks",
        })
    }

    async fn list_all_tasks(&self) -> Result<Vec<Task>, SchedError> {
        Err(SchedError::NotImplemented {
            backend: BACKEND,
            call: "list_all_tasks",
        })
    }
}
