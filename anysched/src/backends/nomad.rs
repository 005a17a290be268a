//! Nomad backend (v1 jobs API)

use async_trait::async_trait;
use backend_api::nomad::JobWriteResponse;
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::SchedError;
use crate::http::HttpClient;
use crate::manager::{BackendKind, Manager};
use crate::models::{ServiceSpec, Svc, Task};
use crate::operation::{Operation, Properties, Tracker, WaitOptions};

/// Agent address used when neither the config nor `NOMAD_ADDR` name one
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";

const TOKEN_HEADER: &str = "X-Nomad-Token";

const BACKEND: &str = "nomad";

/// Manager for a Nomad cluster
pub struct NomadManager {
    client: HttpClient,
    wait: WaitOptions,
}

impl NomadManager {
    /// Connect to `address`, honouring `NOMAD_ADDR` and `NOMAD_TOKEN`
    pub fn new(address: &str) -> Result<Self, SchedError> {
        let nomad_addr = std::env::var("NOMAD_ADDR").ok();
        let token = std::env::var("NOMAD_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);
        Self::with_token(&resolve_address(address, nomad_addr.as_deref()), token)
    }

    /// Connect to `address` sending `token` as the ACL token, if any
    pub fn with_token(address: &str, token: Option<SecretString>) -> Result<Self, SchedError> {
        let mut client = HttpClient::new(address)?;
        if let Some(token) = token {
            client = client.with_auth_header(TOKEN_HEADER, token);
        }
        Ok(Self {
            client,
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
            BackendKind::Nomad,
            Tracker::Untracked,
            properties,
            &self.wait,
            spec.and_then(|s| s.deploy_timeout),
        )
    }
}

/// Pick the agent URL from the configured address or `NOMAD_ADDR`
pub fn resolve_address(address: &str, nomad_addr: Option<&str>) -> String {
    match (address, nomad_addr) {
        ("", Some(addr)) if !addr.is_empty() => addr.to_string(),
        ("", _) => DEFAULT_ADDRESS.to_string(),
        (configured, _) => configured.to_string(),
    }
}

/// Service job in `dc1` running `count` docker tasks of `image`
fn job_definition(spec: &ServiceSpec) -> Value {
    json!({
        "Job": {
            "ID": spec.id,
            "Name": spec.id,
            "Type": "service",
            "Datacenters": ["dc1"],
            "TaskGroups": [{
                "Name": spec.id,
                "Count": spec.count,
                "Tasks": [{
                    "Name": spec.id,
                    "Driver": "docker",
                    "Config": {
                        "image": spec.image
                    }
                }]
            }]
        }
    })
}

fn write_properties(id: &str, response: &JobWriteResponse) -> Properties {
    let mut props = Properties::new();
    props.insert("id".to_string(), json!(id));
    if let Some(eval_id) = &response.eval_id {
        props.insert("evalId".to_string(), json!(eval_id));
    }
    if let Some(index) = response.job_modify_index {
        props.insert("jobModifyIndex".to_string(), json!(index));
    }
    if let Some(warnings) = response.warnings.as_deref().filter(|w| !w.is_empty()) {
        warn!("Nomad reported warnings for job {}: {}", id, warnings);
        props.insert("warnings".to_string(), json!(warnings));
    }
    props
}

#[async_trait]
impl Manager for NomadManager {
    fn backend(&self) -> BackendKind {
        BackendKind::Nomad
    }

    async fn deploy_service(&self, spec: &ServiceSpec) -> Result<Operation, SchedError> {
        info!("Registering job {} ({} x {})", spec.id, spec.count, spec.image);
        let response: JobWriteResponse = self
            .client
            .post("/v1/jobs", &job_definition(spec))
            .await
            .map_err(SchedError::backend("nomad.deploy_service: register job"))?;
        Ok(self.untracked(write_properties(&spec.id, &response), Some(spec)))
    }

    async fn destroy_service(&self, id: &str) -> Result<Operation, SchedError> {
        info!("Deregistering job {}", id);
        let response: JobWriteResponse = self
            .client
            .delete(&format!("/v1/job/{id}"), &[("purge", "true")])
            .await
            .map_err(SchedError::backend("nomad.destroy_service: deregister job"))?;
        Ok(self.untracked(write_properties(id, &response), None))
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
