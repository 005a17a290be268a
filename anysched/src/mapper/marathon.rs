//! Marathon apps and tasks

use backend_api::marathon::{App, Task as MarathonTask};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::{Svc, Task};

/// Map an app onto a service record
pub fn svc_from_marathon_app(app: &App) -> Svc {
    Svc {
        id: app.id.clone(),
        tasks_running: app.tasks_running,
        tasks_healthy: app.tasks_healthy,
        tasks_unhealthy: app.tasks_unhealthy,
        creation_time: None,
    }
}

/// Map a Marathon task onto a task record
pub fn task_from_marathon_task(task: &MarathonTask) -> Task {
    let health = task.health_check_results.first();
    let last_success = health.and_then(|h| parse_time(&task.id, "lastSuccess", h.last_success.as_deref()));
    let last_failure = health.and_then(|h| parse_time(&task.id, "lastFailure", h.last_failure.as_deref()));
    let ip_addresses: Vec<String> = task
        .ip_addresses
        .iter()
        .map(|ip| ip.ip_address.clone())
        .collect();

    Task {
        name: task.id.clone(),
        app_id: task.app_id.clone(),
        host_name: task.host.clone(),
        task_ip: ip_addresses.first().cloned(),
        ip_addresses,
        ports: task.ports.clone(),
        service_ports: task.service_ports.clone(),
        slave_id: task.slave_id.clone(),
        stage_time: parse_time(&task.id, "stagedAt", task.staged_at.as_deref()),
        start_time: parse_time(&task.id, "startedAt", task.started_at.as_deref()),
        last_health_check_time: last_success.max(last_failure),
        last_healthy_time: last_success,
        state: task.state.clone(),
        version: task.version.clone(),
        ..Task::new(task.id.clone())
    }
}

/// Parse an RFC 3339 timestamp; empty or malformed values become `None`
fn parse_time(task_id: &str, field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring malformed {} {:?} on task {}: {}", field, raw, task_id, e);
            None
        }
    }
}
