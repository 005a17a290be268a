//! Marathon adapter against a fake Marathon

use std::time::Duration;

use anysched::backends::MarathonManager;
use anysched::{Manager, OperationState, SchedError, ServiceSpec};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{count_requests, fixture, Sequence};

fn spec() -> ServiceSpec {
    ServiceSpec::new("httpbin", "kennethreitz/httpbin", 2)
}

fn manager(server: &MockServer) -> MarathonManager {
    MarathonManager::new(&server.uri()).unwrap()
}

async fn mount_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/apps"))
        .and(body_partial_json(json!({
            "id": "httpbin",
            "instances": 2,
            "container": {"docker": {"image": "kennethreitz/httpbin", "network": "BRIDGE"}}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(fixture("marathon/app_create.json")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_deploy_tracks_app_until_running() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/apps/httpbin"))
        .respond_with(Sequence::fixtures(&[
            "marathon/app_get_pending.json",
            "marathon/app_get_running.json",
        ]))
        .mount(&server)
        .await;

    let op = manager(&server).deploy_service(&spec()).await.unwrap();

    let props = op.properties();
    assert_eq!(props["id"], "/httpbin");
    assert_eq!(props["version"], "2018-07-20T18:38:00.102Z");
    assert_eq!(
        props["deploymentIds"],
        json!(["5ed4c0c5-9ff8-4a6f-a0cd-f57f59a34b43"])
    );

    let status = op.status().await.unwrap();
    assert!(!status.done);
    assert!(status.message.contains("1 of 2 tasks running"));
    assert_eq!(status.last_update_time, Some(status.client_time));

    let status = op.status().await.unwrap();
    assert!(status.done);
    assert_eq!(status.message, r#"App "/httpbin" deployed. 2 of 2 tasks running."#);
    assert_eq!(op.state(), OperationState::Succeeded);
}

#[tokio::test]
async fn test_deploy_wait() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/apps/httpbin"))
        .respond_with(Sequence::fixtures(&[
            "marathon/app_get_pending.json",
            "marathon/app_get_pending.json",
            "marathon/app_get_running.json",
        ]))
        .mount(&server)
        .await;

    let op = manager(&server)
        .deploy_service(&spec())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));

    assert!(op.wait().await.unwrap().done);
    assert_eq!(count_requests(&server, "GET", "/v2/apps/httpbin").await, 3);
}

#[tokio::test]
async fn test_deploy_wait_times_out() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/apps/httpbin"))
        .respond_with(Sequence::fixtures(&["marathon/app_get_pending.json"]))
        .mount(&server)
        .await;

    let op = manager(&server)
        .deploy_service(&spec())
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(150))
        .with_poll_interval(Duration::from_millis(20));

    let err = op.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "timed out after 150ms");
}

#[tokio::test]
async fn test_destroy_tracks_deployment_queue() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/apps/httpbin"))
        .and(query_param("force", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("marathon/app_delete.json")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/deployments"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200).set_body_json(fixture("marathon/deployments.json")),
            ResponseTemplate::new(200).set_body_json(json!([])),
        ]))
        .mount(&server)
        .await;

    let op = manager(&server)
        .destroy_service("/httpbin")
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
    assert_eq!(
        op.properties()["deploymentIds"],
        json!(["9f3b2c6e-1a4e-4d11-8c0c-0d3f1e2a7b90"])
    );

    let status = op.wait().await.unwrap();
    assert!(status.done);
    assert_eq!(count_requests(&server, "GET", "/v2/deployments").await, 2);
}

#[tokio::test]
async fn test_list_services() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/apps"))
        .and(query_param("embed", "apps.tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("marathon/apps_list.json")))
        .mount(&server)
        .await;

    let svcs = manager(&server).list_services().await.unwrap();

    assert_eq!(svcs.len(), 2);
    assert_eq!(svcs[0].id, "/httpbin");
    assert_eq!(svcs[0].tasks_running, Some(2));
    assert_eq!(svcs[1].id, "/infra/redis");
    assert_eq!(svcs[1].tasks_unhealthy, Some(1));
    assert!(svcs[1].creation_time.is_none());
}

#[tokio::test]
async fn test_list_service_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/apps/httpbin/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("marathon/tasks.json")))
        .mount(&server)
        .await;

    let tasks = manager(&server).list_service_tasks(&spec()).await.unwrap();

    assert_eq!(tasks.len(), 2);
    let running = &tasks[0];
    assert_eq!(running.name, "httpbin.8b5b6b5e-8c4a-11e8-9a4c-0242ac110002");
    assert_eq!(running.app_id.as_deref(), Some("/httpbin"));
    assert_eq!(running.host_name.as_deref(), Some("10.0.2.15"));
    assert_eq!(running.task_ip.as_deref(), Some("172.17.0.3"));
    assert_eq!(running.ports, vec![31521]);
    assert_eq!(running.service_ports, vec![10000]);
    assert_eq!(running.state.as_deref(), Some("TASK_RUNNING"));
    assert!(running.last_healthy_time.is_some());
    assert_eq!(running.last_health_check_time, running.last_healthy_time);

    let staging = &tasks[1];
    assert_eq!(staging.state.as_deref(), Some("TASK_STAGING"));
    assert!(staging.stage_time.is_some());
    assert!(staging.start_time.is_none());
    assert!(staging.last_health_check_time.is_none());
}

#[tokio::test]
async fn test_list_all_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("marathon/tasks.json")))
        .mount(&server)
        .await;

    let tasks = manager(&server).list_all_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
}

#[tokio::test]
async fn test_backend_errors_name_the_failing_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("leader unavailable"))
        .mount(&server)
        .await;

    let err = manager(&server).list_all_tasks().await.unwrap_err();

    assert!(matches!(err, SchedError::Backend { .. }));
    assert!(err.to_string().contains("marathon.list_all_tasks: list tasks"));
    assert!(err.to_string().contains("leader unavailable"));
}
