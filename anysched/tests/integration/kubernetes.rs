//! Kubernetes adapter against a fake API server

use std::time::Duration;

use anysched::backends::KubernetesManager;
use anysched::{Manager, OperationState, SchedError, ServiceSpec};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{count_requests, fixture, Sequence};

const DEPLOYMENTS: &str = "/apis/apps/v1/namespaces/default/deployments";
const HTTPBIN: &str = "/apis/apps/v1/namespaces/default/deployments/httpbin";
const PODS: &str = "/api/v1/namespaces/default/pods";

fn spec() -> ServiceSpec {
    ServiceSpec::new("httpbin", "kennethreitz/httpbin", 3)
}

async fn server_with_created_deployment() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEPLOYMENTS))
        .and(body_partial_json(json!({
            "spec": {"replicas": 3, "selector": {"matchLabels": {"appID": "httpbin"}}}
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(fixture("kubernetes/deployment_create.json")),
        )
        .mount(&server)
        .await;
    server
}

async fn mount_rollout(server: &MockServer, fixtures: &[&str]) {
    Mock::given(method("GET"))
        .and(path(HTTPBIN))
        .respond_with(Sequence::fixtures(fixtures))
        .mount(server)
        .await;
}

fn manager(server: &MockServer) -> KubernetesManager {
    KubernetesManager::new(&server.uri()).unwrap()
}

#[tokio::test]
async fn test_deploy_reports_creation_properties() {
    let server = server_with_created_deployment().await;

    let op = manager(&server).deploy_service(&spec()).await.unwrap();
    let props = op.properties();

    assert_eq!(props["name"], "httpbin");
    assert_eq!(props["namespace"], "default");
    assert_eq!(props["uid"], "c6d5b3a4-90a1-11e8-8d4b-080027c1a5f1");
    assert_eq!(props["generation"], 1);
    assert_eq!(props["resourceVersion"], "411024");
    assert_eq!(props["creationTimestamp"], "2018-07-26T03:19:00Z");
    assert_eq!(props["labels.appID"], "httpbin");
    assert_eq!(props["annotations.deployment.kubernetes.io/revision"], "1");
    assert_eq!(props["spec.strategy"]["type"], "RollingUpdate");
    assert_eq!(op.state(), OperationState::Created);
    assert!(op.is_tracked());

    // Properties never touch the backend
    assert_eq!(count_requests(&server, "GET", HTTPBIN).await, 0);
}

#[tokio::test]
async fn test_status_of_rolled_out_deployment() {
    let server = server_with_created_deployment().await;
    mount_rollout(&server, &["kubernetes/deployment_get_httpbin.json"]).await;

    let op = manager(&server).deploy_service(&spec()).await.unwrap();
    let status = op.status().await.unwrap();

    assert!(status.done);
    assert_eq!(
        status.message,
        r#"Deployment "httpbin" successfully rolled out. 3 of 3 updated replicas are available."#
    );
    assert_eq!(
        status.last_update_time.unwrap().to_rfc3339(),
        "2018-07-26T03:19:09+00:00"
    );
    assert_eq!(
        status.last_transition_time.unwrap().to_rfc3339(),
        "2018-07-26T03:19:07+00:00"
    );
    assert_eq!(op.state(), OperationState::Succeeded);
}

#[tokio::test]
async fn test_status_follows_rollout_until_deadline() {
    let server = server_with_created_deployment().await;
    mount_rollout(
        &server,
        &[
            "kubernetes/deployment_old_generation.json",
            "kubernetes/deployment_not_all_updated.json",
            "kubernetes/deployment_old_replicas.json",
            "kubernetes/deployment_unavailable_replicas.json",
            "kubernetes/deployment_fail_not_progressing.json",
        ],
    )
    .await;

    let op = manager(&server).deploy_service(&spec()).await.unwrap();
    let prefix = r#"Waiting for deployment "httpbin" to finish: "#;

    let expected = [
        "Waiting for deployment spec update to be observed...",
        "1 out of 3 new replicas have been updated...",
        "1 old replicas are pending termination...",
        "1 of 3 updated replicas are available...",
    ];
    for message in expected {
        let status = op.status().await.unwrap();
        assert!(!status.done);
        assert_eq!(status.message, format!("{prefix}{message}"));
        assert_eq!(op.state(), OperationState::InProgress);
    }

    let err = op.status().await.unwrap_err();
    assert!(matches!(err, SchedError::ProgressDeadlineExceeded { .. }));
    assert_eq!(
        err.to_string(),
        r#"deployment "httpbin" exceeded its progress deadline"#
    );
    assert_eq!(op.state(), OperationState::Failed);
}

#[tokio::test]
async fn test_wait_returns_once_rolled_out() {
    let server = server_with_created_deployment().await;
    mount_rollout(
        &server,
        &[
            "kubernetes/deployment_old_generation.json",
            "kubernetes/deployment_not_all_updated.json",
            "kubernetes/deployment_get_httpbin.json",
        ],
    )
    .await;

    let op = manager(&server)
        .deploy_service(&spec())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
    let status = op.wait().await.unwrap();

    assert!(status.done);
    assert_eq!(op.state(), OperationState::Succeeded);
    assert_eq!(count_requests(&server, "GET", HTTPBIN).await, 3);
}

#[tokio::test]
async fn test_wait_stops_at_deadline_without_further_polls() {
    let server = server_with_created_deployment().await;
    mount_rollout(
        &server,
        &[
            "kubernetes/deployment_not_all_updated.json",
            "kubernetes/deployment_fail_not_progressing.json",
        ],
    )
    .await;

    let op = manager(&server)
        .deploy_service(&spec())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
    let err = op.wait().await.unwrap_err();

    assert!(err.is_terminal());
    assert_eq!(
        err.to_string(),
        r#"deployment "httpbin" exceeded its progress deadline"#
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(count_requests(&server, "GET", HTTPBIN).await, 2);
}

#[tokio::test]
async fn test_wait_times_out_on_stalled_rollout() {
    let server = server_with_created_deployment().await;
    mount_rollout(&server, &["kubernetes/deployment_unavailable_replicas.json"]).await;

    let spec = spec().with_deploy_timeout(Duration::from_millis(200));
    let op = manager(&server)
        .deploy_service(&spec)
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    assert_eq!(op.timeout(), Duration::from_millis(200));

    let err = op.wait().await.unwrap_err();
    assert!(matches!(err, SchedError::TimedOut { .. }));
    assert_eq!(err.to_string(), "timed out after 200ms");
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(op.state(), OperationState::InProgress);
}

#[tokio::test]
async fn test_wait_until_honours_caller_cancellation() {
    let server = server_with_created_deployment().await;
    mount_rollout(&server, &["kubernetes/deployment_unavailable_replicas.json"]).await;

    let op = manager(&server)
        .deploy_service(&spec())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));

    let err = op
        .wait_until(tokio::time::sleep(Duration::from_millis(100)))
        .await
        .unwrap_err();
    match err {
        SchedError::Cancelled { elapsed } => assert!(elapsed < op.timeout()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_destroy_waits_for_removal() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(HTTPBIN))
        .and(body_partial_json(json!({"propagationPolicy": "Foreground"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "Status", "status": "Success"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(HTTPBIN))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200).set_body_json(fixture("kubernetes/deployment_get_httpbin.json")),
            ResponseTemplate::new(404).set_body_json(json!({"kind": "Status", "code": 404})),
        ]))
        .mount(&server)
        .await;

    let op = manager(&server)
        .destroy_service("httpbin")
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
    assert_eq!(op.properties()["name"], "httpbin");

    let status = op.wait().await.unwrap();
    assert!(status.done);
    assert_eq!(status.message, r#"Deployment "httpbin" deleted."#);
}

#[tokio::test]
async fn test_list_services() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("kubernetes/deployments_list.json")))
        .mount(&server)
        .await;

    let svcs = manager(&server).list_services().await.unwrap();

    assert_eq!(svcs.len(), 2);
    assert_eq!(svcs[0].id, "httpbin");
    assert_eq!(svcs[0].tasks_running, Some(3));
    assert_eq!(svcs[0].tasks_healthy, Some(3));
    assert_eq!(svcs[0].tasks_unhealthy, Some(0));
    assert_eq!(
        svcs[0].creation_time.unwrap().to_rfc3339(),
        "2018-07-26T03:19:00+00:00"
    );
    assert_eq!(svcs[1].id, "redis");
    assert_eq!(svcs[1].tasks_unhealthy, Some(1));
}

#[tokio::test]
async fn test_deployment_with_blank_timestamp_is_listed() {
    let server = MockServer::start().await;
    let mut list = fixture("kubernetes/deployments_list.json");
    list["items"][1]["metadata"]["creationTimestamp"] = json!("");
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(list))
        .mount(&server)
        .await;

    let svcs = manager(&server).list_services().await.unwrap();

    assert_eq!(svcs.len(), 2);
    assert!(svcs[0].creation_time.is_some());
    assert_eq!(svcs[1].id, "redis");
    assert!(svcs[1].creation_time.is_none());
}

#[tokio::test]
async fn test_deploy_then_list_shows_service() {
    let server = server_with_created_deployment().await;
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("kubernetes/deployments_list.json")))
        .mount(&server)
        .await;

    let manager = manager(&server);
    manager.deploy_service(&spec()).await.unwrap();
    let svcs = manager.list_services().await.unwrap();

    assert!(svcs.iter().any(|svc| svc.id == "httpbin"));
}

#[tokio::test]
async fn test_service_tasks_are_ready_pods_sorted_by_ready_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PODS))
        .and(query_param("labelSelector", "appID=httpbin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("kubernetes/pods_list.json")))
        .mount(&server)
        .await;

    let tasks = manager(&server).list_service_tasks(&spec()).await.unwrap();

    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "httpbin-5b8f7c6d9-9qzlw",
            "httpbin-5b8f7c6d9-d2v8s",
            "httpbin-5b8f7c6d9-x7k2p",
        ]
    );
    assert_eq!(tasks[0].task_ip.as_deref(), Some("172.17.0.4"));
    assert_eq!(tasks[0].host_ip.as_deref(), Some("10.0.2.15"));
}

#[tokio::test]
async fn test_malformed_pod_is_left_out_of_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PODS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "PodList",
            "items": [
                {
                    "metadata": {"name": "httpbin-good", "labels": {"appID": "httpbin"}},
                    "status": {
                        "phase": "Running",
                        "podIP": "172.17.0.4",
                        "conditions": [
                            {"type": "Ready", "status": "True", "lastTransitionTime": "2018-07-26T03:19:05Z"}
                        ]
                    }
                },
                {
                    "metadata": {"name": "httpbin-broken", "labels": {"appID": "httpbin"}},
                    "status": {
                        "phase": "Running",
                        "conditions": [
                            {"type": "Ready", "lastTransitionTime": "not-a-time"}
                        ]
                    }
                },
                {
                    "metadata": {"name": "httpbin-garbled"},
                    "status": {"conditions": "Ready"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let tasks = manager(&server).list_all_tasks().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "httpbin-good");
}

#[tokio::test]
async fn test_list_all_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PODS))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("kubernetes/pods_list.json")))
        .mount(&server)
        .await;

    let tasks = manager(&server).list_all_tasks().await.unwrap();
    assert_eq!(tasks.len(), 3);
}

#[tokio::test]
async fn test_backend_errors_name_the_failing_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEPLOYMENTS))
        .respond_with(ResponseTemplate::new(500).set_body_string("etcdserver: request timed out"))
        .mount(&server)
        .await;

    let err = manager(&server).deploy_service(&spec()).await.unwrap_err();
    let msg = err.to_string();

    assert!(matches!(err, SchedError::Backend { .. }));
    assert!(msg.contains("kubernetes.deploy_service: create deployment"));
    assert!(msg.contains("500"));
    assert!(msg.contains("etcdserver: request timed out"));
}
