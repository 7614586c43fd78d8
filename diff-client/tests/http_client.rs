#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use snitch_diff_client::ApiError;
use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_client::HttpDiffApi;
use snitch_diff_client::HttpDiffApiConfig;
use snitch_diff_client::NodePoll;
use snitch_diff_client::StructurePoll;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn target() -> DiffTarget {
    DiffTarget::new("Environment", "env-1", 1_000, 2_000)
}

fn api_for(server: &MockServer) -> HttpDiffApi {
    HttpDiffApi::new(HttpDiffApiConfig {
        server_url: server.uri(),
        request_timeout: Some(Duration::from_secs(5)),
        csrf_token: Some("csrf-abc".to_string()),
    })
    .expect("client")
}

#[tokio::test]
async fn structure_job_running_is_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/structure/"))
        .and(header("X-CSRFToken", "csrf-abc"))
        .and(body_json(json!({
            "model": "Environment",
            "identity": "env-1",
            "left_time": 1_000,
            "right_time": 2_000,
        })))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({"status": "Job is running. Try later."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let poll = api_for(&server).structure(&target()).await.expect("poll");

    assert_eq!(poll, StructurePoll::Pending);
}

#[tokio::test]
async fn structure_null_frame_is_empty_and_skeleton_is_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/structure/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "frame": null,
            "nodemap": {},
            "nodecount": 0,
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/structure/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "frame": {
                "side": null,
                "model": "Environment",
                "id": "env-1",
                "children": [{"side": "right", "model": "Host", "id": "h1", "children": []}]
            },
            "nodemap": {"Environment": {"env-1": 0}, "Host": {"h1": 1}},
            "nodecount": 2,
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(api.structure(&target()).await.unwrap(), StructurePoll::Empty);

    match api.structure(&target()).await.unwrap() {
        StructurePoll::Ready(ready) => {
            assert_eq!(ready.nodecount, 2);
            assert_eq!(ready.frame.children.len(), 1);
            assert_eq!(ready.nodemap["Host"]["h1"], 1);
        }
        other => panic!("expected ready skeleton, got {other:?}"),
    }
}

#[tokio::test]
async fn nodes_sends_offset_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/nodes/"))
        .and(body_json(json!({
            "model": "Environment",
            "identity": "env-1",
            "left_time": 1_000,
            "right_time": 2_000,
            "offset": 500,
            "limit": 500,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [{"model": "Host", "left": {}, "right": {"hostname": "web-02"}, "both": {}}],
            "nodecount": 501,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let poll = api_for(&server).nodes(&target(), 500, 500).await.unwrap();

    match poll {
        NodePoll::Page(nodes) => {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].right["hostname"], "web-02");
        }
        NodePoll::Pending => panic!("expected a page"),
    }
}

#[tokio::test]
async fn server_error_is_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/nodes/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"status": "The job failed."})))
        .mount(&server)
        .await;

    let err = api_for(&server).nodes(&target(), 0, 500).await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("The job failed."), "{message}");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/structure/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server).structure(&target()).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn slow_server_hits_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/structure/"))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(json!({"status": "running"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let api = HttpDiffApi::new(HttpDiffApiConfig {
        server_url: server.uri(),
        request_timeout: Some(Duration::from_millis(100)),
        csrf_token: None,
    })
    .unwrap();

    let err = api.structure(&target()).await.unwrap_err();

    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn single_node_lookup_handles_missing_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/node/"))
        .and(body_json(json!({
            "model": "Environment",
            "identity": "env-1",
            "left_time": 1_000,
            "right_time": 2_000,
            "node_model": "Host",
            "node_identity": "h1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node": {"model": "Host", "left": {"kernel": "4.4"}, "right": {"kernel": "4.15"}, "both": {"hostname": "h1"}},
            "nodecount": 2,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/objectdiffs/node/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let record = api.node(&target(), "Host", "h1").await.unwrap().expect("record");
    assert_eq!(record.both["hostname"], "h1");

    assert_eq!(api.node(&target(), "Host", "ghost").await.unwrap(), None);
}
