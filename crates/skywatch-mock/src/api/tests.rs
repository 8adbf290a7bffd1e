use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use skywatch_core::{Alert, AlertKind, AlertSource, HistoryResponse, ModeAction, ProcessingMode};

use crate::{app, config::MockConfig, state::MockState};

fn setup_app() -> (axum::Router, Arc<MockState>) {
    let state = Arc::new(MockState::new(&MockConfig::default()));
    (app(state.clone()), state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn process_request(mode: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/process/{}", mode))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn history_is_newest_first_in_wire_shape() {
    let (app, state) = setup_app();
    let now = Utc::now();
    state.seed_alert(Alert::new(AlertKind::Animal, "older", now - Duration::minutes(5)).with_id("a1"));
    state.seed_alert(
        Alert::new(AlertKind::Person, "newer", now)
            .with_id("a2")
            .with_source(AlertSource::Offboard),
    );

    let res = app
        .oneshot(Request::builder().uri("/api/alert").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    assert_eq!(body["data"][0]["id"], "a2");
    assert_eq!(body["data"][0]["type"], "person");
    assert_eq!(body["data"][0]["source"], "offboard");
    assert!(body["data"][0]["createdAt"].is_string());

    let history: HistoryResponse = serde_json::from_value(body).unwrap();
    let alerts = history.into_alerts(Utc::now());
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].id, "a1");
}

#[tokio::test]
async fn history_failure_is_injectable() {
    let (app, state) = setup_app();
    state.set_history_failing(true);

    let res = app
        .oneshot(Request::builder().uri("/api/alert").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn process_command_records_flags() {
    let (app, state) = setup_app();

    let res = app
        .clone()
        .oneshot(process_request(
            "facerecognition",
            json!({ "action": "on", "drone_id": "drone-7" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["mode"], "facerecognition");
    assert_eq!(body["action"], "on");
    assert_eq!(body["drone_id"], "drone-7");

    assert!(state.drone_modes("drone-7").face_recognition);
    assert!(!state.drone_modes("drone-7").detection);
    let commands = state.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].mode, ProcessingMode::FaceRecognition);
    assert_eq!(commands[0].action, ModeAction::On);
}

#[tokio::test]
async fn process_command_rejects_bad_input() {
    let (app, state) = setup_app();

    let res = app
        .clone()
        .oneshot(process_request("detection", json!({ "action": "toggle", "drone_id": "d" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(process_request("detection", json!({ "action": "on" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(process_request("thermal", json!({ "action": "on", "drone_id": "d" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert!(state.commands().is_empty());
}

#[tokio::test]
async fn process_failure_is_injectable_per_mode() {
    let (app, state) = setup_app();
    state.set_mode_failing(ProcessingMode::Detection, true);

    let res = app
        .clone()
        .oneshot(process_request("detection", json!({ "action": "off", "drone_id": "d" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = app
        .clone()
        .oneshot(process_request("facerecognition", json!({ "action": "off", "drone_id": "d" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(state.commands().len(), 1);
}

#[tokio::test]
async fn simulate_stores_and_broadcasts() {
    let (app, state) = setup_app();
    let mut rx = state.tx.subscribe();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/simulate")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "id": "sim-1", "type": "animal", "message": "Deer", "source": "offboard" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = read_json(res).await;
    assert_eq!(body["alert"]["id"], "sim-1");

    let pushed = rx.recv().await.unwrap();
    assert_eq!(pushed.id, "sim-1");
    assert_eq!(pushed.source, AlertSource::Offboard);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/simulate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(state.alerts_newest_first().len(), 2);
}

#[tokio::test]
async fn simulate_rejects_malformed_json() {
    let (app, state) = setup_app();

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/simulate")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(state.alerts_newest_first().is_empty());
}

#[tokio::test]
async fn health_check() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
