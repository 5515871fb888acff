use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
};
use pi_lights::{
    create_app, AppState, Level, LightController, MockGpio, PinConfig, PinMode, WebConfig,
    DEFAULT_LIGHT_PIN, DEFAULT_POWER_PIN, GREETING,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    gpio: Arc<MockGpio>,
    light: Arc<LightController>,
    config: WebConfig,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(WebConfig::default())
    }

    fn with_config(config: WebConfig) -> Self {
        let gpio = Arc::new(MockGpio::new());
        let light = Arc::new(
            LightController::new(gpio.clone(), PinConfig::default())
                .expect("Should create controller"),
        );
        Self { gpio, light, config }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        let state = AppState::new(self.light.clone()).with_strict_json(self.config.strict_json);
        create_app(&self.config, state)
            .oneshot(request)
            .await
            .expect("Service should not fail")
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_power(&self, body: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/light/power")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn power_json(&self) -> Value {
        let response = self.get("/light/power").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body should be JSON")
}

#[tokio::test]
async fn test_home_page_greets() {
    let app = TestApp::new();
    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_bytes(response).await, GREETING.as_bytes());
}

#[tokio::test]
async fn test_initial_power_is_off() {
    let app = TestApp::new();
    assert_eq!(app.power_json().await, json!({ "On": false }));
}

#[tokio::test]
async fn test_power_on_then_off() {
    let app = TestApp::new();

    let response = app.post_power(r#"{"On": true}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(app.power_json().await, json!({ "On": true }));
    assert_eq!(app.gpio.mode(DEFAULT_POWER_PIN).unwrap(), Some(PinMode::Output));
    assert_eq!(app.gpio.output_level(DEFAULT_POWER_PIN).unwrap(), Some(Level::High));

    let response = app.post_power(r#"{"On": false}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.power_json().await, json!({ "On": false }));
    assert_eq!(app.gpio.output_level(DEFAULT_POWER_PIN).unwrap(), Some(Level::Low));
}

#[tokio::test]
async fn test_malformed_power_request_is_ignored() {
    let app = TestApp::new();
    app.post_power(r#"{"On": true}"#).await;

    for body in ["not json", r#"{"On": "off"}"#, "", "{\"On\":"] {
        let response = app.post_power(body).await;
        assert_eq!(response.status(), StatusCode::OK, "body {:?}", body);
    }

    assert_eq!(app.power_json().await, json!({ "On": true }));
    assert_eq!(app.gpio.output_level(DEFAULT_POWER_PIN).unwrap(), Some(Level::High));
}

#[tokio::test]
async fn test_well_formed_body_without_boolean_turns_off() {
    let app = TestApp::new();

    for body in ["{}", r#"{"On": null}"#, r#"{"ON": false}"#, r#"{"unrelated": 1}"#] {
        app.post_power(r#"{"On": true}"#).await;
        assert_eq!(app.power_json().await, json!({ "On": true }));

        let response = app.post_power(body).await;
        assert_eq!(response.status(), StatusCode::OK, "body {:?}", body);
        assert_eq!(app.power_json().await, json!({ "On": false }), "body {:?}", body);
        assert_eq!(
            app.gpio.output_level(DEFAULT_POWER_PIN).unwrap(),
            Some(Level::Low)
        );
    }
}

#[tokio::test]
async fn test_field_name_matches_any_case() {
    let app = TestApp::new();

    app.post_power(r#"{"oN": true}"#).await;
    assert_eq!(app.power_json().await, json!({ "On": true }));
}

#[tokio::test]
async fn test_strict_mode_rejects_malformed_request() {
    let app = TestApp::with_config(WebConfig::default().with_strict_json(true));

    let response = app.post_power("{\"On\":").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.power_json().await, json!({ "On": false }));

    let response = app.post_power(r#"{"On": true}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_intensity_low_reads_bright() {
    let app = TestApp::new();
    app.gpio.set_input_level(DEFAULT_LIGHT_PIN, Level::Low).unwrap();

    let response = app.get("/light/intensity").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(response).await, json!({ "Value": 1 }));
    assert_eq!(app.gpio.mode(DEFAULT_LIGHT_PIN).unwrap(), Some(PinMode::Input));
}

#[tokio::test]
async fn test_intensity_high_reads_dark() {
    let app = TestApp::new();
    app.gpio.set_input_level(DEFAULT_LIGHT_PIN, Level::High).unwrap();

    let response = app.get("/light/intensity").await;
    assert_eq!(body_json(response).await, json!({ "Value": 0 }));
}

#[tokio::test]
async fn test_intensity_hardware_failure() {
    let app = TestApp::new();
    app.gpio.set_faulty(true);

    let response = app.get("/light/intensity").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_power_hardware_failure_keeps_state() {
    let app = TestApp::new();
    app.gpio.set_faulty(true);

    let response = app.post_power(r#"{"On": true}"#).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    app.gpio.set_faulty(false);
    assert_eq!(app.power_json().await, json!({ "On": false }));
}

#[tokio::test]
async fn test_trailing_slash_is_normalised() {
    let app = TestApp::new();
    app.post_power(r#"{"On": true}"#).await;

    let response = app.get("/light/power/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "On": true }));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/light/colour").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_intensity_rejects_post() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/light/intensity")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_concurrent_power_requests_stay_consistent() {
    let app = Arc::new(TestApp::new());
    let mut handles = Vec::new();

    for i in 0..20 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let body = if i % 2 == 0 {
                r#"{"On": true}"#
            } else {
                r#"{"On": false}"#
            };
            app.post_power(body).await.status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    // Whatever request won last, the stored state and the pin agree.
    let on = app.power_json().await["On"].as_bool().unwrap();
    assert_eq!(
        app.gpio.output_level(DEFAULT_POWER_PIN).unwrap(),
        Some(Level::from(on))
    );
}
