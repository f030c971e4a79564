//! Router-level tests for the interview API.
//!
//! Requests go straight through the axum `Router` with `tower::ServiceExt::oneshot`;
//! no socket is bound.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use mombot::error::LlmError;
use mombot::interview::{
    InterviewRouteState, LlmSummarizer, ScriptCatalog, SessionHost, SummaryConfig,
    interview_routes,
};
use mombot::llm::{
    CompletionRequest, CompletionResponse, FinishReason, FragmentStream, LlmProvider,
};

struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: "stub".to_string(),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
        })
    }

    async fn complete_stream(
        &self,
        _request: CompletionRequest,
    ) -> Result<FragmentStream, LlmError> {
        let fragments: Vec<Result<String, LlmError>> = vec![Ok("summary".to_string())];
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

/// Router without an analyzer.
fn app() -> Router {
    let summarizer = Arc::new(LlmSummarizer::new(Arc::new(StubLlm), SummaryConfig::default()));
    let host = SessionHost::new(Arc::new(ScriptCatalog::builtin()), summarizer);
    interview_routes(InterviewRouteState {
        host: Arc::new(host),
        analyzer: None,
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn founder_inputs() -> Value {
    json!({
        "problem_domain": "workplace hydration",
        "problems": ["people forget to drink water"],
        "value_prop": "a desk bottle that nudges you",
        "target_action": "sign up"
    })
}

async fn create(app: &Router) -> String {
    let (status, body) = send(app, post_json("/api/interviews", founder_inputs())).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "mombot");
}

#[tokio::test]
async fn malformed_id_is_bad_request_on_every_route() {
    let app = app();
    let requests = [
        post_empty("/api/interviews/nope/start"),
        post_json("/api/interviews/nope/turn", json!({"content": "hi"})),
        get("/api/interviews/nope/export"),
        get("/api/interviews/nope/stats"),
        post_empty("/api/interviews/nope/analysis"),
        post_empty("/api/interviews/nope/report"),
    ];
    for request in requests {
        let uri = request.uri().to_string();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Invalid interview ID");
    }
}

#[tokio::test]
async fn invalid_founder_inputs_are_unprocessable() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/api/interviews", json!({"problem_domain": "x", "problems": []})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("problems"));

    let mut blank_action = founder_inputs();
    blank_action["target_action"] = json!("   ");
    let (status, body) = send(&app, post_json("/api/interviews", blank_action)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("target_action"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = app();
    let id = uuid::Uuid::new_v4();

    let (status, body) = send(&app, post_empty(&format!("/api/interviews/{id}/start"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id.to_string()));

    let (status, _) = send(&app, get(&format!("/api/interviews/{id}/export"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analysis_without_analyzer_is_unavailable() {
    let app = app();
    let id = create(&app).await;

    let (status, body) = send(&app, post_empty(&format!("/api/interviews/{id}/analysis"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Analysis is not configured");

    let (status, _) = send(&app, post_empty(&format!("/api/interviews/{id}/report"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn completed_interview_conflicts_on_start_and_turn() {
    let app = app();
    let id = create(&app).await;

    let (status, _) = send(&app, post_empty(&format!("/api/interviews/{id}/start"))).await;
    assert_eq!(status, StatusCode::OK);

    let turn_uri = format!("/api/interviews/{id}/turn");
    let mut last = Value::Null;
    for input in ["desk job", "ok", "1", "meh", "no", "sure"] {
        let (status, body) = send(&app, post_json(&turn_uri, json!({"content": input}))).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last["complete"], true);

    let (status, _) = send(&app, post_json(&turn_uri, json!({"content": "hello?"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, post_empty(&format!("/api/interviews/{id}/start"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, stats) = send(&app, get(&format!("/api/interviews/{id}/stats"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["summaries"], 1);
    assert_eq!(stats["problem_responses"], 1);
}
