//! REST endpoints for running interviews over HTTP.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use uuid::Uuid;

use crate::analysis::Analyzer;
use crate::error::HostError;

use super::config::{FounderInputs, SessionConfig};
use super::host::SessionHost;

/// Shared state for interview routes.
#[derive(Clone)]
pub struct InterviewRouteState {
    pub host: Arc<SessionHost>,
    /// Enables the analysis and report endpoints when present.
    pub analyzer: Option<Arc<Analyzer>>,
}

/// Build the interview REST routes.
pub fn interview_routes(state: InterviewRouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/interviews", post(create_interview))
        .route("/api/interviews/{id}/start", post(start_interview))
        .route("/api/interviews/{id}/turn", post(submit_turn))
        .route("/api/interviews/{id}/export", get(export_interview))
        .route("/api/interviews/{id}/stats", get(interview_stats))
        .route("/api/interviews/{id}/analysis", post(analyze_interview))
        .route("/api/interviews/{id}/report", post(report_interview))
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mombot"
    }))
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(serde_json::json!({"error": message.to_string()})),
    )
        .into_response()
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let status = match &self {
            HostError::NotFound { .. } => StatusCode::NOT_FOUND,
            HostError::InterviewComplete { .. } => StatusCode::CONFLICT,
            HostError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        error_response(status, self)
    }
}

fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid interview ID"))
}

/// POST /api/interviews
///
/// Validates the founder inputs and creates a session. Responds with the new
/// id and the founder reflection.
async fn create_interview(
    State(state): State<InterviewRouteState>,
    Json(inputs): Json<FounderInputs>,
) -> Response {
    let config = match SessionConfig::try_from(inputs) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Rejected founder inputs");
            return HostError::from(e).into_response();
        }
    };
    let reflection = config.reflection();
    let session_id = state.host.create(config).await;
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session_id,
            "reflection": reflection,
        })),
    )
        .into_response()
}

/// POST /api/interviews/{id}/start
async fn start_interview(
    State(state): State<InterviewRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.host.start(id).await {
        Ok(message) => Json(serde_json::json!({"message": message})).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
struct TurnRequest {
    content: String,
}

/// POST /api/interviews/{id}/turn
async fn submit_turn(
    State(state): State<InterviewRouteState>,
    Path(id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.host.advance(id, &body.content).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/interviews/{id}/export
async fn export_interview(
    State(state): State<InterviewRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.host.export(id).await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/interviews/{id}/stats
async fn interview_stats(
    State(state): State<InterviewRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.host.stats(id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => e.into_response(),
    }
}

fn analyzer(state: &InterviewRouteState) -> Result<Arc<Analyzer>, Response> {
    state.analyzer.clone().ok_or_else(|| {
        error_response(StatusCode::SERVICE_UNAVAILABLE, "Analysis is not configured")
    })
}

/// POST /api/interviews/{id}/analysis
///
/// Analyzes the session's responses so far.
async fn analyze_interview(
    State(state): State<InterviewRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let analyzer = match analyzer(&state) {
        Ok(analyzer) => analyzer,
        Err(response) => return response,
    };
    let doc = match state.host.export(id).await {
        Ok(doc) => doc,
        Err(e) => return e.into_response(),
    };
    match analyzer.analyze(&doc).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => {
            warn!(session_id = %id, error = %e, "Interview analysis failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

/// POST /api/interviews/{id}/report
///
/// Analyzes the session and writes a report from the analysis.
async fn report_interview(
    State(state): State<InterviewRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let analyzer = match analyzer(&state) {
        Ok(analyzer) => analyzer,
        Err(response) => return response,
    };
    let doc = match state.host.export(id).await {
        Ok(doc) => doc,
        Err(e) => return e.into_response(),
    };
    let result = match analyzer.analyze(&doc).await {
        Ok(analysis) => analyzer
            .generate_report(&analysis)
            .await
            .map(|report| (analysis, report)),
        Err(e) => Err(e),
    };
    match result {
        Ok((analysis, report)) => Json(serde_json::json!({
            "analysis": analysis,
            "report": report,
        }))
        .into_response(),
        Err(e) => {
            warn!(session_id = %id, error = %e, "Interview report failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}
