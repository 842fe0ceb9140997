//! HTTP surface of the gateway
//!
//! Two routes: a liveness probe on `/` and the query endpoint on `/predict`.
//! Handlers borrow everything they need from [`AppState`], so tests can swap
//! in a scripted runner.

use crate::config::{Config, RouteMode, SessionConfig, SessionPolicy};
use crate::error::Error;
use crate::runner::{first_final_text, AgentRunner, SessionIdentity};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};

/// Placeholder returned when the event stream ends without a final response
const NO_FINAL_RESPONSE: &str = "The agent did not produce a final response.";

// ---- App State ----

/// Shared per-process state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Agent runtime the gateway delegates to
    pub runner: Arc<dyn AgentRunner>,
    /// Session identity settings
    pub session: SessionConfig,
}

impl AppState {
    /// Create state around a runner
    pub fn new(runner: Arc<dyn AgentRunner>, session: SessionConfig) -> Self {
        AppState { runner, session }
    }

    /// Session identity for one incoming request, per the configured policy
    fn session_identity(&self) -> SessionIdentity {
        match self.session.policy {
            SessionPolicy::Shared => {
                SessionIdentity::new(&self.session.user_id, &self.session.session_id)
            }
            SessionPolicy::PerRequest => SessionIdentity::ephemeral(&self.session.user_id),
        }
    }
}

// ---- Error Handling ----

/// Boundary wrapper translating [`Error`] into an HTTP response
pub struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::Runner(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing query: {}", msg),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing query: {}", other),
            ),
        };
        if status.is_server_error() {
            error!("{}", detail);
        }
        let body = Json(serde_json::json!({ "detail": detail }));
        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

// ---- Request/Response Types ----

/// Body of a `/predict` request
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Free-form query text; a missing field behaves like an empty one
    #[serde(default)]
    pub query: String,
}

/// Body of a successful `/predict` response
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// Final response text, or the fixed placeholder
    pub response: String,
}

/// Body of the liveness probe response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: &'static str,
    /// Human-readable banner
    pub message: &'static str,
}

// ---- Handlers ----

/// Liveness probe; fixed payload, no side effects
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Agent query gateway is up!",
    })
}

/// Run a query through the agent runtime and return its first final response
async fn predict(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("No query provided".to_string()).into());
    }

    let session = state.session_identity();
    debug!(session_id = %session.session_id, "Running query");

    let events = state.runner.run(&session, query).await?;
    let response = first_final_text(events)
        .await?
        .unwrap_or_else(|| NO_FINAL_RESPONSE.to_string());

    Ok(Json(QueryResponse { response }))
}

// ---- Router ----

/// CORS layer for the configured origin allow-list
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Assemble the gateway router.
///
/// Manual mode wires exactly the gateway's own routes; auto mode additionally
/// merges whatever auxiliary routes the runner exposes.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let aux = match config.http.route_mode {
        RouteMode::Manual => None,
        RouteMode::Auto => state.runner.aux_router(),
    };

    let mut app = Router::new()
        .route("/", get(health))
        .route("/predict", post(predict))
        .with_state(state);

    if let Some(aux) = aux {
        app = app.merge(aux);
    }

    app.layer(cors_layer(&config.http.allowed_origins))
        .layer(CompressionLayer::new())
}
