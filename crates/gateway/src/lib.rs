//! HTTP gateway for threadrelay.
//!
//! Receives Slack Events API callbacks and hands conversation events to the
//! [`ResponseOrchestrator`]. Slack expects an answer within three seconds, so
//! every event is acknowledged immediately and handled on its own task.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use threadrelay_channels::{SlackEnvelope, parse_inbound};
use threadrelay_config::GatewayConfig;
use threadrelay_core::Error;
use threadrelay_relay::{HandleOutcome, ResponseOrchestrator};

/// Header Slack sets on redelivery of an event it considers unacknowledged.
const RETRY_HEADER: &str = "x-slack-retry-num";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<ResponseOrchestrator>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack/events", post(slack_events_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start(
    config: &GatewayConfig,
    orchestrator: Arc<ResponseOrchestrator>,
) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(Arc::new(GatewayState { orchestrator }));

    info!(addr = %addr, "Gateway listening for Slack events");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ChallengeResponse {
    challenge: String,
}

async fn slack_events_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(envelope): Json<SlackEnvelope>,
) -> Response {
    // The first delivery is already being handled
    if let Some(attempt) = headers.get(RETRY_HEADER).and_then(|v| v.to_str().ok()) {
        debug!(attempt, "Ignoring Slack retry");
        return StatusCode::OK.into_response();
    }

    match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            info!("Answering Slack URL verification");
            Json(ChallengeResponse { challenge }).into_response()
        }
        SlackEnvelope::EventCallback {
            team_id,
            api_app_id,
            event_id,
            event,
        } => {
            let orchestrator = state.orchestrator.clone();
            tokio::spawn(async move {
                let relayed = relay_event(&orchestrator, &event, team_id.as_deref(), api_app_id.as_deref()).await;
                match relayed {
                    Ok(Some(outcome)) => debug!(event_id = ?event_id, ?outcome, "Event handled"),
                    Ok(None) => debug!(event_id = ?event_id, "Event carries no conversation input"),
                    Err(Error::Gate(e)) => warn!(event_id = ?event_id, error = %e, "Dropping malformed event"),
                    Err(Error::Delivery(e)) => error!(event_id = ?event_id, error = %e, "Could not deliver to Slack"),
                }
            });
            StatusCode::OK.into_response()
        }
        SlackEnvelope::Unsupported => {
            debug!("Ignoring unsupported envelope type");
            StatusCode::OK.into_response()
        }
    }
}

/// Parse one event callback and hand the message to the orchestrator.
/// `Ok(None)` when the event carries nothing to relay.
async fn relay_event(
    orchestrator: &ResponseOrchestrator,
    event: &serde_json::Value,
    team_id: Option<&str>,
    app_id: Option<&str>,
) -> Result<Option<HandleOutcome>, Error> {
    let Some(message) = parse_inbound(event, team_id, app_id)? else {
        return Ok(None);
    };
    Ok(Some(orchestrator.handle(message).await?))
}
