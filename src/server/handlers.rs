//! HTTP request handlers
//!
//! Implementation of HTTP endpoints for the automation service. Mutating
//! automation endpoints optionally require a bearer token; timer-driven
//! automation never calls through here.

use crate::server::app::AppState;
use crate::types::{ErrorResponse, PingResponse, RunStats, StatusResponse};
use crate::utils::version;
use axum::{
    Json as RequestJson,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Json,
};
use serde::{Deserialize, Serialize};

/// Request body for token issuance
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Subject the token is issued for
    #[serde(rename = "subjectId")]
    pub subject_id: String,
    /// Account email
    pub email: String,
    /// Token purpose, defaults to `automation`
    #[serde(default = "default_purpose")]
    pub purpose: String,
}

fn default_purpose() -> String {
    "automation".to_string()
}

/// Response body for token issuance
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed bearer token
    pub token: String,
}

/// Webhook verification query parameters
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    /// Subscription mode
    #[serde(rename = "hub.mode", default)]
    pub mode: String,
    /// Shared verify token
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: String,
    /// Challenge to echo back
    #[serde(rename = "hub.challenge", default)]
    pub challenge: String,
}

/// Check the bearer token on a mutating endpoint
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.tokens.authorize(header) {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!("Rejected automation request: {}", e);
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}

/// Ping endpoint for health checks
///
/// GET /ping
///
/// Returns server status and uptime information.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    let response = PingResponse::new(uptime, version::get_version());

    tracing::debug!(
        "Ping response: uptime={}s, version={}",
        uptime,
        version::get_version()
    );
    Json(response)
}

/// Automation status endpoint
///
/// GET /automation/status
pub async fn automation_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.scheduler.status())
}

/// Enable auto-scheduling
///
/// POST /automation/enable
pub async fn automation_enable(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    authorize(&state, &headers)?;
    state.scheduler.enable();
    Ok(StatusCode::NO_CONTENT)
}

/// Disable auto-scheduling
///
/// POST /automation/disable
pub async fn automation_disable(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    authorize(&state, &headers)?;
    state.scheduler.disable();
    Ok(StatusCode::NO_CONTENT)
}

/// Run one automation pass immediately
///
/// POST /automation/run
///
/// Unlike a timer tick, failures here propagate to the caller.
pub async fn automation_run(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RunStats>, (StatusCode, Json<ErrorResponse>)> {
    authorize(&state, &headers)?;

    match state.scheduler.run_now().await {
        Ok(stats) => {
            tracing::info!(
                "Manual automation run completed: {}/{} successful",
                stats.successful,
                stats.total
            );
            Ok(Json(stats))
        }
        Err(e) => {
            tracing::error!("Manual automation run failed: {}", e);
            let status = match &e {
                crate::Error::Scheduler(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ErrorResponse::new(e.to_string()))))
        }
    }
}

/// Issue an automation bearer token
///
/// POST /auth/token
pub async fn issue_token(
    State(state): State<AppState>,
    RequestJson(request): RequestJson<TokenRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .tokens
        .issue(&request.subject_id, &request.email, &request.purpose)
    {
        Ok(token) => Ok(Json(TokenResponse { token })),
        Err(e) => {
            tracing::error!("Token issuance failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}

/// Webhook verification endpoint
///
/// GET /webhook/messenger
pub async fn webhook_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, StatusCode> {
    state
        .relay
        .verify(&params.verify_token, &params.challenge)
        .ok_or(StatusCode::FORBIDDEN)
}

/// Webhook event intake endpoint
///
/// POST /webhook/messenger
pub async fn webhook_receive(
    State(state): State<AppState>,
    RequestJson(payload): RequestJson<serde_json::Value>,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    match state.relay.relay_events(&payload).await {
        Ok(forwarded) => {
            tracing::info!("Forwarded {} webhook events", forwarded);
            Ok("EVENT_RECEIVED".to_string())
        }
        Err(e) => {
            tracing::warn!("Webhook relay failed: {}", e);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
