// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the inquiry gateway.
//!
//! Inquiry endpoints run admission → validation → sanitization →
//! dispatch. A denial short-circuits before the body is even looked at.

use crate::dispatcher::{outcome_of, DispatchOutcome, DispatchResult};
use crate::error::{panic_response, ApiError};
use crate::limiter::{identity_from_forwarded, Admission};
use crate::sanitizer::{SanitizedContact, SanitizedRfp};
use crate::state::AppState;
use crate::validator::{ContactSubmission, RfpSubmission, ValidationResult};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// Rate-limit endpoint name for contact submissions.
pub const CONTACT_ENDPOINT: &str = "contact-notification";
/// Rate-limit endpoint name for RFP submissions.
pub const RFP_ENDPOINT: &str = "rfp-notification";

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Body returned once an inquiry has been dispatched.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub partial: bool,
    pub dispatches: Vec<DispatchResult>,
}

/// Build the router with CORS, panic and trace layers applied.
pub fn router(state: Arc<AppState>) -> Router {
    let metrics_path = state.config.metrics.path.clone();

    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact-notification", post(contact))
        .route("/rfp-notification", post(rfp))
        .route("/generate-sitemap", get(sitemap).post(sitemap))
        .route(&metrics_path, get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(cors))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

/// Answer preflight requests and stamp CORS headers on every response.
pub async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        let mut preflight = (StatusCode::OK, "ok").into_response();
        preflight.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        preflight
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "inquiry-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus exposition endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    if !state.config.metrics.enabled {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    let text = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// Contact form submission.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    let admission = admit(&state, &headers, CONTACT_ENDPOINT).await?;
    let Json(submission) = decode(payload)?;

    if submission.is_bot() {
        warn!(endpoint = CONTACT_ENDPOINT, "Honeypot filled, dropping submission");
        return respond(&state, &admission, Vec::new());
    }

    if let ValidationResult::Invalid(err) = state.validator.validate_contact(&submission) {
        state
            .metrics
            .validation_failure(CONTACT_ENDPOINT, err.field().key());
        info!(endpoint = CONTACT_ENDPOINT, field = err.field().key(), "Submission rejected");
        return Err(err.into());
    }

    let clean = SanitizedContact::from(&submission);
    let results = state.dispatcher.dispatch_contact(&clean).await;
    respond(&state, &admission, results)
}

/// Request-for-proposal submission.
pub async fn rfp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RfpSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    let admission = admit(&state, &headers, RFP_ENDPOINT).await?;
    let Json(submission) = decode(payload)?;

    if submission.is_bot() {
        warn!(endpoint = RFP_ENDPOINT, "Honeypot filled, dropping submission");
        return respond(&state, &admission, Vec::new());
    }

    if let ValidationResult::Invalid(err) = state.validator.validate_rfp(&submission) {
        state.metrics.validation_failure(RFP_ENDPOINT, err.field().key());
        info!(endpoint = RFP_ENDPOINT, field = err.field().key(), "Submission rejected");
        return Err(err.into());
    }

    let clean = SanitizedRfp::from(&submission);
    let results = state.dispatcher.dispatch_rfp(&clean).await;
    respond(&state, &admission, results)
}

/// Authenticated sitemap generation.
pub async fn sitemap(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    if !state.sitemap.authorizes(token) {
        warn!("Sitemap generation refused: bad token");
        return Err(ApiError::Unauthorized);
    }

    match state.sitemap.generate().await {
        Ok(doc) => {
            state.metrics.sitemap_generation("success");
            Ok((
                [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
                doc.xml,
            )
                .into_response())
        }
        Err(err) => {
            state.metrics.sitemap_generation("error");
            Err(ApiError::Internal(err.to_string()))
        }
    }
}

async fn admit(state: &AppState, headers: &HeaderMap, endpoint: &str) -> Result<Admission, ApiError> {
    let identity = identity_from_forwarded(
        headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok()),
    );

    let admission = state.controller.admit(&identity, endpoint).await;
    state.metrics.admission(endpoint, admission.outcome_label());

    match admission {
        Admission::Denied { retry_after } => {
            info!(%identity, %endpoint, retry_after_secs = retry_after.as_secs(), "Request rate limited");
            Err(ApiError::RateLimited {
                retry_after_secs: whole_seconds(retry_after),
            })
        }
        admitted => {
            debug!(%identity, %endpoint, outcome = admitted.outcome_label(), "Request admitted");
            Ok(admitted)
        }
    }
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<Json<T>, ApiError> {
    payload.map_err(|rejection| {
        debug!(error = %rejection, "Unreadable request body");
        ApiError::BadRequest("Invalid request body")
    })
}

fn respond(
    state: &AppState,
    admission: &Admission,
    results: Vec<DispatchResult>,
) -> Result<Response, ApiError> {
    for result in &results {
        state
            .metrics
            .dispatch(&result.audience.to_string(), result.success);
    }

    let outcome = outcome_of(&results);
    if outcome == DispatchOutcome::Failed {
        return Err(ApiError::Internal("every notification send failed".to_string()));
    }

    let mut response = Json(SubmissionResponse {
        success: true,
        partial: outcome == DispatchOutcome::Partial,
        dispatches: results,
    })
    .into_response();

    if let Admission::Allowed { remaining, .. } = admission {
        response.headers_mut().insert(
            "x-ratelimit-remaining",
            HeaderValue::from(*remaining),
        );
    }
    Ok(response)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

/// Round up so clients never retry before the window rolls over.
fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}
