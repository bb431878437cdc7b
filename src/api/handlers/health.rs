//! Health check endpoint handlers.
//!
//! Health is derived from the latest fetch outcome of each label and the
//! service-registry state; probes never contact the source themselves.

use std::collections::BTreeMap;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::registry::{Registry, RegistrationState};
use crate::source::{FetchOutcome, SourceHealth};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Component health
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Component health of the source and the registry.
///
/// Degraded (stale snapshots are being served) still answers 200.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = BTreeMap::new();
    checks.insert(
        "source".to_string(),
        source_health(&state.fetcher.health(), &state.fetcher.describe_source()),
    );
    checks.insert("registry".to_string(), registry_health(&state.registry));

    let response = HealthResponse::from_checks(
        state.version.clone(),
        jiff::Timestamp::now().to_string(),
        checks,
    );

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(response))
}

/// Ready unless every tracked label failed with nothing to fall back on.
///
/// One label failing next to servable ones only degrades `/health`.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.fetcher.health().outcome {
        FetchOutcome::Failed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    }
}

#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Process is alive")
    ),
    tag = HEALTH_TAG
)]
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

fn source_health(health: &SourceHealth, source: &str) -> ComponentHealth {
    match health.outcome {
        FetchOutcome::Pending => {
            ComponentHealth::new(HealthStatus::Healthy, format!("No fetch from {} yet", source))
        }
        FetchOutcome::Ok => ComponentHealth::new(
            HealthStatus::Healthy,
            format!("Latest fetch of {} label(s) succeeded", health.ok),
        ),
        FetchOutcome::Stale => {
            let message = match (health.stale.is_empty(), health.failed.is_empty()) {
                (false, true) => format!("Serving last-good snapshot of {}", quoted(&health.stale)),
                (true, _) => format!("Nothing to serve for {}", quoted(&health.failed)),
                (false, false) => format!(
                    "Serving last-good snapshot of {}; nothing to serve for {}",
                    quoted(&health.stale),
                    quoted(&health.failed)
                ),
            };
            ComponentHealth::new(HealthStatus::Degraded, with_error(message, health))
        }
        FetchOutcome::Failed => ComponentHealth::new(
            HealthStatus::Unhealthy,
            with_error(
                format!("Fetch of {} failed with nothing cached", quoted(&health.failed)),
                health,
            ),
        ),
    }
}

fn quoted(labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| format!("'{}'", label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn with_error(message: String, health: &SourceHealth) -> String {
    match &health.last_error {
        Some(error) => format!("{} ({})", message, error),
        None => message,
    }
}

fn registry_health(registry: &Registry) -> ComponentHealth {
    let state = registry.state();
    let status = match state {
        RegistrationState::Failed => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    };
    ComponentHealth::new(status, state.as_str())
}
