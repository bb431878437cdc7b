//! Configuration bundle endpoints.

use crate::api::doc::ENVIRONMENT_TAG;
use crate::api::dto::ErrorResponse;
use crate::error::AppResult;
use crate::resolver::{ConfigBundle, ConfigRequest};
use crate::state::AppState;
use crate::utils::validate::ValidatedPath;
use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates the bundle routes.
pub fn environment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_environment))
        .routes(routes!(get_environment_at_label))
}

/// GET /{application}/{profile} - Bundle at the default label
#[utoipa::path(
    get,
    path = "/{application}/{profile}",
    tag = ENVIRONMENT_TAG,
    params(
        ("application" = String, Path, description = "Application name", example = "billing"),
        ("profile" = String, Path, description = "Profile, or comma-separated profiles", example = "prod"),
    ),
    responses(
        (status = 200, description = "Resolved configuration", body = ConfigBundle),
        (status = 400, description = "Invalid path parameters", body = ErrorResponse),
        (status = 404, description = "No configuration or unknown label", body = ErrorResponse),
        (status = 503, description = "Source unavailable and nothing cached", body = ErrorResponse)
    )
)]
async fn get_environment(
    State(state): State<AppState>,
    ValidatedPath(request): ValidatedPath<ConfigRequest>,
) -> AppResult<Json<ConfigBundle>> {
    let bundle = state.services.environments.find(&request).await?;
    Ok(Json(bundle))
}

/// GET /{application}/{profile}/{label} - Bundle at a branch, tag or commit
#[utoipa::path(
    get,
    path = "/{application}/{profile}/{label}",
    tag = ENVIRONMENT_TAG,
    params(
        ("application" = String, Path, description = "Application name", example = "billing"),
        ("profile" = String, Path, description = "Profile, or comma-separated profiles", example = "prod"),
        ("label" = String, Path, description = "Branch, tag or commit; `(_)` stands for `/`", example = "main"),
    ),
    responses(
        (status = 200, description = "Resolved configuration", body = ConfigBundle),
        (status = 400, description = "Invalid path parameters", body = ErrorResponse),
        (status = 404, description = "No configuration or unknown label", body = ErrorResponse),
        (status = 500, description = "A configuration file could not be parsed", body = ErrorResponse),
        (status = 503, description = "Source unavailable and nothing cached", body = ErrorResponse)
    )
)]
async fn get_environment_at_label(
    State(state): State<AppState>,
    ValidatedPath(request): ValidatedPath<ConfigRequest>,
) -> AppResult<Json<ConfigBundle>> {
    let bundle = state.services.environments.find(&request).await?;
    Ok(Json(bundle))
}
