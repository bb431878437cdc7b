use utoipa::OpenApi;

pub const ENVIRONMENT_TAG: &str = "Environment";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "confhub",
        description = "Configuration server resolving application, profile and default layers from a Git source",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::resolver::ConfigBundle,
            crate::resolver::ConfigLayer,
        )
    ),
    tags(
        (name = ENVIRONMENT_TAG, description = "Resolved configuration bundles"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
