use crate::error::{AppError, AppResult};
use axum::extract::{FromRequestParts, Path, rejection::PathRejection};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Path parameters deserialized into `T` and validated before the handler runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedPath(value))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ConfigRequest;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn echo(ValidatedPath(request): ValidatedPath<ConfigRequest>) -> String {
        format!(
            "{}|{}|{}",
            request.application,
            request.profile,
            request.label.unwrap_or_default()
        )
    }

    fn router() -> Router {
        Router::new()
            .route("/{application}/{profile}", get(echo))
            .route("/{application}/{profile}/{label}", get(echo))
    }

    async fn call(uri: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn test_valid_path_without_label() {
        let (status, body) = call("/billing/prod").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "billing|prod|");
    }

    #[tokio::test]
    async fn test_valid_path_with_escaped_label() {
        let (status, body) = call("/billing/prod,east/feature(_)x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "billing|prod,east|feature(_)x");
    }

    #[tokio::test]
    async fn test_invalid_application_is_rejected() {
        let (status, body) = call("/bill%20ing/prod").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("VALIDATION_ERROR"));
        assert!(body.contains("application"));
    }

    #[tokio::test]
    async fn test_invalid_label_is_rejected() {
        for uri in ["/billing/prod/-rf", "/billing/prod/v1..v2", "/billing/prod/(x)"] {
            let (status, body) = call(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} accepted", uri);
            assert!(body.contains("label"));
        }
    }
}
