use api_shared::dto::ErrorRes;
use api_shared::AuthError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medairon_core::CoreError;

/// Error type returned by every handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(CoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Core(CoreError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Core(CoreError::InvalidInput(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Core(CoreError::Persistence { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorRes { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medairon_core::repositories::{Collection, StoreError};

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (
                ApiError::from(CoreError::NotFound {
                    kind: "patient",
                    id: "x".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(CoreError::Forbidden("no".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(CoreError::InvalidInput("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(CoreError::Persistence {
                    collection: Collection::Vitals,
                    source: StoreError::Unavailable("disk".into()),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(AuthError::MissingToken),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(AuthError::Config("failed to sign token".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }
}
