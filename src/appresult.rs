use axum::{http::StatusCode, response::{IntoResponse, Response}};

use crate::error::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<Error>() {
            Some(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(Error::Forbidden(_)) => StatusCode::FORBIDDEN,
            Some(Error::ValidationFailed(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(Error::AuthFailed(_)) => StatusCode::UNAUTHORIZED,
            Some(Error::Database(_)) | None => {
                tracing::error!(error = ?self.0, "request failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response();
            }
        };

        (status, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
