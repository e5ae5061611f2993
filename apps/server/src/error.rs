use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use psyclinic_ai::AiError;
use psyclinic_core::errors::Error as CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    Ai(#[from] AiError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Admin access required")]
    Forbidden,
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_) | CoreError::ConstraintViolation(_) => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                CoreError::InvalidCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                _ => {
                    tracing::error!("Internal error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
            },
            ApiError::Ai(e) => match e {
                AiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AiError::RateLimited(_) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate limit. Wait 10s.".to_string(),
                ),
                AiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, e.to_string()),
                AiError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
                AiError::Provider(_) | AiError::EmptyResponse => {
                    (StatusCode::BAD_GATEWAY, e.to_string())
                }
                AiError::ContextOverflow(_) | AiError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
            },
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Anyhow(e) => {
                tracing::error!("Unhandled error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
