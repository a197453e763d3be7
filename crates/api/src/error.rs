use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::auth::error::AuthError;
use folio_core::market::error::MarketDataError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(&'static str),
    Unavailable(&'static str),
    Market(MarketDataError),
    Auth(AuthError),
    Internal(anyhow::Error),
}

impl From<MarketDataError> for ApiError {
    fn from(err: MarketDataError) -> Self {
        ApiError::Market(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.to_string()),
            ApiError::Market(err) => {
                let status = match err {
                    MarketDataError::InvalidSymbol(_) => StatusCode::BAD_REQUEST,
                    MarketDataError::NotFound(_) => StatusCode::NOT_FOUND,
                    MarketDataError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    MarketDataError::Network(_) | MarketDataError::Decode(_) => StatusCode::BAD_GATEWAY,
                };
                (status, err.user_message())
            }
            ApiError::Auth(err) => {
                let status = match err {
                    AuthError::UsernameTaken | AuthError::EmailTaken => StatusCode::CONFLICT,
                    AuthError::InvalidUsername
                    | AuthError::InvalidEmail
                    | AuthError::PasswordTooShort { .. } => StatusCode::BAD_REQUEST,
                    AuthError::Hashing(_) | AuthError::Directory(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let msg = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    "Failed to create account".to_string()
                } else {
                    err.to_string()
                };
                (status, msg)
            }
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(err);
                tracing::error!(error = %err, "request failed");
            }
            ApiError::Auth(AuthError::Directory(err)) => {
                sentry_anyhow::capture_anyhow(err);
                tracing::error!(error = %err, "user directory failed");
            }
            ApiError::Market(err) => {
                tracing::warn!(error = %err, %status, "market data request failed");
            }
            _ => {}
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
